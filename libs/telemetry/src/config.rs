use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "text" | "pretty" | "plain" => LogFormat::Text,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub format: LogFormat,
    pub default_filter: String,
}

impl TelemetryConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            format: LogFormat::Json,
            default_filter: "info".into(),
        }
    }

    pub fn from_env(default_service_name: &str) -> Self {
        Self::from_lookup(default_service_name, |key| env::var(key).ok())
    }

    pub fn from_lookup<F>(default_service_name: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::new(
            lookup("SERVICE_NAME")
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| default_service_name.to_string()),
        );
        if let Some(format) = lookup("LOG_FORMAT") {
            cfg.format = LogFormat::parse(&format);
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_json_logs() {
        let cfg = TelemetryConfig::from_lookup("requestor", lookup(&[]));
        assert_eq!(cfg.service_name, "requestor");
        assert_eq!(cfg.format, LogFormat::Json);
        assert_eq!(cfg.default_filter, "info");
    }

    #[test]
    fn text_aliases_switch_format() {
        for value in ["text", "Pretty", " plain "] {
            let cfg = TelemetryConfig::from_lookup("requestor", lookup(&[("LOG_FORMAT", value)]));
            assert_eq!(cfg.format, LogFormat::Text, "{value}");
        }
        let cfg = TelemetryConfig::from_lookup("requestor", lookup(&[("LOG_FORMAT", "json")]));
        assert_eq!(cfg.format, LogFormat::Json);
    }

    #[test]
    fn service_name_override() {
        let cfg =
            TelemetryConfig::from_lookup("requestor", lookup(&[("SERVICE_NAME", "intake-eu")]));
        assert_eq!(cfg.service_name, "intake-eu");
    }
}
