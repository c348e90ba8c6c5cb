//! Logging setup shared by requestor binaries.
//!
//! Installs a `tracing` subscriber filtered by `RUST_LOG` that writes JSON
//! lines by default, or human-readable text when `LOG_FORMAT` asks for it.

mod config;
mod tracing_init;

pub use config::{LogFormat, TelemetryConfig};
pub use tracing_init::{init_telemetry, telemetry_installed};

use anyhow::Result;

/// Installs the subscriber for `service_name` using environment settings.
pub fn install(service_name: &str) -> Result<()> {
    init_telemetry(TelemetryConfig::from_env(service_name))
}
