use anyhow::Result;
use requestor_gateway::{config::RequestorConfig, run};
use requestor_telemetry::install as init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry("requestor")?;

    let config = RequestorConfig::from_env()?;
    run(config).await
}
