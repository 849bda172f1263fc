use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = portainer_report::Config::from_env().context("configuration")?;
    info!("Connecting to Portainer at {}", config.host);

    let path = portainer_report::run(&config)
        .await
        .with_context(|| format!("exporting {}", config.host))?;

    info!("Data and request errors exported to '{}'", path.display());
    Ok(())
}
