use shipping_quotes::{
    config::Config,
    server::start_server,
    util::version::{version_label, APP_NAME},
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,shipping_quotes=debug";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    fmt().with_env_filter(filter).init();

    info!("Starting {APP_NAME} {}", version_label());

    let config = Config::load().inspect_err(|err| error!(%err, "invalid configuration"))?;
    start_server(config).await?;
    Ok(())
}
