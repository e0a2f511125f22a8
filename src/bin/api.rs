use anyhow::{Error, Result};
use notification_service::{api::run_api_server, config::Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("notification_service=info,tower_http=info")),
        )
        .init();

    let config = Config::load()?;

    run_api_server(config).await
}
