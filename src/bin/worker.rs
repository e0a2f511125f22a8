use anyhow::{Error, Result};
use notification_service::{
    channels::{EmailChannel, InAppChannel, SmsChannel},
    clients::store::MessageStore,
    config::Config,
    worker::{self, Dispatcher},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("notification_service=info")),
        )
        .init();

    let config = Config::load()?;

    let store = MessageStore::connect(&config.database_url).await?;
    let email = EmailChannel::new(&config)?;
    let sms = SmsChannel::new(&config)?;
    let in_app = InAppChannel::new(store);

    let dispatcher = Dispatcher::new(email, sms, in_app);

    worker::run(config, dispatcher).await
}
