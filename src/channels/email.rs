use anyhow::{Error, Result, anyhow};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::Mailbox,
    transport::smtp::authentication::Credentials,
};
use tracing::{debug, info};

use crate::{channels::DeliveryError, config::Config};

const SUBJECT: &str = "Notification";

/// Email delivery over implicit-TLS SMTP.
pub struct EmailChannel {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailChannel {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| anyhow!("Failed to build SMTP transport: {}", e))?
            .credentials(Credentials::new(
                config.smtp_email.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        info!(relay = %config.smtp_host, "Email channel initialized");

        Ok(Self {
            mailer,
            from_address: config.smtp_email.clone(),
        })
    }

    pub async fn send(&self, to: &str, message: &str) -> Result<(), DeliveryError> {
        let from = self.from_address.parse::<Mailbox>().map_err(|_| {
            DeliveryError::Permanent(format!(
                "Invalid sender address '{}'",
                self.from_address
            ))
        })?;

        let to_address = to
            .parse::<Mailbox>()
            .map_err(|_| DeliveryError::Permanent(format!("Invalid recipient address '{}'", to)))?;

        let email = Message::builder()
            .from(from)
            .to(to_address)
            .subject(SUBJECT)
            .body(message.to_string())
            .map_err(|e| DeliveryError::Permanent(format!("Failed to build email: {}", e)))?;

        debug!(to, "Sending email");

        match self.mailer.send(email).await {
            Ok(_) => {
                info!(to, "Email sent");
                Ok(())
            }
            Err(e) if e.is_permanent() => Err(DeliveryError::Permanent(format!(
                "SMTP rejected the message: {}",
                e
            ))),
            Err(e) => Err(DeliveryError::Retryable(format!("SMTP send failed: {}", e))),
        }
    }
}
