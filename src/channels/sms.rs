use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use reqwest::Client;
use tracing::{debug, info};

use crate::{channels::DeliveryError, config::Config};

/// SMS delivery through the Twilio REST gateway.
pub struct SmsChannel {
    http_client: Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
    api_base_url: String,
}

impl SmsChannel {
    /// Fails when any of the three gateway credentials is missing, so a
    /// misconfigured worker dies at startup rather than per message.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let account_sid = require(&config.twilio_account_sid, "TWILIO_ACCOUNT_SID")?;
        let auth_token = require(&config.twilio_auth_token, "TWILIO_AUTH_TOKEN")?;
        let from_number = require(&config.twilio_phone_number, "TWILIO_PHONE_NUMBER")?;

        let http_client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|_| anyhow!("Failed to create HTTP client"))?;

        info!(from = %from_number, "SMS channel initialized");

        Ok(Self {
            http_client,
            account_sid,
            auth_token,
            from_number,
            api_base_url: config.twilio_api_url.clone(),
        })
    }

    pub async fn send(&self, to: &str, message: &str) -> Result<(), DeliveryError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base_url, self.account_sid
        );

        debug!(to, "Sending SMS");

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from_number.as_str()), ("Body", message)])
            .send()
            .await
            .map_err(|e| DeliveryError::Retryable(format!("SMS gateway unreachable: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            info!(to, "SMS sent");
            Ok(())
        } else if status.is_server_error() {
            Err(DeliveryError::Retryable(format!(
                "SMS gateway returned {}",
                status
            )))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(DeliveryError::Permanent(format!(
                "SMS gateway rejected the request ({}): {}",
                status, body
            )))
        }
    }
}

fn require(value: &Option<String>, name: &str) -> Result<String, Error> {
    value
        .clone()
        .ok_or_else(|| anyhow!("Missing required Twilio environment variable {}", name))
}
