use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_rabbitmq_url")]
    pub rabbitmq_url: String,

    #[serde(default = "default_queue_name")]
    pub queue_name: String,

    #[serde(default = "default_failed_queue_name")]
    pub failed_queue_name: String,

    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default)]
    pub smtp_email: String,

    #[serde(default)]
    pub smtp_password: String,

    // Optional here so the API process can start without SMS credentials;
    // the worker's SMS channel refuses to start when any is missing.
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<String>,
    pub twilio_phone_number: Option<String>,

    #[serde(default = "default_twilio_api_url")]
    pub twilio_api_url: String,

    #[serde(default = "default_max_delivery_attempts")]
    pub max_delivery_attempts: u32,

    #[serde(default = "default_connect_retry_attempts")]
    pub connect_retry_attempts: u32,

    #[serde(default = "default_connect_retry_delay_ms")]
    pub connect_retry_delay_ms: u64,

    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,

    #[serde(default = "default_server_port")]
    pub server_port: u16,
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|e| anyhow!("Invalid environmental variable: {}", e))?;
        Ok(config)
    }
}

fn default_rabbitmq_url() -> String {
    "amqp://127.0.0.1:5672/%2f".to_string()
}

fn default_queue_name() -> String {
    "notifications".to_string()
}

fn default_failed_queue_name() -> String {
    "notifications_failed".to_string()
}

fn default_database_url() -> String {
    "sqlite://notifications.db".to_string()
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_twilio_api_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_max_delivery_attempts() -> u32 {
    3
}

fn default_connect_retry_attempts() -> u32 {
    5
}

fn default_connect_retry_delay_ms() -> u64 {
    2000
}

fn default_reconnect_delay_ms() -> u64 {
    5000
}

fn default_server_port() -> u16 {
    8000
}
