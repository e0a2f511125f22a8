use anyhow::{Error, Result};
use lapin::{
    BasicProperties,
    message::Delivery,
    types::{AMQPValue, ShortString},
};
use tokio::time::{Duration, sleep};
use tracing::{debug, error, info, warn};

use crate::{
    channels::{DeliveryError, EmailChannel, InAppChannel, SmsChannel},
    clients::rbmq::{self, DELIVERY_ATTEMPTS_HEADER, QueueConsumer},
    config::Config,
    models::notification::NotificationRequest,
};

/// Routes consumed notifications to their delivery channel.
pub struct Dispatcher {
    email: EmailChannel,
    sms: SmsChannel,
    in_app: InAppChannel,
}

/// What the worker should do with a delivery once it has been processed.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// Handled; acknowledge the delivery.
    Completed,
    /// Cannot ever succeed; reject without requeueing.
    Rejected(String),
    /// Failed transiently; redeliver unless the attempt cap is reached.
    Retry(NotificationRequest, String),
}

impl Dispatcher {
    pub fn new(email: EmailChannel, sms: SmsChannel, in_app: InAppChannel) -> Self {
        Self { email, sms, in_app }
    }

    pub async fn process(&self, payload: &[u8]) -> Outcome {
        let notification = match serde_json::from_slice::<NotificationRequest>(payload) {
            Ok(notification) => notification,
            Err(e) => return Outcome::Rejected(format!("Malformed payload: {}", e)),
        };

        debug!(kind = %notification.kind, "Processing notification");

        match notification.kind.as_str() {
            "email" => {
                let Some(to) = field(&notification.email) else {
                    return Outcome::Rejected(
                        "Email notification without a recipient address".to_string(),
                    );
                };
                settle(
                    self.email.send(&to, &notification.message).await,
                    notification,
                )
            }
            "sms" => {
                let Some(to) = field(&notification.phone) else {
                    return Outcome::Rejected("SMS notification without a phone number".to_string());
                };
                settle(
                    self.sms.send(&to, &notification.message).await,
                    notification,
                )
            }
            "in_app" => {
                let Some(user_id) = field(&notification.user_id) else {
                    return Outcome::Rejected("In-app notification without a user id".to_string());
                };
                match self.in_app.save(&user_id, &notification.message).await {
                    Ok(saved) => {
                        info!(id = saved.id, user_id = %saved.user_id, "In-app message stored");
                        Outcome::Completed
                    }
                    Err(e) => settle(Err(e), notification),
                }
            }
            other => {
                warn!(kind = other, "Unrecognized notification type, discarding");
                Outcome::Completed
            }
        }
    }
}

fn field(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}

fn settle(result: Result<(), DeliveryError>, notification: NotificationRequest) -> Outcome {
    match result {
        Ok(()) => Outcome::Completed,
        Err(DeliveryError::Retryable(reason)) => Outcome::Retry(notification, reason),
        Err(DeliveryError::Permanent(reason)) => Outcome::Rejected(reason),
    }
}

/// The attempt number carried by a delivery; first deliveries have no
/// header.
pub fn delivery_attempt(properties: &BasicProperties) -> u32 {
    properties
        .headers()
        .as_ref()
        .and_then(|headers| {
            headers
                .inner()
                .get(&ShortString::from(DELIVERY_ATTEMPTS_HEADER))
        })
        .and_then(|value| match value {
            AMQPValue::LongInt(n) => u32::try_from(*n).ok(),
            AMQPValue::LongLongInt(n) => u32::try_from(*n).ok(),
            _ => None,
        })
        .unwrap_or(1)
}

/// Consumes the notification queue until the process is interrupted.
///
/// The initial connect is bounded and fatal on exhaustion; once a
/// connection has succeeded, losing it triggers an unbounded
/// fixed-delay reconnect loop.
pub async fn run(config: Config, dispatcher: Dispatcher) -> Result<(), Error> {
    let mut client = QueueConsumer::connect_with_retry(&config).await?;

    info!("Waiting for messages");

    loop {
        let shutdown = tokio::select! {
            _ = tokio::signal::ctrl_c() => true,
            _ = consume(&mut client, &dispatcher, &config) => false,
        };

        if shutdown {
            info!("Shutdown signal received, closing broker connection");
            client.close().await?;
            return Ok(());
        }

        warn!("Broker connection lost");
        client = reconnect(&config).await;
        info!("Broker connection re-established, resuming consumption");
    }
}

async fn consume(client: &mut QueueConsumer, dispatcher: &Dispatcher, config: &Config) {
    loop {
        let delivery = match client.next_delivery().await {
            Some(Ok(delivery)) => delivery,
            Some(Err(e)) => {
                warn!(error = %e, "Failed to receive delivery");
                return;
            }
            None => return,
        };

        if let Err(e) = handle_delivery(client, dispatcher, config, delivery).await {
            warn!(error = %e, "Failed to settle delivery");
        }
    }
}

async fn handle_delivery(
    client: &QueueConsumer,
    dispatcher: &Dispatcher,
    config: &Config,
    delivery: Delivery,
) -> Result<(), Error> {
    match dispatcher.process(&delivery.data).await {
        Outcome::Completed => client.acknowledge(delivery.delivery_tag).await,
        Outcome::Rejected(reason) => {
            error!(reason = %reason, "Dropping notification permanently");
            client.reject(delivery.delivery_tag, false).await
        }
        Outcome::Retry(notification, reason) => {
            let attempt = delivery_attempt(&delivery.properties);

            if attempt < config.max_delivery_attempts {
                warn!(
                    reason = %reason,
                    attempt,
                    "Delivery failed, scheduling another attempt"
                );
                client.republish(&delivery.data, attempt + 1).await?;
                client.acknowledge(delivery.delivery_tag).await
            } else {
                error!(
                    reason = %reason,
                    attempt,
                    "Delivery attempts exhausted, dead-lettering"
                );
                client
                    .publish_dead_letter(&rbmq::dead_letter(notification, reason))
                    .await?;
                client.acknowledge(delivery.delivery_tag).await
            }
        }
    }
}

async fn reconnect(config: &Config) -> QueueConsumer {
    loop {
        sleep(Duration::from_millis(config.reconnect_delay_ms)).await;

        match QueueConsumer::connect(config).await {
            Ok(client) => return client,
            Err(e) => warn!(error = %e, "Reconnect attempt failed"),
        }
    }
}
