use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use chrono::{SecondsFormat, Utc};
use futures_util::StreamExt;
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties, Consumer,
    message::Delivery,
    options::{
        BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, BasicQosOptions,
        BasicRejectOptions, QueueDeclareOptions,
    },
    types::{AMQPValue, FieldTable},
};
use tracing::{debug, info};

use crate::{
    config::Config,
    models::notification::{DeadLetter, NotificationRequest},
    utils::retry_fixed,
};

/// Header carrying the delivery attempt count across republishes.
pub const DELIVERY_ATTEMPTS_HEADER: &str = "x-delivery-attempts";

fn durable() -> QueueDeclareOptions {
    QueueDeclareOptions {
        durable: true,
        ..Default::default()
    }
}

/// Publishes one notification to the durable queue.
///
/// Opens a fresh connection per call, declares the queue idempotently,
/// publishes with persistent delivery mode, and closes the connection.
pub async fn publish(config: &Config, notification: &NotificationRequest) -> Result<(), Error> {
    let connection = Connection::connect(&config.rabbitmq_url, ConnectionProperties::default())
        .await
        .map_err(|e| anyhow!("Failed to connect to RabbitMQ: {}", e))?;

    let channel = connection
        .create_channel()
        .await
        .map_err(|e| anyhow!("RabbitMQ channel creation failed: {}", e))?;

    channel
        .queue_declare(&config.queue_name, durable(), FieldTable::default())
        .await
        .map_err(|e| anyhow!("Failed to declare queue: {}", e))?;

    let payload = serde_json::to_vec(notification)?;

    channel
        .basic_publish(
            "",
            &config.queue_name,
            BasicPublishOptions::default(),
            &payload,
            BasicProperties::default().with_delivery_mode(2),
        )
        .await
        .map_err(|e| anyhow!("Failed to publish notification: {}", e))?;

    debug!(queue = %config.queue_name, "Notification published");

    connection.close(200, "publish complete").await.ok();

    Ok(())
}

pub struct QueueConsumer {
    connection: Connection,
    channel: Channel,
    consumer: Consumer,
    queue_name: String,
    failed_queue_name: String,
}

impl QueueConsumer {
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        let connection = Connection::connect(&config.rabbitmq_url, ConnectionProperties::default())
            .await
            .map_err(|e| anyhow!("Failed to connect to RabbitMQ: {}", e))?;

        info!("RabbitMQ connection established");

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| anyhow!("RabbitMQ channel creation failed: {}", e))?;

        // Strict one-at-a-time processing per worker instance.
        channel
            .basic_qos(1, BasicQosOptions::default())
            .await
            .map_err(|e| anyhow!("Failed to set up QoS: {}", e))?;

        channel
            .queue_declare(&config.queue_name, durable(), FieldTable::default())
            .await
            .map_err(|e| anyhow!("Failed to declare notification queue: {}", e))?;

        channel
            .queue_declare(&config.failed_queue_name, durable(), FieldTable::default())
            .await
            .map_err(|e| anyhow!("Failed to declare failed queue: {}", e))?;

        let consumer = channel
            .basic_consume(
                &config.queue_name,
                "notification_worker",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| anyhow!("Failed to create consumer: {}", e))?;

        info!(queue = %config.queue_name, "Consumer created for queue");

        Ok(Self {
            connection,
            channel,
            consumer,
            queue_name: config.queue_name.clone(),
            failed_queue_name: config.failed_queue_name.clone(),
        })
    }

    /// Bounded initial connect: a fixed delay between attempts, fatal once
    /// the attempts are exhausted.
    pub async fn connect_with_retry(config: &Config) -> Result<Self, Error> {
        retry_fixed(
            config.connect_retry_attempts,
            Duration::from_millis(config.connect_retry_delay_ms),
            || Self::connect(config),
        )
        .await
    }

    pub async fn next_delivery(&mut self) -> Option<Result<Delivery, lapin::Error>> {
        self.consumer.next().await
    }

    pub async fn acknowledge(&self, delivery_tag: u64) -> Result<(), Error> {
        self.channel
            .basic_ack(delivery_tag, BasicAckOptions::default())
            .await
            .map_err(|e| anyhow!("Failed to acknowledge message: {}", e))?;

        Ok(())
    }

    pub async fn reject(&self, delivery_tag: u64, requeue: bool) -> Result<(), Error> {
        self.channel
            .basic_reject(delivery_tag, BasicRejectOptions { requeue })
            .await
            .map_err(|e| anyhow!("Failed to reject message: {}", e))?;

        Ok(())
    }

    /// Puts a payload back on the notification queue with its attempt count,
    /// so redeliveries stay bounded.
    pub async fn republish(&self, payload: &[u8], attempt: u32) -> Result<(), Error> {
        let mut headers = FieldTable::default();
        headers.insert(
            DELIVERY_ATTEMPTS_HEADER.into(),
            AMQPValue::LongInt(attempt as i32),
        );

        self.channel
            .basic_publish(
                "",
                &self.queue_name,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default()
                    .with_delivery_mode(2)
                    .with_headers(headers),
            )
            .await
            .map_err(|e| anyhow!("Failed to republish message: {}", e))?;

        Ok(())
    }

    pub async fn publish_dead_letter(&self, dead_letter: &DeadLetter) -> Result<(), Error> {
        let payload = serde_json::to_vec(dead_letter)?;

        self.channel
            .basic_publish(
                "",
                &self.failed_queue_name,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_delivery_mode(2),
            )
            .await
            .map_err(|e| anyhow!("Failed to publish message to failed queue: {}", e))?;

        Ok(())
    }

    pub async fn close(&self) -> Result<(), Error> {
        self.connection
            .close(200, "worker shutdown")
            .await
            .map_err(|e| anyhow!("Failed to close RabbitMQ connection: {}", e))?;

        Ok(())
    }
}

/// Builds the failure record for a notification whose delivery attempts are
/// exhausted.
pub fn dead_letter(notification: NotificationRequest, failure_reason: String) -> DeadLetter {
    DeadLetter {
        notification,
        failure_reason,
        failed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }
}
