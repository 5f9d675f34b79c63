//! RabbitMQ notifier.
//!
//! Publishes contact messages as persistent JSON documents to a durable queue
//! named after the topic id. The connection is opened lazily, shared across
//! invocations, and re-opened when the broker drops it.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use async_trait::async_trait;
use lapin::{
    options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions},
    publisher_confirm::Confirmation,
    types::FieldTable,
    BasicProperties, Channel, Connection, ConnectionProperties,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::error::NotifyError;
use crate::form::ValidatedMessage;
use crate::notify::{NotificationResult, Notifier};

/// Message document written to the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactNotification {
    pub subject: String,
    pub sender_email: String,
    pub body: String,
}

impl From<&ValidatedMessage> for ContactNotification {
    fn from(message: &ValidatedMessage) -> Self {
        Self {
            subject: message.subject().to_string(),
            sender_email: message.sender_email().to_string(),
            body: message.body().to_string(),
        }
    }
}

/// AMQP notifier with connection management.
#[derive(Clone)]
pub struct AmqpNotifier {
    inner: Arc<AmqpNotifierInner>,
}

struct AmqpNotifierInner {
    url: String,
    connection: RwLock<Option<Connection>>,
    channel: RwLock<Option<Channel>>,
}

impl AmqpNotifier {
    /// Create a notifier for the given broker URL. No connection is made yet.
    pub fn new(url: String) -> Self {
        Self {
            inner: Arc::new(AmqpNotifierInner {
                url,
                connection: RwLock::new(None),
                channel: RwLock::new(None),
            }),
        }
    }

    /// Ensure we have a valid connection and a confirm-mode channel.
    async fn ensure_connected(&self) -> Result<Channel> {
        {
            let channel = self.inner.channel.read().await;
            if let Some(ch) = channel.as_ref() {
                if ch.status().connected() {
                    return Ok(ch.clone());
                }
            }
        }

        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        // Another task may have reconnected while we waited for the lock
        if let Some(ch) = channel.as_ref() {
            if ch.status().connected() {
                return Ok(ch.clone());
            }
        }

        info!("amqp_notifier_connecting");

        let conn = Connection::connect(&self.inner.url, ConnectionProperties::default())
            .await
            .context("Failed to connect to RabbitMQ")?;

        let ch = conn
            .create_channel()
            .await
            .context("Failed to create channel")?;

        ch.confirm_select(ConfirmSelectOptions::default())
            .await
            .context("Failed to enable publisher confirms")?;

        info!("amqp_notifier_connected");

        *connection = Some(conn);
        *channel = Some(ch.clone());

        Ok(ch)
    }

    async fn publish(&self, message: &ValidatedMessage, queue: &str) -> Result<String> {
        let channel = self.ensure_connected().await?;

        // Idempotent; the queue is named after the topic id
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await
            .with_context(|| format!("Failed to declare queue {queue}"))?;

        let body = serde_json::to_vec(&ContactNotification::from(message))
            .context("Failed to serialize notification")?;
        let message_id = delivery_id(queue, message, published_at_nanos());

        let confirmation = channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_delivery_mode(2) // Persistent
                    .with_content_type("application/json".into())
                    .with_message_id(message_id.clone().into()),
            )
            .await
            .context("Failed to publish notification")?
            .await
            .context("Failed to confirm publish")?;

        check_confirmation(&confirmation, queue)?;

        info!(
            queue = %queue,
            message_id = %message_id,
            body_length = body.len(),
            "amqp_notification_published"
        );

        Ok(message_id)
    }

    /// Close the channel and connection gracefully.
    pub async fn close(&self) {
        let mut connection = self.inner.connection.write().await;
        let mut channel = self.inner.channel.write().await;

        if let Some(ch) = channel.take() {
            if let Err(e) = ch.close(200, "Normal shutdown").await {
                warn!(error = %e, "amqp_channel_close_error");
            }
        }

        if let Some(conn) = connection.take() {
            if let Err(e) = conn.close(200, "Normal shutdown").await {
                warn!(error = %e, "amqp_connection_close_error");
            }
        }

        info!("amqp_notifier_closed");
    }
}

#[async_trait]
impl Notifier for AmqpNotifier {
    async fn notify(
        &self,
        message: &ValidatedMessage,
        topic_id: &str,
    ) -> Result<NotificationResult, NotifyError> {
        match self.publish(message, topic_id).await {
            Ok(message_id) => Ok(NotificationResult { message_id }),
            Err(e) => {
                error!(queue = %topic_id, error = %format!("{e:#}"), "amqp_publish_failed");
                Err(NotifyError::Publish(format!("{e:#}")))
            }
        }
    }

    async fn close(&self) {
        AmqpNotifier::close(self).await;
    }
}

/// The channel runs in confirm mode, so only a broker ack counts as delivered.
fn check_confirmation(confirmation: &Confirmation, queue: &str) -> Result<()> {
    match confirmation {
        Confirmation::Ack(_) => Ok(()),
        Confirmation::Nack(_) => anyhow::bail!("Broker rejected notification for queue {queue}"),
        Confirmation::NotRequested => {
            anyhow::bail!("Publisher confirms not enabled on channel for queue {queue}")
        }
    }
}

/// Delivery identifier: SHA-256 over queue, subject, body and publish time.
fn delivery_id(queue: &str, message: &ValidatedMessage, published_at_nanos: u128) -> String {
    let mut hasher = Sha256::new();
    hasher.update(queue.as_bytes());
    hasher.update(b"\n");
    hasher.update(message.subject().as_bytes());
    hasher.update(b"\n");
    hasher.update(message.body().as_bytes());
    hasher.update(published_at_nanos.to_be_bytes());
    hex::encode(hasher.finalize())
}

fn published_at_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}
