//! Notification publishing.
//!
//! A `Notifier` delivers a validated contact message to a destination channel
//! and returns the delivery identifier. Two backends exist:
//!
//! ```text
//! sns  → SNS topic (TopicArn = topic id) → email subscription
//! amqp → durable RabbitMQ queue named after the topic id
//! ```
//!
//! Clients are created once per process and injected into the handler.

pub mod amqp;
pub mod sns;

use std::str::FromStr;

use async_trait::async_trait;

use crate::error::NotifyError;
use crate::form::ValidatedMessage;

pub use amqp::{AmqpNotifier, ContactNotification};
pub use sns::SnsNotifier;

/// Delivery receipt of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationResult {
    pub message_id: String,
}

/// Capability to publish a contact message to a destination.
///
/// Implementations make exactly one publish attempt per call.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        message: &ValidatedMessage,
        topic_id: &str,
    ) -> Result<NotificationResult, NotifyError>;

    /// Release long-lived connections on shutdown.
    async fn close(&self) {}
}

/// Which notifier implementation to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotifyBackend {
    #[default]
    Sns,
    Amqp,
}

impl FromStr for NotifyBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sns" => Ok(NotifyBackend::Sns),
            "amqp" | "rabbitmq" => Ok(NotifyBackend::Amqp),
            other => Err(format!("unknown notify backend '{other}' (expected sns or amqp)")),
        }
    }
}
