//! SNS notifier.

use async_trait::async_trait;
use aws_sdk_sns::config::retry::RetryConfig;
use aws_sdk_sns::error::DisplayErrorContext;
use tracing::{error, info};

use crate::error::NotifyError;
use crate::form::ValidatedMessage;
use crate::notify::{NotificationResult, Notifier};

/// Publishes contact messages to an SNS topic.
#[derive(Clone)]
pub struct SnsNotifier {
    client: aws_sdk_sns::Client,
}

impl SnsNotifier {
    pub fn new(client: aws_sdk_sns::Client) -> Self {
        Self { client }
    }

    /// Build a client from already-loaded shared AWS configuration.
    ///
    /// SDK retries are disabled: a failed publish surfaces immediately and is
    /// never attempted twice within one invocation.
    pub fn from_conf(config: &aws_config::SdkConfig) -> Self {
        let sns_config = aws_sdk_sns::config::Builder::from(config)
            .retry_config(RetryConfig::disabled())
            .build();
        Self::new(aws_sdk_sns::Client::from_conf(sns_config))
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn notify(
        &self,
        message: &ValidatedMessage,
        topic_id: &str,
    ) -> Result<NotificationResult, NotifyError> {
        let output = self
            .client
            .publish()
            .topic_arn(topic_id)
            .subject(message.subject())
            .message(message.body())
            .send()
            .await
            .map_err(|e| {
                let detail = DisplayErrorContext(&e).to_string();
                error!(topic_arn = %topic_id, error = %detail, "sns_publish_failed");
                NotifyError::Publish(detail)
            })?;

        let message_id = output
            .message_id()
            .map(str::to_string)
            .ok_or(NotifyError::MissingMessageId)?;

        info!(
            topic_arn = %topic_id,
            message_id = %message_id,
            subject = %message.subject(),
            "sns_published"
        );

        Ok(NotificationResult { message_id })
    }
}
