//! Process-wide wiring: build the handler and its collaborators once.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::challenge::{ChallengeVerifier, RecaptchaVerifier};
use crate::config::Config;
use crate::handler::ContactHandler;
use crate::notify::{AmqpNotifier, Notifier, NotifyBackend, SnsNotifier};

/// Build the notifier selected by configuration.
pub async fn build_notifier(config: &Config) -> Arc<dyn Notifier> {
    match config.notify_backend {
        NotifyBackend::Sns => {
            let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            info!(region = ?aws_config.region(), "sns_notifier_created");
            Arc::new(SnsNotifier::from_conf(&aws_config))
        }
        NotifyBackend::Amqp => {
            info!(url_length = config.cloudamqp_url.len(), "amqp_notifier_created");
            Arc::new(AmqpNotifier::new(config.cloudamqp_url.clone()))
        }
    }
}

/// Build the challenge verifier, if a secret is configured.
pub fn build_verifier(config: &Config) -> Result<Option<Arc<dyn ChallengeVerifier>>> {
    let Some(secret) = config.recaptcha_secret.as_deref() else {
        info!("challenge_verification_disabled");
        return Ok(None);
    };

    let verifier = RecaptchaVerifier::new(
        secret,
        config.recaptcha_verify_url.as_str(),
        config.request_timeout(),
    )
    .context("Failed to create verification HTTP client")?;

    info!(
        endpoint = %config.recaptcha_verify_url,
        timeout_ms = config.request_timeout_ms,
        "challenge_verification_enabled"
    );

    Ok(Some(Arc::new(verifier)))
}

/// Build the handler from configuration.
pub async fn build_handler(config: &Config) -> Result<ContactHandler> {
    let verifier = build_verifier(config)?;
    let notifier = build_notifier(config).await;

    Ok(ContactHandler::new(
        config.origin_domain.as_str(),
        config.topic_arn.as_str(),
        notifier,
        verifier,
    ))
}
