//! The contact form handler.
//!
//! One request in, one response out:
//!
//! ```text
//! normalize → validate → verify (if configured) → notify → respond
//! ```
//!
//! The first failing stage ends the pipeline. Every path, including every
//! failure, produces a `HandlerResponse` carrying the allowed-origin header.

pub mod response;

use std::sync::Arc;

use tracing::{info, instrument};

use crate::challenge::ChallengeVerifier;
use crate::error::{ContactError, VerificationFailedError};
use crate::form::{normalize, validate, InboundRequest};
use crate::notify::{NotificationResult, Notifier};

pub use response::{build_response, HandlerResponse, ALLOW_ORIGIN_HEADER};

/// Stateless request handler built once per process.
#[derive(Clone)]
pub struct ContactHandler {
    origin: String,
    topic_id: String,
    notifier: Arc<dyn Notifier>,
    verifier: Option<Arc<dyn ChallengeVerifier>>,
}

impl ContactHandler {
    pub fn new(
        origin: impl Into<String>,
        topic_id: impl Into<String>,
        notifier: Arc<dyn Notifier>,
        verifier: Option<Arc<dyn ChallengeVerifier>>,
    ) -> Self {
        Self {
            origin: origin.into(),
            topic_id: topic_id.into(),
            notifier,
            verifier,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn verification_enabled(&self) -> bool {
        self.verifier.is_some()
    }

    /// Close the notifier's connections. Call once, after the last request.
    pub async fn close(&self) {
        self.notifier.close().await;
    }

    /// Handle one submission. Never fails: errors become responses.
    #[instrument(skip_all, fields(content_type = request.content_type().unwrap_or("")))]
    pub async fn handle(&self, request: &InboundRequest) -> HandlerResponse {
        info!(
            body_length = request.body().len(),
            is_encoded = request.is_encoded(),
            verification_enabled = self.verification_enabled(),
            "contact_form_received"
        );

        let outcome = self.process(request).await;
        build_response(&self.origin, &outcome)
    }

    async fn process(&self, request: &InboundRequest) -> Result<NotificationResult, ContactError> {
        let fields = normalize(request.body(), request.content_type(), request.is_encoded())?;
        let message = validate(&fields)?;

        if let Some(verifier) = &self.verifier {
            let outcome = verifier.verify(&fields).await?;
            if !outcome.passed {
                return Err(VerificationFailedError {
                    raw_response: outcome.raw_response,
                }
                .into());
            }
        }

        Ok(self.notifier.notify(&message, &self.topic_id).await?)
    }
}
