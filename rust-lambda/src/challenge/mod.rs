//! Challenge-response (anti-spam) verification.
//!
//! Verification is an optional pipeline stage. It exists only when a secret is
//! configured, and the handler holds it as `Option<Arc<dyn ChallengeVerifier>>`.

pub mod recaptcha;

use async_trait::async_trait;

use crate::error::VerificationError;
use crate::form::NormalizedFields;

pub use recaptcha::{interpret_response, RecaptchaVerifier, RECAPTCHA_VERIFY_URL};

/// Form field carrying the challenge token.
pub const CHALLENGE_FIELD: &str = "g-recaptcha-response";

/// Name of the challenge mechanism, as shown to users.
pub const CHALLENGE_NAME: &str = "ReCaptcha";

/// Result of a verification call that returned a readable answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub passed: bool,
    pub raw_response: String,
}

/// Capability to check a submission's challenge token.
#[async_trait]
pub trait ChallengeVerifier: Send + Sync {
    async fn verify(
        &self,
        fields: &NormalizedFields,
    ) -> Result<VerificationOutcome, VerificationError>;
}

/// Check if challenge verification is enabled for the given secret.
pub fn is_verification_enabled(secret: &Option<String>) -> bool {
    secret
        .as_ref()
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false)
}
