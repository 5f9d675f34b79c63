//! Error taxonomy for the contact form pipeline.
//!
//! Every stage returns its own error type. `ContactError` collects them so the
//! handler can use `?` and map the first failure to a response.

use thiserror::Error;

/// Failure to turn the raw request body into form fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("body is not valid base64: {0}")]
    InvalidEncoding(String),

    #[error("body is not valid UTF-8")]
    InvalidUtf8,

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// One or more required form fields were absent or empty.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("missing required field(s): {}", .missing.join(", "))]
pub struct MissingFieldError {
    pub missing: Vec<&'static str>,
}

/// The challenge could not be checked: no token, or the verification call
/// itself failed. Callers see both as "must use challenge".
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("challenge token field is missing")]
    MissingToken,

    #[error("verification request failed: {0}")]
    Transport(String),

    #[error("unparseable verification response: {reason}")]
    MalformedResponse { raw_response: String, reason: String },
}

/// The verification service answered, and the answer was "not a human".
#[derive(Debug, Error)]
#[error("challenge rejected by verification service: {raw_response}")]
pub struct VerificationFailedError {
    pub raw_response: String,
}

/// Publishing the notification failed.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("publish failed: {0}")]
    Publish(String),

    #[error("publish succeeded without a message id")]
    MissingMessageId,
}

/// Any failure that ends the pipeline early.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error(transparent)]
    MissingField(#[from] MissingFieldError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    VerificationFailed(#[from] VerificationFailedError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}
