//! Outcome → HTTP response mapping.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::challenge::CHALLENGE_NAME;
use crate::error::{ContactError, VerificationError};
use crate::notify::NotificationResult;

pub const ALLOW_ORIGIN_HEADER: &str = "Access-Control-Allow-Origin";

pub const INVALID_FORM_MESSAGE: &str =
    "Invalid form. Please fill out your name, email, and message.";
pub const SEND_FAILED_MESSAGE: &str =
    "There was an error sending your message. Please send an email manually.";
pub const SENT_MESSAGE: &str = "Message sent!";

pub fn challenge_required_message() -> String {
    format!("Must use {CHALLENGE_NAME}")
}

pub fn challenge_failed_message() -> String {
    format!("{CHALLENGE_NAME} failed. Are you a human?")
}

/// Terminal response of one invocation.
///
/// Serializes in the proxy-integration shape (`statusCode`, `headers`, `body`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HandlerResponse {
    /// Build a response whose body is `message` encoded as a JSON string.
    pub fn new(status_code: u16, message: &str, origin: &str) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(ALLOW_ORIGIN_HEADER.to_string(), origin.to_string());
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        Self {
            status_code,
            headers,
            body: serde_json::Value::from(message).to_string(),
        }
    }

    pub fn allow_origin(&self) -> Option<&str> {
        self.headers.get(ALLOW_ORIGIN_HEADER).map(String::as_str)
    }

    /// The human-readable message, decoded from the JSON body.
    pub fn message(&self) -> Option<String> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Map a pipeline outcome to its response, logging failure detail that the
/// response body never carries.
pub fn build_response(
    origin: &str,
    outcome: &Result<NotificationResult, ContactError>,
) -> HandlerResponse {
    match outcome {
        Ok(result) => {
            info!(message_id = %result.message_id, "contact_form_sent");
            HandlerResponse::new(200, SENT_MESSAGE, origin)
        }
        Err(ContactError::Normalize(e)) => {
            warn!(error = %e, "contact_form_unreadable");
            HandlerResponse::new(400, INVALID_FORM_MESSAGE, origin)
        }
        Err(ContactError::MissingField(e)) => {
            warn!(missing = ?e.missing, "contact_form_invalid");
            HandlerResponse::new(400, INVALID_FORM_MESSAGE, origin)
        }
        Err(ContactError::Verification(e)) => {
            match e {
                VerificationError::MalformedResponse { raw_response, .. } => {
                    error!(
                        error = %e,
                        raw_response = %raw_response,
                        "challenge_verification_error"
                    );
                }
                _ => error!(error = %e, "challenge_verification_error"),
            }
            HandlerResponse::new(401, &challenge_required_message(), origin)
        }
        Err(ContactError::VerificationFailed(e)) => {
            warn!(raw_response = %e.raw_response, "challenge_failed");
            HandlerResponse::new(401, &challenge_failed_message(), origin)
        }
        Err(ContactError::Notify(e)) => {
            error!(error = %e, "contact_form_send_failed");
            HandlerResponse::new(500, SEND_FAILED_MESSAGE, origin)
        }
    }
}
