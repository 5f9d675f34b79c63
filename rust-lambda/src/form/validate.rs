//! Required-field validation and message composition.

use crate::error::MissingFieldError;
use crate::form::types::{NormalizedFields, ValidatedMessage};

/// Fields every submission must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["name", "email", "message"];

/// Check the required fields and compose the notification subject and body.
///
/// Values are embedded verbatim. Empty values count as missing.
pub fn validate(fields: &NormalizedFields) -> Result<ValidatedMessage, MissingFieldError> {
    match (
        present(fields, "name"),
        present(fields, "email"),
        present(fields, "message"),
    ) {
        (Some(name), Some(email), Some(message)) => Ok(ValidatedMessage::new(
            format!("Contact Form - {name}"),
            email.to_string(),
            format!("FROM: {email}\n\n{message}"),
        )),
        _ => Err(MissingFieldError {
            missing: REQUIRED_FIELDS
                .into_iter()
                .filter(|&key| present(fields, key).is_none())
                .collect(),
        }),
    }
}

fn present<'a>(fields: &'a NormalizedFields, key: &str) -> Option<&'a str> {
    fields.get(key).filter(|value| !value.is_empty())
}
