//! Request and form data types shared by the pipeline stages.

use std::collections::BTreeMap;

/// A raw inbound request as delivered by the trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    body: Vec<u8>,
    content_type: Option<String>,
    is_encoded: bool,
}

impl InboundRequest {
    /// Create a request from its body, optional content type and base64 flag.
    pub fn new(body: impl Into<Vec<u8>>, content_type: Option<String>, is_encoded: bool) -> Self {
        Self {
            body: body.into(),
            content_type,
            is_encoded,
        }
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn is_encoded(&self) -> bool {
        self.is_encoded
    }
}

/// Flat field name → value mapping produced by the normalizer.
///
/// Each key holds exactly one value. When the source encoding repeats a key,
/// the first value is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedFields {
    fields: BTreeMap<String, String>,
}

impl NormalizedFields {
    /// Build from pairs in encounter order; later duplicates are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields = BTreeMap::new();
        for (key, value) in pairs {
            fields.entry(key.into()).or_insert_with(|| value.into());
        }
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names, for logging without leaking values.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// A submission that passed validation, ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMessage {
    subject: String,
    sender_email: String,
    body: String,
}

impl ValidatedMessage {
    /// Only the validator constructs messages, so all three parts are non-empty.
    pub(crate) fn new(subject: String, sender_email: String, body: String) -> Self {
        Self {
            subject,
            sender_email,
            body,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn sender_email(&self) -> &str {
        &self.sender_email
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}
