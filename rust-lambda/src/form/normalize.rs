//! Request body normalization.
//!
//! Turns a raw body into `NormalizedFields` regardless of how it was sent:
//! base64 or plain, URL-encoded form or JSON object.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

use crate::error::NormalizeError;
use crate::form::types::NormalizedFields;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const JSON: &str = "application/json";

/// Body formats the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Form,
    Json,
}

/// Classify a content-type header value.
///
/// A missing or blank header is treated as URL-encoded form data, which is
/// what older form posts sent without a header.
pub fn body_format(content_type: Option<&str>) -> Result<BodyFormat, NormalizeError> {
    let Some(raw) = content_type else {
        return Ok(BodyFormat::Form);
    };

    let essence = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "" | FORM_URLENCODED => Ok(BodyFormat::Form),
        JSON => Ok(BodyFormat::Json),
        other if other.starts_with("application/") && other.ends_with("+json") => {
            Ok(BodyFormat::Json)
        }
        _ => Err(NormalizeError::UnsupportedContentType(raw.to_string())),
    }
}

/// Decode and parse a raw request body into form fields.
pub fn normalize(
    raw_body: &[u8],
    content_type: Option<&str>,
    is_encoded: bool,
) -> Result<NormalizedFields, NormalizeError> {
    let format = body_format(content_type)?;
    let text = decode_body(raw_body, is_encoded)?;

    let fields = match format {
        BodyFormat::Form => parse_form(&text),
        BodyFormat::Json => parse_json(&text)?,
    };

    debug!(
        format = ?format,
        field_count = fields.len(),
        "form_normalized"
    );

    Ok(fields)
}

fn decode_body(raw_body: &[u8], is_encoded: bool) -> Result<String, NormalizeError> {
    let bytes = if is_encoded {
        // Encoders may wrap long payloads across lines
        let compact: Vec<u8> = raw_body
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        STANDARD
            .decode(compact)
            .map_err(|e| NormalizeError::InvalidEncoding(e.to_string()))?
    } else {
        raw_body.to_vec()
    };

    String::from_utf8(bytes).map_err(|_| NormalizeError::InvalidUtf8)
}

/// Parse `key=value&...` pairs. Blank values count as absent, so a later
/// non-blank occurrence of the same key can still win.
fn parse_form(text: &str) -> NormalizedFields {
    NormalizedFields::from_pairs(
        form_urlencoded::parse(text.as_bytes())
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| (key.into_owned(), value.into_owned())),
    )
}

/// Top-level JSON object entries in document order, duplicates included.
struct JsonEntries(Vec<(String, Value)>);

impl<'de> Deserialize<'de> for JsonEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = JsonEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<JsonEntries, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, serde_json::Value>()? {
                    entries.push(entry);
                }
                Ok(JsonEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Parse a flat JSON object. Scalars are kept as strings, arrays collapse to
/// their first scalar, and `null` is dropped. A repeated key keeps its first
/// non-null value, as with form bodies.
fn parse_json(text: &str) -> Result<NormalizedFields, NormalizeError> {
    let JsonEntries(entries) = serde_json::from_str(text).map_err(|e| {
        NormalizeError::MalformedPayload(format!("invalid JSON object: {e}"))
    })?;

    let mut pairs = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let scalar = match value {
            Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
            other => other,
        };

        match scalar {
            Value::Null => {}
            Value::String(s) => pairs.push((key, s)),
            Value::Bool(b) => pairs.push((key, b.to_string())),
            Value::Number(n) => pairs.push((key, n.to_string())),
            Value::Array(_) | Value::Object(_) => {
                return Err(NormalizeError::MalformedPayload(format!(
                    "field `{key}` is not a flat value"
                )));
            }
        }
    }

    Ok(NormalizedFields::from_pairs(pairs))
}
