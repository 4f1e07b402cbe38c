//! Defensive extraction of the JSON payload from a model envelope.
//!
//! Nothing in here returns an error: an unusable envelope is `None`, and
//! callers substitute their fallback value.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::client::RawEnvelope;

/// First content part of the first candidate, as the model produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Text that still needs JSON decoding.
    Text(String),
    /// A value the upstream already delivered structured.
    Structured(Value),
}

/// Locate the first content part of the first candidate.
pub fn extract_payload(envelope: &RawEnvelope) -> Option<Payload> {
    let part = envelope
        .as_value()
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?;

    match part {
        Value::Null => None,
        Value::String(text) => Some(Payload::Text(text.clone())),
        Value::Object(fields) => match fields.get("text") {
            Some(Value::String(text)) if !text.trim().is_empty() => {
                Some(Payload::Text(text.clone()))
            }
            _ => match fields.get("functionCall").and_then(|call| call.get("args")) {
                Some(args) => Some(Payload::Structured(args.clone())),
                None => Some(Payload::Structured(part.clone())),
            },
        },
        other => Some(Payload::Structured(other.clone())),
    }
}

/// Extract and decode the envelope's payload. `None` means "invalid response".
pub fn parse(envelope: &RawEnvelope) -> Option<Value> {
    let value = match extract_payload(envelope)? {
        Payload::Text(text) => decode_text(&text)?,
        Payload::Structured(value) => value,
    };

    if value.is_null() { None } else { Some(value) }
}

/// Decode a text payload as JSON, unwrapping a Markdown code fence if present.
fn decode_text(text: &str) -> Option<Value> {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").expect("valid regex")
    });

    let trimmed = text.trim();
    let body = match FENCE_RE.captures(trimmed) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => trimmed,
    };

    match serde_json::from_str(body) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, len = body.len(), "payload text is not valid JSON");
            None
        }
    }
}
