//! Course, quiz, final-test, and answer-grading generation on top of Gemini.
//!
//! This crate provides:
//! - [`client`] - the single-call model client and its raw envelope
//! - [`parser`] - defensive payload extraction (`None` on any mismatch)
//! - [`sanitize`] - whitespace cleanup and keyword synthesis
//! - the four generation operations ([`generate_course`], [`generate_quiz`],
//!   [`generate_final_test`], [`evaluate_short_answer`])
//!
//! Every operation degrades to a fixed fallback value on failure. The one
//! exception is upstream rate limiting, returned as
//! [`LearnGenError::RateLimited`](learngen_shared::LearnGenError::RateLimited)
//! so callers can back off.

pub mod client;
mod course;
mod evaluate;
mod final_test;
pub mod parser;
mod prompts;
mod quiz;
pub mod sanitize;

use serde_json::Value;
use tracing::warn;

use learngen_shared::Result;

pub use client::{GeminiClient, RawEnvelope};
pub use course::generate_course;
pub use evaluate::evaluate_short_answer;
pub use final_test::generate_final_test;
pub use parser::{Payload, parse};
pub use quiz::generate_quiz;
pub use sanitize::{extract_keywords, sanitize};

/// Invoke the model and decode its JSON payload.
///
/// `Ok(None)` means the call failed or the payload was unusable and the
/// caller should fall back. Only rate limiting is returned as `Err`.
pub(crate) async fn request_json(
    client: &GeminiClient,
    prompt: &str,
    operation: &'static str,
) -> Result<Option<Value>> {
    match client.invoke(prompt).await {
        Ok(envelope) => {
            let parsed = parser::parse(&envelope);
            if parsed.is_none() {
                warn!(operation, "model response could not be parsed, using fallback");
            }
            Ok(parsed)
        }
        Err(e) if e.is_rate_limited() => {
            warn!(operation, error = %e, "model rate limited");
            Err(e.into_rate_limited())
        }
        Err(e) => {
            warn!(operation, error = %e, "model invocation failed, using fallback");
            Ok(None)
        }
    }
}

/// Render a loosely-typed JSON scalar as sanitized text.
pub(crate) fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(sanitize(s)),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::{Value, json};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use learngen_shared::GenerationConfig;

    use crate::GeminiClient;

    pub(crate) fn test_client(uri: &str) -> GeminiClient {
        GeminiClient::new(&GenerationConfig {
            api_key: "test-key".into(),
            model: "gemini-test".into(),
            base_url: uri.into(),
            timeout_secs: 5,
        })
        .expect("build client")
    }

    pub(crate) fn envelope_with_text(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    /// Start a mock model that answers every call with `text` as its payload.
    pub(crate) async fn model_replying(text: &str) -> (MockServer, GeminiClient) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope_with_text(text)))
            .mount(&server)
            .await;
        let client = test_client(&server.uri());
        (server, client)
    }

    /// Start a mock model that fails every call with `status` and `body`.
    pub(crate) async fn model_failing(status: u16, body: &str) -> (MockServer, GeminiClient) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        let client = test_client(&server.uri());
        (server, client)
    }
}
