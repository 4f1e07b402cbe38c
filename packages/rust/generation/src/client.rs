//! Gemini `generateContent` client.
//!
//! Wraps exactly one HTTP call per invocation. No parsing beyond reading the
//! body as JSON, no retries.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use learngen_shared::{GenerationConfig, LearnGenError, Result};

/// User-Agent string for model requests.
const USER_AGENT: &str = concat!("LearnGen/", env!("CARGO_PKG_VERSION"));

/// Gemini REST API version segment.
const API_VERSION: &str = "v1beta";

/// Maximum characters of a non-JSON error body kept in error messages.
const MAX_ERROR_BODY: usize = 500;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The raw response body of a model call, before content extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEnvelope(pub Value);

impl RawEnvelope {
    /// Wrap a response body. A body that is not JSON is kept as a string
    /// value so the parser can reject it.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str(body) {
            Ok(value) => Self(value),
            Err(_) => Self(Value::String(body.to_string())),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationSettings,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationSettings {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Client for a single, fixed Gemini model.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    /// Create a client from resolved generation settings.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LearnGenError::config(format!("failed to build HTTP client: {e}")))?;

        let endpoint = format!(
            "{}/{API_VERSION}/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// The model identifier every call is sent to.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `prompt` to the model and return the raw response envelope.
    ///
    /// HTTP 429 surfaces as [`LearnGenError::RateLimited`]; every other
    /// transport or status failure is a [`LearnGenError::ModelInvocation`]
    /// carrying the upstream message.
    #[instrument(skip_all, fields(model = %self.model, prompt_len = prompt.len()))]
    pub async fn invoke(&self, prompt: &str) -> Result<RawEnvelope> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationSettings {
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LearnGenError::model(None, format!("request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            LearnGenError::model(Some(status.as_u16()), format!("failed to read body: {e}"))
        })?;

        if !status.is_success() {
            let message = upstream_error_message(&body);
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(LearnGenError::RateLimited { message });
            }
            return Err(LearnGenError::model(Some(status.as_u16()), message));
        }

        debug!(bytes = body.len(), "model responded");
        Ok(RawEnvelope::from_body(&body))
    }
}

/// Pull `error.status` / `error.message` out of a Google API error body.
fn upstream_error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));

    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str);
    let status = error.and_then(|e| e.get("status")).and_then(Value::as_str);

    match (status, message) {
        (Some(status), Some(message)) => format!("{status}: {message}"),
        (None, Some(message)) => message.to_string(),
        (Some(status), None) => status.to_string(),
        (None, None) if body.trim().is_empty() => "empty error body".to_string(),
        (None, None) => body.chars().take(MAX_ERROR_BODY).collect(),
    }
}
