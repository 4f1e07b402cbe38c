//! Error types for LearnGen.
//!
//! Library crates use [`LearnGenError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Message substrings that mark an upstream model failure as quota exhaustion.
///
/// Secondary detection path: used only when the upstream did not answer with
/// a typed signal (HTTP 429).
const RATE_LIMIT_MARKERS: &[&str] = &[
    "rate limit",
    "resource_exhausted",
    "resource exhausted",
    "too many requests",
    "quota",
];

/// Top-level error type for all LearnGen operations.
#[derive(Debug, thiserror::Error)]
pub enum LearnGenError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport or auth failure talking to the generative model.
    #[error("model invocation failed{}: {message}", status_suffix(.status))]
    ModelInvocation {
        status: Option<u16>,
        message: String,
    },

    /// The generative model reported quota exhaustion; callers should back off.
    #[error("generative model rate limit exceeded, please try again later ({message})")]
    RateLimited { message: String },

    /// Failure from a third-party API other than the model (video search).
    #[error("{service} API error{}: {message}", status_suffix(.status))]
    ExternalApi {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// Well-formed data with the wrong shape.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LearnGenError>;

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}

impl LearnGenError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a model invocation error.
    pub fn model(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::ModelInvocation {
            status,
            message: msg.into(),
        }
    }

    /// Create a video-search API error.
    pub fn youtube(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::ExternalApi {
            service: "YouTube",
            status,
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error means the generative model is rate limiting us.
    ///
    /// Checks the typed signal first, then falls back to matching the
    /// upstream message.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::ModelInvocation {
                status: Some(429), ..
            } => true,
            Self::ModelInvocation { message, .. } => {
                let lower = message.to_lowercase();
                RATE_LIMIT_MARKERS.iter().any(|m| lower.contains(m))
            }
            _ => false,
        }
    }

    /// Convert a rate-limit-flavored invocation error into [`LearnGenError::RateLimited`].
    ///
    /// Other errors are returned unchanged.
    pub fn into_rate_limited(self) -> Self {
        if !self.is_rate_limited() {
            return self;
        }
        match self {
            Self::ModelInvocation { message, .. } => Self::RateLimited { message },
            other => other,
        }
    }
}
