use serde::Serialize;
use thiserror::Error;

pub type Result<T, E = NarratorError> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum NarratorError {
    /// Missing or invalid credential/configuration. Fatal, raised before any
    /// network call.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("network error: {0}")]
    Network(String),

    /// The remote service answered with a non-success status.
    #[error("service error {status}: {body}")]
    Service { status: u16, body: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("cancelled before synthesis started")]
    Cancelled,

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("service returned an empty audio body")]
    EmptyAudio,

    #[error("io error: {0}")]
    Io(String),
}

impl NarratorError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Transport failures, throttling and server-side errors may succeed on a
    /// later attempt. Everything else is terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Service { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for NarratorError {
    fn from(source: reqwest::Error) -> Self {
        Self::Network(source.to_string())
    }
}

impl From<std::io::Error> for NarratorError {
    fn from(source: std::io::Error) -> Self {
        Self::Io(source.to_string())
    }
}
