use thiserror::Error;

/// Errors raised by the resource binding layer.
///
/// Nothing here is retried or recovered; every variant is handed straight
/// back to the caller, which decides what (if anything) to show.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Unknown api tag or invalid configuration. Raised before any request is issued.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status. Server-side validation failures land here as well.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;
