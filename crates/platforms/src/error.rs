use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("other: {0}")]
    Other(String),
}

impl ApiError {
    /// Whether the error came from the transport rather than the platform.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::HttpError(e) if e.is_timeout() || e.is_connect() || e.is_request())
    }
}
