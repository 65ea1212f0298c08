//! Error types for the assistant API client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Request rejected by server: {0}")]
    Rejected(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Whether the server refused the credential
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status: 401, .. })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
