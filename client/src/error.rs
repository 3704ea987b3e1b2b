use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Coarse classification for callers that branch on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    Http,
    Validation,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed: DNS, refused connection, reset, etc.
    #[error("Network error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Request failed with status code {status}")]
    Http { status: u16, body: String },

    #[error("Not found: {path}")]
    NotFound { path: String },

    /// A success status with a body that is not the expected JSON.
    #[error("Invalid response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// Rejected locally before any request was made.
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ApiError::Transport(_) => ErrorCategory::Transport,
            ApiError::Http { .. } | ApiError::NotFound { .. } | ApiError::Decode(_) => ErrorCategory::Http,
            ApiError::Validation(_) => ErrorCategory::Validation,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::NotFound { .. } => Some(404),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err)
    }
}

impl From<common::BlankUser> for ApiError {
    fn from(err: common::BlankUser) -> Self {
        ApiError::Validation(err.to_string())
    }
}
