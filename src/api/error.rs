use thiserror::Error;

use crate::transform::UnexpectedShape;

/// Errors talking to the reports backend. None of them touch the store.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS, timeout or body read failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected payload shape: {0}")]
    UnexpectedShape(#[from] UnexpectedShape),

    #[error("invalid backend url \"{0}\"")]
    InvalidBaseUrl(String),
}

impl ApiError {
    /// Whether retrying the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => *status >= 500 || *status == 429 || *status == 408,
            Self::Decode(_) | Self::UnexpectedShape(_) | Self::InvalidBaseUrl(_) => false,
        }
    }

    /// Message for the status line, with a hint when retrying makes sense.
    pub fn user_message(&self) -> String {
        if self.is_retryable() {
            format!("{self} (press r to retry)")
        } else {
            self.to_string()
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
