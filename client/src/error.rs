use std::time::Duration;

use thiserror::Error;

use crate::types::ApiErrorResponse;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced by the API client.
///
/// `Clone` so one refresh failure can be handed to every request parked
/// behind it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Connection refused, DNS, TLS, broken body stream
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-2xx response from the API
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("No refresh token available")]
    NoRefreshToken,

    /// The task driving a token refresh was dropped before it settled
    #[error("Token refresh was aborted")]
    RefreshAborted,

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Credential storage error: {0}")]
    Storage(String),

    #[error("Not logged in")]
    NotAuthenticated,

    /// Public bots are shared read-only
    #[error("Bot {0} is public and cannot be modified")]
    PublicBot(String),
}

impl ApiError {
    /// Build a `Status` error from a failed response body, preferring the
    /// API's own `message`, then its `error` code.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ApiErrorResponse>(body)
            .ok()
            .and_then(|e| {
                e.message
                    .filter(|m| !m.is_empty())
                    .or(e.error.filter(|m| !m.is_empty()))
            })
            .unwrap_or_else(|| {
                let text = String::from_utf8_lossy(body);
                let text = text.trim();
                if text.is_empty() {
                    "Request failed".to_string()
                } else {
                    text.chars().take(200).collect()
                }
            });

        ApiError::Status { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}
