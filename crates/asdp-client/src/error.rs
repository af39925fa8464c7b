//! Error types for the survey processing client.

use asdp_model::ModelError;
use thiserror::Error;

/// Errors that can occur while talking to the processing backend.
///
/// Every variant carries a message fit for display. The workflow controller
/// surfaces these through the notification channel; callers only see them as
/// return values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClientError {
    /// No response was received.
    #[error("network error: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Message derived from the response body.
        message: String,
    },

    /// A 2xx response carried an error indicator.
    #[error("{message}")]
    Application {
        /// Message derived from the response body.
        message: String,
    },

    /// A 2xx response did not have the expected shape or content type.
    #[error("{message}")]
    UnexpectedContent {
        /// What the client was expecting.
        expected: &'static str,
        /// Message derived from the response body.
        message: String,
    },

    /// The uploaded dataset's summary violates its invariants.
    #[error("invalid dataset summary: {0}")]
    InvalidSummary(#[from] ModelError),

    /// Another upload or processing request is still in flight.
    #[error("another request is already in progress")]
    Busy,

    /// The operation needs an uploaded dataset.
    #[error("no dataset uploaded yet")]
    NoDataset,

    /// The session endpoints report no signed-in user.
    #[error("not signed in")]
    NotAuthenticated,

    /// Local file system error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Failed to encode or decode JSON.
    #[error("JSON error: {0}")]
    Json(String),

    /// Settings could not be read or written.
    #[error("settings error: {0}")]
    Settings(String),
}

impl ClientError {
    /// Returns a user-friendly message suitable for a toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(detail) => detail.clone(),
            Self::Busy => "Another request is already in progress".to_string(),
            Self::NoDataset => "Upload a dataset first".to_string(),
            Self::NotAuthenticated => "Please sign in first".to_string(),
            other => other.to_string(),
        }
    }

    /// HTTP status of the failed response, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend rejected the session.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Returns whether this error is potentially recoverable with a retry.
    ///
    /// The client never retries on its own; this only informs the caller.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Busy => true,
            Self::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
