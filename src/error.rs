//! Error type shared by every client operation.

use thiserror::Error;

pub type DeskResult<T> = Result<T, DeskError>;

#[derive(Debug, Error)]
pub enum DeskError {
    /// The request never produced a response (connect failure, reset, ...).
    #[error("{0}")]
    Network(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Non-2xx response. `message` is the server's text when it sent one.
    #[error("{}", .message.clone().unwrap_or_else(|| format!("Unexpected response from server (HTTP {status})")))]
    Http { status: u16, message: Option<String> },

    /// 2xx response carrying `success: false`.
    #[error("{}", .message.clone().unwrap_or_else(|| "Request was rejected by the server".to_string()))]
    Rejected {
        message: Option<String>,
        details: Option<String>,
    },

    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Validation(String),

    #[error("Order {0} is not in the current view")]
    NotFound(i64),

    #[error("A request for order {0} is already in flight")]
    InFlight(i64),

    #[error("{0}")]
    Forbidden(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DeskError {
    /// Server-supplied text, when the failure carried one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            DeskError::Http {
                message: Some(m), ..
            }
            | DeskError::Rejected {
                message: Some(m), ..
            } => Some(m.as_str()),
            _ => None,
        }
    }

    pub fn server_details(&self) -> Option<&str> {
        match self {
            DeskError::Rejected {
                details: Some(d), ..
            } => Some(d.as_str()),
            _ => None,
        }
    }

    /// Transport-level failures get the per-action "Network error ..." text
    /// instead of the per-action "Failed to ..." text.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DeskError::Network(_) | DeskError::Timeout(_) | DeskError::InvalidResponse(_)
        )
    }
}

impl From<serde_json::Error> for DeskError {
    fn from(e: serde_json::Error) -> Self {
        DeskError::InvalidResponse(e.to_string())
    }
}
