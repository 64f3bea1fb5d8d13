//! Message dispatch.
//!
//! The dispatcher trait abstracts the transport so the build notifier can be
//! driven against the real Howtank API or a test double.

pub mod howtank;

use async_trait::async_trait;

pub use howtank::{build_query, HowtankNotifier, QueryMode, HOWTANK_BASE_API_URL};

// =============================================================================
// Dispatch Outcome
// =============================================================================

/// Response of an accepted dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOutcome {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
}

impl DispatchError {
    /// HTTP status, when the server answered
    pub fn http_status(&self) -> Option<u16> {
        match self {
            DispatchError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// =============================================================================
// Notification Result
// =============================================================================

/// Outcome of handling one build event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Sent,
    Failed,
    Skipped,
}

/// Result of a notification attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationResult {
    pub status: DeliveryStatus,
    /// HTTP status code (if the server answered)
    pub http_status: Option<u16>,
    /// Error or skip reason
    pub error_message: Option<String>,
}

impl NotificationResult {
    /// Creates a successful result
    pub fn success(http_status: Option<u16>) -> Self {
        Self {
            status: DeliveryStatus::Sent,
            http_status,
            error_message: None,
        }
    }

    /// Creates a failed result
    pub fn failure(error_message: String, http_status: Option<u16>) -> Self {
        Self {
            status: DeliveryStatus::Failed,
            http_status,
            error_message: Some(error_message),
        }
    }

    /// Creates a result for a build that was not notified
    pub fn skipped(reason: String) -> Self {
        Self {
            status: DeliveryStatus::Skipped,
            http_status: None,
            error_message: Some(reason),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

// =============================================================================
// Message Dispatcher Trait
// =============================================================================

/// Posts a prepared message to a stream
#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    /// Sends `message` to `stream_id`. Succeeds only on HTTP 200.
    async fn dispatch(
        &self,
        stream_id: &str,
        message: &str,
        access_token: &str,
    ) -> Result<HttpOutcome, DispatchError>;
}
