//! Error types for relay operations

use thiserror::Error;

/// Errors that can occur in the relay pipeline.
///
/// Delivery failures (timeouts, 4xx/5xx responses) are not errors: they are
/// recorded in a [`crate::SubscriptionDeliveryResult`]. Only bad input,
/// cancellation and collaborator failures surface here.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Missing or malformed caller input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation was cancelled before it finished
    #[error("Operation cancelled")]
    Cancelled,

    /// The subscription registry failed
    #[error("Subscription registry error: {0}")]
    Registry(String),

    /// The cache backend failed
    #[error("Cache error: {0}")]
    Cache(#[from] hookrelay_cache::CacheError),

    /// Payload serialization/deserialization failed
    #[error("Payload error: {0}")]
    Payload(String),

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// Signature header missing from an incoming request
    #[error("Signature missing from request")]
    SignatureMissing,

    /// Incoming signature did not match
    #[error("Signature verification failed: {0}")]
    SignatureInvalid(String),

    /// A subscription for the same owner and event already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Subscription not found
    #[error("Subscription not found: {0}")]
    NotFound(String),

    /// The event source failed
    #[error("Event queue error: {0}")]
    Queue(String),
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Payload(err.to_string())
    }
}

impl RelayError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        RelayError::InvalidArgument(message.into())
    }

    /// Report a failure raised by a registry implementation as `Registry`.
    pub(crate) fn into_registry(self) -> Self {
        match self {
            RelayError::Registry(_) | RelayError::Cancelled => self,
            other => RelayError::Registry(other.to_string()),
        }
    }
}
