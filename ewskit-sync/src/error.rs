//! Error types for the sync layer.

use ewskit_model::ModelError;
use thiserror::Error;

/// Result type for sync operations.
pub type EwsResult<T> = Result<T, EwsError>;

/// Errors that can occur while talking to the remote store.
#[derive(Debug, Error)]
pub enum EwsError {
    /// A response value could not be coerced to its declared type.
    #[error("malformed value for {attribute}: {reason}")]
    MalformedValue { attribute: String, reason: String },

    /// Any other document or entity error.
    #[error("model error: {0}")]
    Model(ModelError),

    /// The write carried no change key, or one the server no longer knows.
    #[error("stale change key")]
    StaleToken,

    /// Another writer changed the entity between refresh and write.
    #[error("irresolvable conflict")]
    IrresolvableConflict,

    /// The entity does not exist (or is not visible) remotely.
    #[error("item not found")]
    NotFound,

    /// The server reported a transient internal failure.
    #[error("transient server error")]
    TransientServerError,

    /// Any unrecognized or unrecoverable status.
    #[error("server error: {message}")]
    Fatal {
        code: Option<String>,
        message: String,
    },

    /// The operation is not valid for the entity's local state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Timeout.
    #[error("operation timed out")]
    Timeout,

    /// Invalid client configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<ModelError> for EwsError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::MalformedValue { attribute, reason } => {
                Self::MalformedValue { attribute, reason }
            }
            other => Self::Model(other),
        }
    }
}

/// What a caller should do about a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    /// Retry the same request after a delay.
    RetryWithBackoff,
    /// Refresh the change key, then retry the write.
    RefreshAndRetry,
    /// Reload the entity and reapply local edits before writing again.
    ReloadAndReapply,
    /// Not automatically recoverable.
    CallerMustDecide,
}

impl EwsError {
    pub fn recovery(&self) -> Recovery {
        match self {
            Self::TransientServerError => Recovery::RetryWithBackoff,
            Self::StaleToken => Recovery::RefreshAndRetry,
            Self::IrresolvableConflict => Recovery::ReloadAndReapply,
            _ => Recovery::CallerMustDecide,
        }
    }

    /// Only transient server errors are retried by the client.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientServerError)
    }
}
