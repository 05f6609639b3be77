//! Error types module
//!
//! All pipeline errors are unified under the [`UploadError`] enum. Each
//! variant carries enough detail for the caller to decide between retry,
//! cancel, or manual publish; nothing is silently swallowed except expected
//! transient poll errors, which the poller logs and retries until its
//! timeout ceiling.

/// Unified error type for the upload pipeline.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("File too large: {file_name} is {size_bytes} bytes, maximum is {max_bytes}")]
    FileTooLarge {
        file_name: String,
        size_bytes: u64,
        max_bytes: u64,
    },

    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    #[error("Processing service rejected the request: {0}")]
    AdapterRejection(String),

    #[error("Post not ready to publish: {0}")]
    NotReady(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid retry target: {0}")]
    InvalidRetryTarget(String),

    #[error("Upload status unknown: no terminal state within {elapsed_secs}s")]
    PollTimeout { elapsed_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for UploadError {
    fn from(err: validator::ValidationErrors) -> Self {
        UploadError::Validation(format!("Validation error: {}", err))
    }
}

impl UploadError {
    /// Shorthand for wrapping a transport failure.
    pub fn transient(err: impl std::fmt::Display) -> Self {
        UploadError::TransientNetwork(err.to_string())
    }

    /// Machine-readable error code (e.g. "POLL_TIMEOUT").
    pub fn error_code(&self) -> &'static str {
        match self {
            UploadError::Validation(_) => "VALIDATION_ERROR",
            UploadError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            UploadError::TransientNetwork(_) => "TRANSIENT_NETWORK_ERROR",
            UploadError::AdapterRejection(_) => "ADAPTER_REJECTION",
            UploadError::NotReady(_) => "NOT_READY",
            UploadError::InvalidState(_) => "INVALID_STATE",
            UploadError::InvalidRetryTarget(_) => "INVALID_RETRY_TARGET",
            UploadError::PollTimeout { .. } => "POLL_TIMEOUT",
            UploadError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether retrying the same operation can succeed.
    ///
    /// Usage errors (validation, invalid state, invalid retry targets) and
    /// outright adapter rejections are not retriable as-is; network faults,
    /// not-ready publishes, and poll timeouts are.
    pub fn is_recoverable(&self) -> bool {
        match self {
            UploadError::Validation(_)
            | UploadError::FileTooLarge { .. }
            | UploadError::AdapterRejection(_)
            | UploadError::InvalidState(_)
            | UploadError::InvalidRetryTarget(_) => false,
            UploadError::TransientNetwork(_)
            | UploadError::NotReady(_)
            | UploadError::PollTimeout { .. }
            | UploadError::Internal(_) => true,
        }
    }
}
