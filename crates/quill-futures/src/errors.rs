//! Error types for the deferred value engine.
//!
//! Errors are `Clone` because a failed node is memoized: every consumer
//! that forces a node depending on the failure observes the same error.

use std::time::Duration;

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, FutureError>;

/// Errors produced while resolving deferred values.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FutureError {
    /// The underlying scheduled operation returned an error.
    #[error("deferred call '{label}' failed: {message}")]
    CallFailed {
        /// Label of the originating call.
        label: String,
        /// Error description from the operation.
        message: String,
    },

    /// The per-call timeout expired before the operation completed.
    #[error("deferred call '{label}' timed out after {timeout:?}")]
    Timeout {
        /// Label of the originating call.
        label: String,
        /// The configured timeout.
        timeout: Duration,
    },

    /// The worker task panicked or was aborted by the runtime.
    #[error("worker task for '{label}' did not complete: {message}")]
    Worker {
        /// Label of the originating call.
        label: String,
        /// Join error description.
        message: String,
    },
}

impl FutureError {
    /// Build a [`FutureError::CallFailed`] from a label and any error.
    pub fn call_failed(label: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::CallFailed {
            label: label.into(),
            message: err.to_string(),
        }
    }
}
