//! Error hierarchy shared by the context and rendering layers.

use quill_futures::FutureError;

/// Errors raised while capturing into or rendering a prompt context.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A scope pop with no matching push.
    #[error("unbalanced scope: pop without a matching push")]
    UnbalancedScope,

    /// A role change requested inside a nested formatting scope.
    #[error("role change to {role} attempted inside a nested scope")]
    NestedRoleChange {
        /// The role that was requested.
        role: String,
    },

    /// A scope directive with conflicting or unsupported fields.
    #[error("invalid scope directive: {0}")]
    InvalidScope(String),

    /// Letter indexing ran past `z`.
    #[error("letter indexing supports at most 26 items")]
    IndexOverflow,

    /// A deferred value failed while being forced during rendering.
    #[error("deferred value failed: {0}")]
    Future(#[from] FutureError),
}

/// Convenience alias used across quill crates.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
