//! Model-call errors.

/// Errors raised by servers and their collaborators.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The server rejected or failed the call.
    #[error("server `{server}` failed: {message}")]
    Server {
        /// Server name.
        server: String,
        /// Failure detail.
        message: String,
    },

    /// No server registered under the requested name.
    #[error("unknown server `{0}`")]
    UnknownServer(String),

    /// No tool registered under the requested name.
    #[error("unknown tool `{0}`")]
    UnknownTool(String),

    /// A tool handler failed.
    #[error("tool `{name}` failed: {message}")]
    Tool {
        /// Tool name.
        name: String,
        /// Failure detail.
        message: String,
    },

    /// Sqlite cache failure.
    #[error("cache error: {0}")]
    Cache(#[from] rusqlite::Error),

    /// Serialization failure while keying or storing a call.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rendering the conversation failed.
    #[error(transparent)]
    Core(#[from] quill_core::CoreError),
}

impl LlmError {
    /// Server failure from any displayable error.
    pub fn server(server: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Server {
            server: server.into(),
            message: err.to_string(),
        }
    }
}

/// Convenience alias for model-call results.
pub type Result<T, E = LlmError> = std::result::Result<T, E>;
