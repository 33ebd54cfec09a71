//! Runtime errors.

use quill_compile::CompileError;
use quill_core::CoreError;
use quill_futures::FutureError;
use quill_llm::LlmError;

/// Errors raised while calling and executing prompt functions.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Definition-time rejection.
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Context or rendering failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A `Var` reference with no binding.
    #[error("no binding named `{name}` in `{function}`")]
    UnknownBinding {
        /// The missing name.
        name: String,
        /// The function being executed.
        function: String,
    },

    /// A value without a textual projection used where text is required.
    #[error("cannot use a {kind} value as text in `{function}`")]
    NotText {
        /// Kind of the offending value.
        kind: &'static str,
        /// The function being executed.
        function: String,
    },

    /// Model-call setup failure.
    #[error(transparent)]
    Llm(#[from] LlmError),

    /// A deferred value failed while being forced.
    #[error(transparent)]
    Future(#[from] FutureError),
}

/// Convenience alias for runtime results.
pub type Result<T, E = RuntimeError> = std::result::Result<T, E>;
