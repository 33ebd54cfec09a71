//! Definition-time errors.

/// Errors raised while compiling a prompt function body.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A prompt function defined inside another prompt function.
    #[error("nested prompt function definition `{name}` inside `{outer}`")]
    NestedDefinition {
        /// The inner definition's name.
        name: String,
        /// The enclosing function's name.
        outer: String,
    },

    /// A wrapper applied outside the prompt wrapper.
    #[error("`{name}` has wrappers applied outside the prompt wrapper: {wrappers:?}")]
    MisorderedWrapper {
        /// The function being compiled.
        name: String,
        /// Wrappers that must move inside.
        wrappers: Vec<String>,
    },
}

/// Convenience alias for compile results.
pub type Result<T, E = CompileError> = std::result::Result<T, E>;
