//! # quill-runtime
//!
//! The top of the stack: prompt functions, their execution, and session
//! wiring.
//!
//! - **Functions**: [`func::PromptFunc`] compiles a declaration once and
//!   calls it under a context-propagation method (new, copy, same, resume)
//! - **Execution**: [`exec::execute`] walks the compiled body, capturing
//!   bare expression values into the prompt
//! - **Persistence**: [`registry::ContextRegistry`] keeps resumable
//!   contexts alive across calls
//! - **Sessions**: [`session::Session`] owns the worker pool, server
//!   registry, and cache/trace hooks, sized from settings
//!
//! ## Crate Position
//!
//! Depends on every other `quill-*` crate. Applications depend on this
//! one.

#![deny(unsafe_code)]

pub mod errors;
pub mod exec;
pub mod func;
pub mod registry;
pub mod session;

pub use errors::{Result, RuntimeError};
pub use exec::execute;
pub use func::{ContextMethod, FuncOptions, PromptFunc};
pub use registry::ContextRegistry;
pub use session::Session;
