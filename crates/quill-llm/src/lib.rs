//! # quill-llm
//!
//! Model servers and everything around a model call:
//!
//! - **Parameters**: [`args::GenParams`] and [`args::GenArgs`] with a
//!   content-addressed cache key
//! - **Servers**: the [`server::ModelServer`] trait, [`server::MockServer`]
//!   for tests, [`server::ServerManager`] registry
//! - **Generation**: [`generation::Generation`] schedules the render +
//!   cache + trace + live-call pipeline on the worker pool and exposes the
//!   result as lazy text
//! - **Cache**: [`cache::ResponseCache`] with in-memory and sqlite backends
//! - **Trace**: [`trace::TraceStore`] append-only call log with replay
//! - **Tools**: [`tool::Toolkit`] host callables with JSON-schema specs
//!
//! ## Crate Position
//!
//! Depends on `quill-core`, `quill-futures`, and `quill-settings`. The
//! runtime wires these pieces together per session.

#![deny(unsafe_code)]

pub mod args;
pub mod cache;
pub mod errors;
pub mod generation;
pub mod response;
pub mod server;
pub mod tool;
pub mod trace;

pub use args::{GenArgs, GenParams};
pub use cache::{MemoryCache, ResponseCache, SqliteCache};
pub use errors::{LlmError, Result};
pub use generation::{Generation, GenerationHooks};
pub use response::{CompletionChunk, CompletionResponse, Usage};
pub use server::{MockServer, ModelServer, ServerManager};
pub use tool::{Tool, ToolCall, ToolSchema, Toolkit};
pub use trace::{MemoryTrace, TraceEvent, TraceStore};
