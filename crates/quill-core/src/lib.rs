//! # quill-core
//!
//! Prompt contexts, capture records, roles, and the rendering state machine.
//!
//! This crate provides the shared vocabulary the rest of Quill builds on:
//!
//! - **Roles**: [`role::MessageRole`] with system/user/assistant/tool kinds and optional names
//! - **Values**: [`value::Value`] union of everything a prompt statement can yield
//! - **Records**: [`records::PromptRecords`] append-only capture log with scope markers
//! - **Contexts**: [`context::PromptContext`] with a shared conversation log and local records
//! - **Rendering**: [`printer::render`] turns records into role-tagged messages
//! - **Formatting**: [`compositor::Compositor`] scopes (separators, indentation, indexing, tags)
//! - **Messages**: [`message::Conversation`] with adjacent same-role collapsing
//! - **Errors**: [`errors::CoreError`] hierarchy via `thiserror`
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by the compiler, runtime, and model-call crates.

#![deny(unsafe_code)]

pub mod compositor;
pub mod context;
pub mod errors;
pub mod logging;
pub mod message;
pub mod printer;
pub mod records;
pub mod role;
pub mod value;

pub use compositor::{Compositor, RoleScope};
pub use context::PromptContext;
pub use errors::{CoreError, Result};
pub use message::{Conversation, RenderedMessage};
pub use records::{PromptRecord, PromptRecords};
pub use role::{MessageRole, RoleKind};
pub use value::Value;
