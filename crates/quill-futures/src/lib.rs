//! # quill-futures
//!
//! The deferred value engine: lazily-resolved string values that may
//! originate from asynchronous work scheduled on a bounded worker pool.
//!
//! - **[`WorkerPool`]**: semaphore-bounded `tokio::spawn` wrapper. Work
//!   scheduled here runs to completion whether or not anyone consumes the
//!   result; there is no cooperative cancellation.
//! - **[`CallFuture`]**: one scheduled asynchronous operation. Spawned
//!   eagerly, memoized on first force, optional per-call timeout.
//! - **[`StringFuture`]**: a node in a lazy composition DAG. Concatenation,
//!   joining, slicing and formatting build new nodes without forcing any
//!   operand; forcing resolves independent children concurrently and
//!   always assembles results in source order, never arrival order.
//! - **[`CmpFuture`]**: a lazy comparison between two string futures.
//!
//! ## Crate Position
//!
//! Leaf crate. Depended on by quill-core, quill-llm, and quill-runtime.

#![deny(unsafe_code)]

pub mod call;
pub mod errors;
pub mod pool;
pub mod string;

pub use call::{CallFuture, CallState};
pub use errors::{FutureError, Result};
pub use pool::WorkerPool;
pub use string::{CmpFuture, CmpOp, StringFuture};
