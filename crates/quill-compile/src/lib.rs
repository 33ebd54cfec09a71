//! # quill-compile
//!
//! Statement IR and the definition-time body compiler.
//!
//! Prompt functions are authored as statement lists ([`ir::Stmt`]): bare
//! expressions are captured into the prompt, bindings are not, and scoped
//! blocks apply formatting or role directives. [`compiler::compile`] runs
//! once per definition: it splits interpolated literals so each segment
//! captures before the next embedded expression runs, extracts the
//! docstring, and rejects shapes that cannot execute.
//!
//! ## Crate Position
//!
//! Depends on `quill-core`. The runtime executes the compiled output.

#![deny(unsafe_code)]

pub mod compiler;
pub mod errors;
pub mod ir;

pub use compiler::{compile, CompiledBody};
pub use errors::{CompileError, Result};
pub use ir::{Bindings, Expr, FuncDecl, HostFn, ScopeSpec, Segment, Stmt};
