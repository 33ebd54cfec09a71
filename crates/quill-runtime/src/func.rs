//! Prompt functions.
//!
//! A [`PromptFunc`] pairs a compiled body with a context-propagation
//! method. Calling one establishes a child [`PromptContext`] per the
//! method, executes the body inside it, and returns the body's value.

use quill_compile::{compile, Bindings, CompiledBody, FuncDecl};
use quill_core::{Compositor, MessageRole, PromptContext, Value};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::Result;
use crate::exec::execute;
use crate::registry::ContextRegistry;

/// How a call relates its prompt context to the caller's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextMethod {
    /// Start from an empty context.
    #[default]
    New,
    /// Deep-copy the caller's context; edits stay private.
    Copy,
    /// Share the caller's context; edits land in the caller's log.
    Same,
    /// Continue this function's own persisted context across calls.
    Resume,
}

/// Per-function execution options.
#[derive(Debug, Clone, Default)]
pub struct FuncOptions {
    /// When set, a leading docstring is captured under this role.
    pub docstring_role: Option<MessageRole>,
    /// Formatting scope wrapped around the whole body.
    pub default_compositor: Option<Compositor>,
    /// Return the captured records instead of the body's value.
    pub return_prompt: bool,
}

/// A callable prompt function.
#[derive(Debug)]
pub struct PromptFunc {
    id: Uuid,
    body: CompiledBody,
    method: ContextMethod,
    options: FuncOptions,
}

impl PromptFunc {
    /// Compiles `decl` and binds it to `method`.
    ///
    /// Compilation happens once here, not per call.
    pub fn new(decl: FuncDecl, method: ContextMethod) -> Result<Self> {
        Self::with_options(decl, method, FuncOptions::default())
    }

    /// Like [`PromptFunc::new`] with explicit options.
    pub fn with_options(
        decl: FuncDecl,
        method: ContextMethod,
        options: FuncOptions,
    ) -> Result<Self> {
        let body = compile(&decl)?;
        Ok(Self { id: Uuid::new_v4(), body, method, options })
    }

    /// Stable identity, used as the resume key.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Function name, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.body.name
    }

    /// The propagation method this function was declared with.
    #[must_use]
    pub fn method(&self) -> ContextMethod {
        self.method
    }

    /// Calls the function with `bindings`, deriving the child context
    /// from `caller` per the propagation method.
    ///
    /// Under [`ContextMethod::Same`] the child aliases the caller's
    /// shared log, so captures appear in the caller's conversation as
    /// they happen. Under [`ContextMethod::Resume`] the first call
    /// seeds a persisted context from a snapshot of the caller; later
    /// calls pick up where the previous one stopped.
    pub fn call(
        &self,
        caller: &PromptContext,
        registry: &ContextRegistry,
        bindings: Bindings,
    ) -> Result<Value> {
        let mut ctx = match self.method {
            ContextMethod::New => PromptContext::new(),
            ContextMethod::Copy => caller.snapshot(),
            ContextMethod::Same => caller.inherit(),
            ContextMethod::Resume => registry.resume(self.id, caller),
        };
        self.call_in(&mut ctx, bindings)
    }

    /// Executes the body directly inside `ctx`.
    ///
    /// This is the entry point for a top-level call that owns its
    /// context; [`PromptFunc::call`] derives the context first.
    pub fn call_in(&self, ctx: &mut PromptContext, bindings: Bindings) -> Result<Value> {
        tracing::debug!(function = %self.body.name, method = ?self.method, "calling");
        if let Some(compositor) = &self.options.default_compositor {
            ctx.enter_scope(compositor);
            let value = execute(&self.body, ctx, bindings, &self.options)?;
            ctx.exit_scope(compositor);
            Ok(value)
        } else {
            execute(&self.body, ctx, bindings, &self.options)
        }
    }
}
