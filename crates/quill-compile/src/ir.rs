//! The statement IR prompt functions are authored in.

use std::collections::HashMap;
use std::sync::Arc;

use quill_core::compositor::{Compositor, RoleScope};
use quill_core::context::PromptContext;
use quill_core::value::Value;

/// Name-to-value bindings threaded through execution.
pub type Bindings = HashMap<String, Value>;

/// An opaque host callable.
///
/// This is how model calls and arbitrary host logic enter a body: the
/// closure runs synchronously against the context and bindings and
/// typically returns lazy text.
#[derive(Clone)]
pub struct HostFn(pub Arc<dyn Fn(&mut PromptContext, &Bindings) -> Value + Send + Sync>);

impl HostFn {
    /// Wrap a closure.
    pub fn new(f: impl Fn(&mut PromptContext, &Bindings) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invoke the closure.
    #[must_use]
    pub fn call(&self, ctx: &mut PromptContext, bindings: &Bindings) -> Value {
        (self.0)(ctx, bindings)
    }
}

impl std::fmt::Debug for HostFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HostFn")
    }
}

/// One piece of an interpolated literal.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Literal text between interpolations.
    Text(String),
    /// An embedded expression.
    Expr(Expr),
    /// Bind-and-yield: evaluate once, bind the name, yield the value.
    Bind {
        /// Binding name.
        name: String,
        /// Expression evaluated once.
        expr: Expr,
    },
}

/// An expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal value.
    Lit(Value),
    /// A string literal.
    Str(String),
    /// An interpolated literal.
    Interp(Vec<Segment>),
    /// A binding reference.
    Var(String),
    /// A list of expressions.
    List(Vec<Expr>),
    /// Textual concatenation of the operands.
    Concat(Vec<Expr>),
    /// An opaque host callable.
    Host(HostFn),
}

/// The scope directive of a scoped block.
#[derive(Debug, Clone)]
pub enum ScopeSpec {
    /// Role override.
    Role(RoleScope),
    /// Formatting directive.
    Format(Compositor),
}

/// A statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Bare expression; its value is captured into the prompt.
    Expr(Expr),
    /// Binding; the value is named, not captured.
    Bind {
        /// Binding name.
        name: String,
        /// Bound expression.
        expr: Expr,
    },
    /// A block executed under a formatting or role scope.
    Scoped {
        /// The scope to apply.
        scope: ScopeSpec,
        /// The statements inside.
        body: Vec<Stmt>,
    },
    /// Return a value to the caller.
    Return(Expr),
    /// A nested definition. Rejected at compile time.
    Def(FuncDecl),
}

/// A prompt function declaration, before compilation.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    /// Function name.
    pub name: String,
    /// Parameter names, bound from call arguments.
    pub params: Vec<String>,
    /// Body statements in source order.
    pub body: Vec<Stmt>,
    /// Names of wrappers applied outside the prompt wrapper. Must be
    /// empty; anything here ran before compilation could see the body.
    pub outer_wrappers: Vec<String>,
}

impl FuncDecl {
    /// A declaration with no parameters or outer wrappers.
    #[must_use]
    pub fn new(name: impl Into<String>, body: Vec<Stmt>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            body,
            outer_wrappers: Vec::new(),
        }
    }

    /// Set the parameter names.
    #[must_use]
    pub fn with_params(mut self, params: Vec<String>) -> Self {
        self.params = params;
        self
    }
}
