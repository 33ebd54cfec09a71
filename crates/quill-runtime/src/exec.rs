//! The statement executor.
//!
//! Walks a compiled body against a [`PromptContext`]: bare expression
//! values are captured into the prompt, bindings are named without
//! capturing, and scoped blocks bracket their body with the matching
//! scope push and pop. Execution itself never awaits; every deferred
//! value flows through as a [`StringFuture`](quill_futures::StringFuture)
//! and is forced only at render time.

use quill_compile::{Bindings, CompiledBody, Expr, ScopeSpec, Segment, Stmt};
use quill_core::{PromptContext, RoleScope, Value};
use quill_futures::StringFuture;

use crate::errors::{Result, RuntimeError};
use crate::func::FuncOptions;

/// Execute `body` inside `ctx`.
///
/// Returns the value of the first `Return` statement, the captured
/// records when `options.return_prompt` is set, or `Value::Null`.
pub fn execute(
    body: &CompiledBody,
    ctx: &mut PromptContext,
    mut bindings: Bindings,
    options: &FuncOptions,
) -> Result<Value> {
    for param in &body.params {
        if !bindings.contains_key(param) {
            return Err(RuntimeError::UnknownBinding {
                name: param.clone(),
                function: body.name.clone(),
            });
        }
    }

    if let (Some(role), Some(doc)) = (&options.docstring_role, &body.docstring) {
        let scope = RoleScope::new(role.clone());
        ctx.enter_role(&scope);
        ctx.append_text(doc.as_str());
        ctx.exit_role(&scope);
    }

    let returned = run_block(&body.name, &body.stmts, ctx, &mut bindings)?;

    if options.return_prompt {
        return Ok(Value::Records(ctx.local_records().clone()));
    }
    Ok(returned.unwrap_or(Value::Null))
}

/// Runs statements in order. `Some` means an early return that must
/// unwind through enclosing scopes.
fn run_block(
    function: &str,
    stmts: &[Stmt],
    ctx: &mut PromptContext,
    bindings: &mut Bindings,
) -> Result<Option<Value>> {
    for stmt in stmts {
        match stmt {
            Stmt::Expr(expr) => {
                let value = eval(function, expr, ctx, bindings)?;
                ctx.append_value(value);
            }
            Stmt::Bind { name, expr } => {
                let value = eval(function, expr, ctx, bindings)?;
                bindings.insert(name.clone(), value);
            }
            Stmt::Scoped { scope, body } => {
                let returned = match scope {
                    ScopeSpec::Role(role) => {
                        ctx.enter_role(role);
                        let returned = run_block(function, body, ctx, bindings);
                        ctx.exit_role(role);
                        returned?
                    }
                    ScopeSpec::Format(compositor) => {
                        ctx.enter_scope(compositor);
                        let returned = run_block(function, body, ctx, bindings);
                        ctx.exit_scope(compositor);
                        returned?
                    }
                };
                if returned.is_some() {
                    return Ok(returned);
                }
            }
            Stmt::Return(expr) => {
                let value = eval(function, expr, ctx, bindings)?;
                return Ok(Some(value));
            }
            // Compilation rejects nested definitions; nothing reaches here.
            Stmt::Def(decl) => {
                return Err(quill_compile::CompileError::NestedDefinition {
                    name: decl.name.clone(),
                    outer: function.to_string(),
                }
                .into());
            }
        }
    }
    Ok(None)
}

fn eval(
    function: &str,
    expr: &Expr,
    ctx: &mut PromptContext,
    bindings: &mut Bindings,
) -> Result<Value> {
    match expr {
        Expr::Lit(value) => Ok(value.clone()),
        Expr::Str(s) => Ok(Value::Text(StringFuture::literal(s.as_str()))),
        Expr::Interp(segments) => {
            let mut parts = Vec::with_capacity(segments.len());
            for segment in segments {
                match segment {
                    Segment::Text(text) => parts.push(StringFuture::literal(text.as_str())),
                    Segment::Expr(expr) => {
                        let value = eval(function, expr, ctx, bindings)?;
                        parts.push(as_text(function, &value)?);
                    }
                    Segment::Bind { name, expr } => {
                        let value = eval(function, expr, ctx, bindings)?;
                        parts.push(as_text(function, &value)?);
                        bindings.insert(name.clone(), value);
                    }
                }
            }
            Ok(Value::Text(StringFuture::concat(parts)))
        }
        Expr::Var(name) => {
            bindings
                .get(name)
                .cloned()
                .ok_or_else(|| RuntimeError::UnknownBinding {
                    name: name.clone(),
                    function: function.to_string(),
                })
        }
        Expr::List(exprs) => {
            let mut items = Vec::with_capacity(exprs.len());
            for expr in exprs {
                items.push(eval(function, expr, ctx, bindings)?);
            }
            Ok(Value::List(items))
        }
        Expr::Concat(exprs) => {
            let mut parts = Vec::with_capacity(exprs.len());
            for expr in exprs {
                let value = eval(function, expr, ctx, bindings)?;
                parts.push(as_text(function, &value)?);
            }
            Ok(Value::Text(StringFuture::concat(parts)))
        }
        Expr::Host(f) => Ok(f.call(ctx, bindings)),
    }
}

fn as_text(function: &str, value: &Value) -> Result<StringFuture> {
    value.as_text().ok_or_else(|| RuntimeError::NotText {
        kind: value.kind(),
        function: function.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use quill_compile::{compile, FuncDecl, HostFn};
    use quill_core::{Compositor, MessageRole};

    fn run(decl: FuncDecl, bindings: Bindings, options: FuncOptions) -> (Value, PromptContext) {
        let body = compile(&decl).unwrap();
        let mut ctx = PromptContext::new();
        let value = execute(&body, &mut ctx, bindings, &options).unwrap();
        (value, ctx)
    }

    async fn rendered(ctx: &PromptContext) -> String {
        let convo = ctx.full_conversation().unwrap();
        let msgs = convo.resolve(MessageRole::user()).await.unwrap();
        msgs.into_iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn bare_expressions_are_captured() {
        let decl = FuncDecl::new(
            "f",
            vec![
                Stmt::Expr(Expr::Str("first".to_string())),
                Stmt::Expr(Expr::Str("second".to_string())),
            ],
        );
        let (value, ctx) = run(decl, Bindings::new(), FuncOptions::default());
        assert_matches!(value, Value::Null);
        assert_eq!(rendered(&ctx).await, "user: first\nsecond");
    }

    #[tokio::test]
    async fn bindings_are_named_not_captured() {
        let decl = FuncDecl::new(
            "f",
            vec![
                Stmt::Bind {
                    name: "x".to_string(),
                    expr: Expr::Str("hidden".to_string()),
                },
                Stmt::Expr(Expr::Var("x".to_string())),
            ],
        );
        let (_, ctx) = run(decl, Bindings::new(), FuncOptions::default());
        // Only the later capture of `x` shows up, once.
        assert_eq!(rendered(&ctx).await, "user: hidden");
    }

    #[tokio::test]
    async fn interpolation_captures_segment_by_segment() {
        let decl = FuncDecl::new(
            "qa",
            vec![Stmt::Expr(Expr::Interp(vec![
                Segment::Text("Q: ".to_string()),
                Segment::Expr(Expr::Var("question".to_string())),
                Segment::Text("\nA: ".to_string()),
            ]))],
        );
        let mut bindings = Bindings::new();
        bindings.insert("question".to_string(), Value::from("why?"));
        let (_, ctx) = run(
            decl.with_params(vec!["question".to_string()]),
            bindings,
            FuncOptions::default(),
        );
        assert_eq!(rendered(&ctx).await, "user: Q: why?\nA: ");
    }

    #[tokio::test]
    async fn role_scope_retags_the_block() {
        let decl = FuncDecl::new(
            "f",
            vec![
                Stmt::Scoped {
                    scope: ScopeSpec::Role(RoleScope::system()),
                    body: vec![Stmt::Expr(Expr::Str("be brief".to_string()))],
                },
                Stmt::Expr(Expr::Str("hello".to_string())),
            ],
        );
        let (_, ctx) = run(decl, Bindings::new(), FuncOptions::default());
        assert_eq!(rendered(&ctx).await, "system: be brief\nuser: hello");
    }

    #[tokio::test]
    async fn format_scope_applies_to_the_block() {
        let decl = FuncDecl::new(
            "f",
            vec![Stmt::Scoped {
                scope: ScopeSpec::Format(Compositor::numbered_list()),
                body: vec![
                    Stmt::Expr(Expr::Str("alpha".to_string())),
                    Stmt::Expr(Expr::Str("beta".to_string())),
                ],
            }],
        );
        let (_, ctx) = run(decl, Bindings::new(), FuncOptions::default());
        assert_eq!(rendered(&ctx).await, "user: 1. alpha\n2. beta");
    }

    #[test]
    fn return_unwinds_nested_scopes() {
        let decl = FuncDecl::new(
            "f",
            vec![
                Stmt::Scoped {
                    scope: ScopeSpec::Format(Compositor::line_separated()),
                    body: vec![Stmt::Return(Expr::Str("early".to_string()))],
                },
                Stmt::Expr(Expr::Str("unreached".to_string())),
            ],
        );
        let (value, ctx) = run(decl, Bindings::new(), FuncOptions::default());
        assert_matches!(value, Value::Text(s) if s.ready() == Some("early"));
        // The scope still closed; only the push and pop remain.
        assert_eq!(ctx.local_records().len(), 2);
    }

    #[tokio::test]
    async fn return_prompt_yields_the_captured_records() {
        let decl = FuncDecl::new(
            "sub",
            vec![Stmt::Expr(Expr::Str("reusable".to_string()))],
        );
        let options = FuncOptions {
            return_prompt: true,
            ..FuncOptions::default()
        };
        let (value, _) = run(decl, Bindings::new(), options);
        let Value::Records(records) = value else {
            panic!("expected records");
        };
        let mut outer = PromptContext::new();
        outer.append_text("before");
        outer.merge(&records, None);
        assert_eq!(rendered(&outer).await, "user: before\nreusable");
    }

    #[tokio::test]
    async fn docstring_is_captured_only_when_requested() {
        let decl = FuncDecl::new(
            "documented",
            vec![
                Stmt::Expr(Expr::Str("Guides the model.".to_string())),
                Stmt::Expr(Expr::Str("content".to_string())),
            ],
        );
        let (_, plain) = run(decl.clone(), Bindings::new(), FuncOptions::default());
        assert_eq!(rendered(&plain).await, "user: content");

        let options = FuncOptions {
            docstring_role: Some(MessageRole::system()),
            ..FuncOptions::default()
        };
        let (_, with_doc) = run(decl, Bindings::new(), options);
        assert_eq!(
            rendered(&with_doc).await,
            "system: Guides the model.\nuser: content"
        );
    }

    #[test]
    fn missing_binding_is_an_error() {
        let decl = FuncDecl::new("f", vec![Stmt::Expr(Expr::Var("ghost".to_string()))]);
        let body = compile(&decl).unwrap();
        let mut ctx = PromptContext::new();
        let err = execute(&body, &mut ctx, Bindings::new(), &FuncOptions::default()).unwrap_err();
        assert_matches!(
            err,
            RuntimeError::UnknownBinding { name, function }
                if name == "ghost" && function == "f"
        );
    }

    #[tokio::test]
    async fn host_fn_observes_segments_before_it() {
        let host = HostFn::new(|ctx, _| {
            // Everything captured so far is visible at call time.
            let seen = ctx.full_records().len();
            Value::from(format!("saw {seen}"))
        });
        let decl = FuncDecl::new(
            "f",
            vec![Stmt::Expr(Expr::Interp(vec![
                Segment::Text("Q: hi\nA: ".to_string()),
                Segment::Expr(Expr::Host(host)),
            ]))],
        );
        let (_, ctx) = run(decl, Bindings::new(), FuncOptions::default());
        let out = rendered(&ctx).await;
        assert!(out.starts_with("user: Q: hi\nA: saw "), "got {out:?}");
    }
}
