//! The definition-time body compiler.

use crate::errors::{CompileError, Result};
use crate::ir::{Expr, FuncDecl, ScopeSpec, Segment, Stmt};
use quill_core::compositor::Compositor;

/// A compiled prompt function body.
///
/// Produced once at definition time and reused for every call.
#[derive(Debug, Clone)]
pub struct CompiledBody {
    /// Function name, for diagnostics.
    pub name: String,
    /// Parameter names, bound from call arguments.
    pub params: Vec<String>,
    /// Leading bare string literal, removed from the statement list.
    pub docstring: Option<String>,
    /// Lowered statements.
    pub stmts: Vec<Stmt>,
}

/// Compile a declaration.
///
/// Lowering is purely structural:
/// - a statement-position interpolated literal becomes an inline-string
///   scope whose segments capture left to right, so an embedded call
///   observes every segment before it;
/// - bind-and-yield segments become a bind followed by a capture of the
///   bound name;
/// - the leading bare string literal is pulled out as the docstring;
/// - nested definitions and outer wrappers are rejected.
///
/// Lowering already-lowered statements changes nothing. The docstring
/// rule applies to every declaration, so a declaration rebuilt from
/// lowered statements whose first statement is a bare string yields
/// that string as its docstring; a body's capture sequence is fixed by
/// caching the first compilation on its descriptor, not by re-feeding
/// output through `compile`.
pub fn compile(decl: &FuncDecl) -> Result<CompiledBody> {
    if !decl.outer_wrappers.is_empty() {
        return Err(CompileError::MisorderedWrapper {
            name: decl.name.clone(),
            wrappers: decl.outer_wrappers.clone(),
        });
    }

    let mut stmts = decl.body.as_slice();
    let docstring = match stmts.first() {
        Some(Stmt::Expr(Expr::Str(s))) => {
            stmts = &stmts[1..];
            Some(s.clone())
        }
        _ => None,
    };

    let stmts = lower_block(&decl.name, stmts)?;
    tracing::debug!(name = %decl.name, statements = stmts.len(), "compiled prompt body");
    Ok(CompiledBody {
        name: decl.name.clone(),
        params: decl.params.clone(),
        docstring,
        stmts,
    })
}

fn lower_block(outer: &str, stmts: &[Stmt]) -> Result<Vec<Stmt>> {
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        match stmt {
            Stmt::Def(decl) => {
                return Err(CompileError::NestedDefinition {
                    name: decl.name.clone(),
                    outer: outer.to_string(),
                });
            }
            Stmt::Expr(Expr::Interp(segments)) => {
                out.push(lower_interp(segments));
            }
            Stmt::Scoped { scope, body } => {
                out.push(Stmt::Scoped {
                    scope: scope.clone(),
                    body: lower_block(outer, body)?,
                });
            }
            other => out.push(other.clone()),
        }
    }
    Ok(out)
}

/// A statement-position interpolated literal captures segment by segment
/// under an inline-string scope.
fn lower_interp(segments: &[Segment]) -> Stmt {
    let mut body = Vec::with_capacity(segments.len());
    for segment in segments {
        match segment {
            Segment::Text(text) => body.push(Stmt::Expr(Expr::Str(text.clone()))),
            Segment::Expr(expr) => body.push(Stmt::Expr(expr.clone())),
            Segment::Bind { name, expr } => {
                body.push(Stmt::Bind {
                    name: name.clone(),
                    expr: expr.clone(),
                });
                body.push(Stmt::Expr(Expr::Var(name.clone())));
            }
        }
    }
    Stmt::Scoped {
        scope: ScopeSpec::Format(Compositor::inline_str()),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn interp_stmt() -> Stmt {
        Stmt::Expr(Expr::Interp(vec![
            Segment::Text("Q: ".to_string()),
            Segment::Expr(Expr::Var("question".to_string())),
            Segment::Text("\nA: ".to_string()),
        ]))
    }

    #[test]
    fn interpolation_lowers_to_an_inline_scope() {
        let decl = FuncDecl::new("qa", vec![interp_stmt()]);
        let compiled = compile(&decl).unwrap();
        assert_eq!(compiled.stmts.len(), 1);
        let Stmt::Scoped { scope, body } = &compiled.stmts[0] else {
            panic!("expected scoped statement");
        };
        assert_matches!(scope, ScopeSpec::Format(_));
        assert_eq!(body.len(), 3);
        assert_matches!(&body[0], Stmt::Expr(Expr::Str(s)) if s == "Q: ");
        assert_matches!(&body[1], Stmt::Expr(Expr::Var(v)) if v == "question");
    }

    #[test]
    fn bind_segment_becomes_bind_then_yield() {
        let decl = FuncDecl::new(
            "f",
            vec![Stmt::Expr(Expr::Interp(vec![Segment::Bind {
                name: "x".to_string(),
                expr: Expr::Str("v".to_string()),
            }]))],
        );
        let compiled = compile(&decl).unwrap();
        let Stmt::Scoped { body, .. } = &compiled.stmts[0] else {
            panic!("expected scoped statement");
        };
        assert_eq!(body.len(), 2);
        assert_matches!(&body[0], Stmt::Bind { name, .. } if name == "x");
        assert_matches!(&body[1], Stmt::Expr(Expr::Var(v)) if v == "x");
    }

    #[test]
    fn leading_string_becomes_the_docstring() {
        let decl = FuncDecl::new(
            "documented",
            vec![
                Stmt::Expr(Expr::Str("What this prompt does.".to_string())),
                Stmt::Expr(Expr::Str("actual content".to_string())),
            ],
        );
        let compiled = compile(&decl).unwrap();
        assert_eq!(compiled.docstring.as_deref(), Some("What this prompt does."));
        assert_eq!(compiled.stmts.len(), 1);
    }

    #[test]
    fn nested_definition_is_rejected() {
        let decl = FuncDecl::new(
            "outer_fn",
            vec![Stmt::Scoped {
                scope: ScopeSpec::Format(Compositor::line_separated()),
                body: vec![Stmt::Def(FuncDecl::new("inner_fn", vec![]))],
            }],
        );
        assert_matches!(
            compile(&decl),
            Err(CompileError::NestedDefinition { name, outer })
                if name == "inner_fn" && outer == "outer_fn"
        );
    }

    #[test]
    fn outer_wrappers_are_rejected() {
        let mut decl = FuncDecl::new("wrapped", vec![]);
        decl.outer_wrappers.push("traced".to_string());
        assert_matches!(compile(&decl), Err(CompileError::MisorderedWrapper { .. }));
    }

    #[test]
    fn compilation_is_idempotent() {
        let decl = FuncDecl::new("qa", vec![interp_stmt()]);
        let once = compile(&decl).unwrap();
        // Feeding the lowered statements back through changes nothing.
        let again = compile(&FuncDecl::new("qa", once.stmts.clone())).unwrap();
        assert_eq!(format!("{:?}", once.stmts), format!("{:?}", again.stmts));
    }

    #[test]
    fn rebuilt_declaration_extracts_its_own_docstring() {
        let decl = FuncDecl::new(
            "documented",
            vec![
                Stmt::Expr(Expr::Str("What this prompt does.".to_string())),
                Stmt::Expr(Expr::Str("actual content".to_string())),
            ],
        );
        let once = compile(&decl).unwrap();
        assert_eq!(once.stmts.len(), 1);
        // A declaration rebuilt from lowered statements is a new
        // declaration: its leading bare string is its docstring.
        let again = compile(&FuncDecl::new("documented", once.stmts.clone())).unwrap();
        assert_eq!(again.docstring.as_deref(), Some("actual content"));
        assert!(again.stmts.is_empty());
    }
}
