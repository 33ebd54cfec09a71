//! Lazily-composed string values.
//!
//! A [`StringFuture`] is a node in a directed acyclic composition graph.
//! Leaves wrap either a literal or a scheduled [`CallFuture`]; internal
//! nodes wrap an operation (concatenate, join, slice, format) over child
//! nodes. Building the graph never forces anything, so chains of
//! independent model calls can be composed before any of them complete.
//!
//! Forcing ([`StringFuture::resolve`]) resolves independent children
//! concurrently and memoizes per node: the assembled result always follows
//! the source order of operands, and repeated forcing performs no
//! additional work.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use tokio::sync::OnceCell;

use crate::call::CallFuture;
use crate::errors::Result;

enum NodeKind {
    Literal(String),
    Call(CallFuture),
    Concat(Vec<StringFuture>),
    Join {
        sep: String,
        parts: Vec<StringFuture>,
    },
    /// Character-indexed slice of the inner value.
    Slice {
        inner: StringFuture,
        start: usize,
        end: Option<usize>,
    },
    /// Minimal width/alignment formatting: `<N`, `>N`, `^N`.
    Format {
        inner: StringFuture,
        spec: String,
    },
}

struct Node {
    kind: NodeKind,
    cell: OnceCell<Result<String>>,
}

/// A string that may not be ready yet.
///
/// Cheap to clone; clones share structure and memoization.
#[derive(Clone)]
pub struct StringFuture {
    node: Arc<Node>,
}

impl StringFuture {
    fn from_kind(kind: NodeKind) -> Self {
        Self {
            node: Arc::new(Node {
                kind,
                cell: OnceCell::new(),
            }),
        }
    }

    /// A ready literal value.
    #[must_use]
    pub fn literal(s: impl Into<String>) -> Self {
        Self::from_kind(NodeKind::Literal(s.into()))
    }

    /// Wrap a scheduled call.
    #[must_use]
    pub fn from_call(call: CallFuture) -> Self {
        Self::from_kind(NodeKind::Call(call))
    }

    /// The empty string.
    #[must_use]
    pub fn empty() -> Self {
        Self::literal("")
    }

    /// Concatenate `parts` in order.
    #[must_use]
    pub fn concat(parts: Vec<StringFuture>) -> Self {
        Self::from_kind(NodeKind::Concat(parts))
    }

    /// Join `parts` with `sep`, preserving part order.
    #[must_use]
    pub fn join(sep: impl Into<String>, parts: Vec<StringFuture>) -> Self {
        Self::from_kind(NodeKind::Join {
            sep: sep.into(),
            parts,
        })
    }

    /// Lazy character-indexed slice `[start, end)`; `None` means to the end.
    #[must_use]
    pub fn slice(&self, start: usize, end: Option<usize>) -> Self {
        Self::from_kind(NodeKind::Slice {
            inner: self.clone(),
            start,
            end,
        })
    }

    /// Lazy width/alignment formatting with a spec of the form `<N`, `>N`
    /// or `^N` (left, right, center padding to width `N` with spaces).
    /// An empty spec is the identity.
    #[must_use]
    pub fn formatted(&self, spec: impl Into<String>) -> Self {
        Self::from_kind(NodeKind::Format {
            inner: self.clone(),
            spec: spec.into(),
        })
    }

    /// Lazy comparison with another string future.
    #[must_use]
    pub fn compare(&self, op: CmpOp, other: StringFuture) -> CmpFuture {
        CmpFuture {
            a: self.clone(),
            b: other,
            op,
        }
    }

    /// Lazy equality test.
    #[must_use]
    pub fn eq_lazy(&self, other: impl Into<StringFuture>) -> CmpFuture {
        self.compare(CmpOp::Eq, other.into())
    }

    /// The value, if it is already known without any waiting.
    ///
    /// Literals are always ready; other nodes are ready once memoized.
    #[must_use]
    pub fn ready(&self) -> Option<&str> {
        match &self.node.kind {
            NodeKind::Literal(s) => Some(s),
            _ => match self.node.cell.get() {
                Some(Ok(s)) => Some(s),
                _ => None,
            },
        }
    }

    /// Force the value.
    ///
    /// Children of an internal node are resolved concurrently; the final
    /// result is assembled in operand source order. Memoized per node: the
    /// second force of any node returns the identical value (or error).
    pub fn resolve(&self) -> BoxFuture<'_, Result<String>> {
        async move {
            self.node
                .cell
                .get_or_init(|| async {
                    match &self.node.kind {
                        NodeKind::Literal(s) => Ok(s.clone()),
                        NodeKind::Call(call) => call.resolve().await,
                        NodeKind::Concat(parts) => {
                            let resolved =
                                try_join_all(parts.iter().map(StringFuture::resolve)).await?;
                            Ok(resolved.concat())
                        }
                        NodeKind::Join { sep, parts } => {
                            let resolved =
                                try_join_all(parts.iter().map(StringFuture::resolve)).await?;
                            Ok(resolved.join(sep))
                        }
                        NodeKind::Slice { inner, start, end } => {
                            let full = inner.resolve().await?;
                            Ok(slice_chars(&full, *start, *end))
                        }
                        NodeKind::Format { inner, spec } => {
                            let full = inner.resolve().await?;
                            Ok(apply_format(&full, spec))
                        }
                    }
                })
                .await
                .clone()
        }
        .boxed()
    }
}

/// Slice `s` by character indices, clamping out-of-range bounds.
fn slice_chars(s: &str, start: usize, end: Option<usize>) -> String {
    let iter = s.chars().skip(start);
    match end {
        Some(end) => iter.take(end.saturating_sub(start)).collect(),
        None => iter.collect(),
    }
}

/// Apply a `<N` / `>N` / `^N` width spec with space padding.
fn apply_format(s: &str, spec: &str) -> String {
    let (align, width_str) = match spec.chars().next() {
        Some(c @ ('<' | '>' | '^')) => (c, &spec[1..]),
        _ => ('<', spec),
    };
    let Ok(width) = width_str.parse::<usize>() else {
        return s.to_string();
    };
    let len = s.chars().count();
    if len >= width {
        return s.to_string();
    }
    let pad = width - len;
    match align {
        '>' => format!("{}{s}", " ".repeat(pad)),
        '^' => {
            let left = pad / 2;
            format!("{}{s}{}", " ".repeat(left), " ".repeat(pad - left))
        }
        _ => format!("{s}{}", " ".repeat(pad)),
    }
}

impl From<&str> for StringFuture {
    fn from(s: &str) -> Self {
        Self::literal(s)
    }
}

impl From<String> for StringFuture {
    fn from(s: String) -> Self {
        Self::literal(s)
    }
}

impl std::ops::Add for StringFuture {
    type Output = StringFuture;

    fn add(self, rhs: StringFuture) -> StringFuture {
        StringFuture::concat(vec![self, rhs])
    }
}

impl std::ops::Add<&str> for StringFuture {
    type Output = StringFuture;

    fn add(self, rhs: &str) -> StringFuture {
        StringFuture::concat(vec![self, StringFuture::literal(rhs)])
    }
}

impl std::fmt::Debug for StringFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.ready() {
            Some(s) => write!(f, "StringFuture({s:?})"),
            None => write!(f, "StringFuture(<pending>)"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lazy comparisons
// ─────────────────────────────────────────────────────────────────────────────

/// Comparison operator for [`CmpFuture`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Lexicographically less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

/// A lazy comparison between two string futures.
///
/// Building one forces nothing; [`CmpFuture::resolve`] forces both sides.
#[derive(Clone, Debug)]
pub struct CmpFuture {
    a: StringFuture,
    b: StringFuture,
    op: CmpOp,
}

impl CmpFuture {
    /// Force both sides and evaluate the comparison.
    pub async fn resolve(&self) -> Result<bool> {
        let (a, b) = futures::try_join!(self.a.resolve(), self.b.resolve())?;
        Ok(match self.op {
            CmpOp::Eq => a == b,
            CmpOp::Ne => a != b,
            CmpOp::Lt => a < b,
            CmpOp::Le => a <= b,
            CmpOp::Gt => a > b,
            CmpOp::Ge => a >= b,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FutureError;
    use crate::pool::WorkerPool;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    fn delayed(pool: &WorkerPool, label: &str, ms: u64, value: &str) -> StringFuture {
        let value = value.to_string();
        StringFuture::from_call(CallFuture::spawn(pool, label, None, async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(value)
        }))
    }

    #[tokio::test]
    async fn literal_resolves_immediately() {
        let s = StringFuture::literal("hi");
        assert_eq!(s.ready(), Some("hi"));
        assert_eq!(s.resolve().await.unwrap(), "hi");
    }

    #[tokio::test]
    async fn concat_preserves_source_order() {
        let pool = WorkerPool::new(4);
        // B resolves well before A; output order must still be A,B,C.
        let a = delayed(&pool, "a", 40, "A");
        let b = delayed(&pool, "b", 1, "B");
        let c = StringFuture::literal("C");
        let joined = StringFuture::concat(vec![a, b, c]);
        assert_eq!(joined.resolve().await.unwrap(), "ABC");
    }

    #[tokio::test]
    async fn join_uses_separator_in_order() {
        let pool = WorkerPool::new(4);
        let parts = vec![
            delayed(&pool, "x", 20, "x"),
            delayed(&pool, "y", 5, "y"),
            StringFuture::literal("z"),
        ];
        let joined = StringFuture::join(", ", parts);
        assert_eq!(joined.resolve().await.unwrap(), "x, y, z");
    }

    #[tokio::test(start_paused = true)]
    async fn independent_children_resolve_concurrently() {
        let pool = WorkerPool::new(8);
        let parts: Vec<StringFuture> = (0..4)
            .map(|i| delayed(&pool, &format!("p{i}"), 100, "."))
            .collect();
        let all = StringFuture::concat(parts);
        let start = Instant::now();
        assert_eq!(all.resolve().await.unwrap(), "....");
        // Bound is max(d), not 4*d, with slack for scheduler flakiness.
        assert!(start.elapsed() < Duration::from_millis(250));
    }

    #[tokio::test]
    async fn resolution_is_memoized() {
        let pool = WorkerPool::new(2);
        let counter = std::sync::Arc::new(AtomicUsize::new(0));
        let n = std::sync::Arc::clone(&counter);
        let s = StringFuture::from_call(CallFuture::spawn(&pool, "m", None, async move {
            let _ = n.fetch_add(1, Ordering::SeqCst);
            Ok("once".to_string())
        }));
        let composed = s.clone() + " more";
        assert_eq!(composed.resolve().await.unwrap(), "once more");
        assert_eq!(composed.resolve().await.unwrap(), "once more");
        assert_eq!(s.resolve().await.unwrap(), "once");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_surfaces_only_through_dependents() {
        let pool = WorkerPool::new(2);
        let bad = StringFuture::from_call(CallFuture::spawn(&pool, "bad", None, async {
            Err(FutureError::call_failed("bad", "boom"))
        }));
        let good = StringFuture::literal("ok");
        // Composing with a failed leaf is fine until forced.
        let dependent = bad + " suffix";
        assert!(dependent.resolve().await.is_err());
        assert_eq!(good.resolve().await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn slice_is_char_indexed() {
        let s = StringFuture::literal("ab—cd");
        assert_eq!(s.slice(1, Some(4)).resolve().await.unwrap(), "b—c");
        assert_eq!(s.slice(3, None).resolve().await.unwrap(), "cd");
        assert_eq!(s.slice(9, None).resolve().await.unwrap(), "");
    }

    #[tokio::test]
    async fn format_pads_to_width() {
        let s = StringFuture::literal("ab");
        assert_eq!(s.formatted("<5").resolve().await.unwrap(), "ab   ");
        assert_eq!(s.formatted(">5").resolve().await.unwrap(), "   ab");
        assert_eq!(s.formatted("^4").resolve().await.unwrap(), " ab ");
        assert_eq!(s.formatted("").resolve().await.unwrap(), "ab");
        assert_eq!(s.formatted("1").resolve().await.unwrap(), "ab");
    }

    #[tokio::test]
    async fn add_operator_concatenates() {
        let s = StringFuture::literal("Q: ") + "why?" + "\nA: ";
        assert_eq!(s.resolve().await.unwrap(), "Q: why?\nA: ");
    }

    #[tokio::test]
    async fn cmp_future_is_lazy() {
        let pool = WorkerPool::new(2);
        let a = delayed(&pool, "a", 5, "same");
        let cmp = a.eq_lazy("same");
        assert!(cmp.resolve().await.unwrap());
        let ne = StringFuture::literal("x").compare(CmpOp::Ne, "y".into());
        assert!(ne.resolve().await.unwrap());
        let lt = StringFuture::literal("a").compare(CmpOp::Lt, "b".into());
        assert!(lt.resolve().await.unwrap());
    }
}
