//! Formatting scopes.
//!
//! A [`Compositor`] is a declarative description of a formatting scope:
//! entering one appends a scope-push record (plus optional prolog text and
//! an inner scope for wrapped styles), exiting appends the matching pops.
//! The printer applies the directives at render time.

use std::collections::BTreeMap;

use crate::printer::{IndexMethod, Indexing};
use crate::records::{PromptRecord, PromptRecords, ScopePush};
use crate::role::{MessageRole, RoleKind};

/// Four-space indent used by the indented styles.
pub const INDENT: &str = "    ";

/// Prolog/epilog wrapping for the tagged and logged styles.
#[derive(Debug, Clone)]
struct Wrap {
    prolog: String,
    epilog: String,
    /// Scope applied to the wrapped body, inside the prolog and epilog.
    inner: ScopePush,
}

/// A formatting scope directive.
#[derive(Debug, Clone, Default)]
pub struct Compositor {
    outer: ScopePush,
    wrap: Option<Wrap>,
}

impl Compositor {
    fn plain(separator: &str) -> ScopePush {
        ScopePush {
            separator: Some(separator.to_string()),
            // Own empty indexing, never the parent's counter.
            indexing: Some(Indexing::none()),
            ..ScopePush::default()
        }
    }

    /// Items separated by single newlines.
    #[must_use]
    pub fn line_separated() -> Self {
        Self {
            outer: Self::plain("\n"),
            wrap: None,
        }
    }

    /// Items separated by blank lines.
    #[must_use]
    pub fn double_line_separated() -> Self {
        Self {
            outer: Self::plain("\n\n"),
            wrap: None,
        }
    }

    /// Line-separated items indented one level past the parent.
    #[must_use]
    pub fn indented_list() -> Self {
        Self {
            outer: ScopePush {
                inc_indent: INDENT.to_string(),
                ..Self::plain("\n")
            },
            wrap: None,
        }
    }

    /// Line-separated items with indentation reset to none.
    #[must_use]
    pub fn no_indent() -> Self {
        Self {
            outer: ScopePush {
                new_indent: Some(String::new()),
                ..Self::plain("\n")
            },
            wrap: None,
        }
    }

    fn indexed(method: IndexMethod) -> Self {
        Self {
            outer: ScopePush {
                indexing: Some(Indexing::new(method)),
                ..Self::plain("\n")
            },
            wrap: None,
        }
    }

    /// `1.`-numbered line-separated items.
    #[must_use]
    pub fn numbered_list() -> Self {
        Self::indexed(IndexMethod::Number)
    }

    /// `- ` bulleted items.
    #[must_use]
    pub fn dash_list() -> Self {
        Self::indexed(IndexMethod::Dash)
    }

    /// `* ` bulleted items.
    #[must_use]
    pub fn star_list() -> Self {
        Self::indexed(IndexMethod::Star)
    }

    /// `A.`-lettered items.
    #[must_use]
    pub fn letter_list() -> Self {
        Self::indexed(IndexMethod::LetterUpper)
    }

    /// `a.`-lettered items.
    #[must_use]
    pub fn lower_letter_list() -> Self {
        Self::indexed(IndexMethod::LetterLower)
    }

    /// `I.`-numbered items.
    #[must_use]
    pub fn roman_list() -> Self {
        Self::indexed(IndexMethod::RomanUpper)
    }

    /// `i.`-numbered items.
    #[must_use]
    pub fn lower_roman_list() -> Self {
        Self::indexed(IndexMethod::RomanLower)
    }

    /// Body wrapped between `prolog` and `epilog` lines, with `indent_inside`
    /// applied to the body only.
    #[must_use]
    pub fn logged(
        prolog: impl Into<String>,
        epilog: impl Into<String>,
        indent_inside: Option<&str>,
    ) -> Self {
        Self {
            outer: Self::plain("\n"),
            wrap: Some(Wrap {
                prolog: prolog.into(),
                epilog: epilog.into(),
                inner: ScopePush {
                    inc_indent: indent_inside.unwrap_or("").to_string(),
                    ..Self::plain("\n")
                },
            }),
        }
    }

    /// Body wrapped in `<tag>` / `</tag>` lines with optional attributes,
    /// body indented by `indent_inside`.
    #[must_use]
    pub fn tagged(
        tag: &str,
        attrs: &BTreeMap<String, String>,
        indent_inside: Option<&str>,
    ) -> Self {
        let formatted_attrs: String = attrs
            .iter()
            .map(|(k, v)| format!(" {k}=\"{v}\""))
            .collect();
        Self::logged(
            format!("<{tag}{formatted_attrs}>"),
            format!("</{tag}>"),
            indent_inside,
        )
    }

    /// Body wrapped in a tag on a single line: `<tag>a,b</tag>`.
    ///
    /// `sep` only separates body items; the tag markers glue directly to
    /// the body.
    #[must_use]
    pub fn inline_tagged(tag: &str, sep: &str) -> Self {
        Self {
            outer: ScopePush {
                new_indent: Some(String::new()),
                is_inline: true,
                ..Self::plain("")
            },
            wrap: Some(Wrap {
                prolog: format!("<{tag}>"),
                epilog: format!("</{tag}>"),
                inner: ScopePush {
                    new_indent: Some(String::new()),
                    is_inline: true,
                    ..Self::plain(sep)
                },
            }),
        }
    }

    /// Inline scope used for interpolated literals: no separator, no
    /// indentation, first segment glued to the preceding text.
    #[must_use]
    pub fn inline_str() -> Self {
        Self {
            outer: ScopePush {
                new_indent: Some(String::new()),
                is_inline: true,
                ..Self::plain("")
            },
            wrap: None,
        }
    }

    /// Override the separator between items.
    #[must_use]
    pub fn with_separator(mut self, sep: impl Into<String>) -> Self {
        self.outer.separator = Some(sep.into());
        self
    }

    /// Override the indexing style.
    #[must_use]
    pub fn with_indexing(mut self, indexing: Indexing) -> Self {
        self.outer.indexing = Some(indexing);
        self
    }

    /// Append the records that open this scope.
    pub fn enter(&self, records: &mut PromptRecords) {
        records.record(PromptRecord::ScopePush(self.outer.clone()));
        if let Some(wrap) = &self.wrap {
            records.record_text(wrap.prolog.clone());
            records.record(PromptRecord::ScopePush(wrap.inner.clone()));
        }
    }

    /// Append the records that close this scope.
    pub fn exit(&self, records: &mut PromptRecords) {
        if let Some(wrap) = &self.wrap {
            records.record(PromptRecord::ScopePop);
            records.record_text(wrap.epilog.clone());
        }
        records.record(PromptRecord::ScopePop);
    }
}

/// A role override scope.
///
/// Legal only at the outermost formatting level; the printer rejects role
/// changes inside nested scopes.
#[derive(Debug, Clone)]
pub struct RoleScope {
    role: MessageRole,
}

impl RoleScope {
    /// Scope with the given role.
    #[must_use]
    pub fn new(role: MessageRole) -> Self {
        Self { role }
    }

    /// System role scope.
    #[must_use]
    pub fn system() -> Self {
        Self::new(MessageRole::new(RoleKind::System))
    }

    /// User role scope.
    #[must_use]
    pub fn user() -> Self {
        Self::new(MessageRole::new(RoleKind::User))
    }

    /// Assistant role scope.
    #[must_use]
    pub fn assistant() -> Self {
        Self::new(MessageRole::new(RoleKind::Assistant))
    }

    /// Tool role scope.
    #[must_use]
    pub fn tool() -> Self {
        Self::new(MessageRole::new(RoleKind::Tool))
    }

    /// The role this scope applies.
    #[must_use]
    pub fn role(&self) -> &MessageRole {
        &self.role
    }

    /// Append the record that opens this scope.
    pub fn enter(&self, records: &mut PromptRecords) {
        records.record(PromptRecord::ScopePush(ScopePush {
            new_role: Some(self.role.clone()),
            ..ScopePush::default()
        }));
    }

    /// Append the record that closes this scope.
    pub fn exit(&self, records: &mut PromptRecords) {
        records.record(PromptRecord::ScopePop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::render;
    use crate::role::MessageRole;

    async fn rendered(records: &PromptRecords) -> String {
        let convo = render(records).unwrap();
        let msgs = convo.resolve(MessageRole::user()).await.unwrap();
        msgs.into_iter()
            .map(|m| m.content)
            .collect::<Vec<_>>()
            .join("\n===\n")
    }

    #[tokio::test]
    async fn numbered_list_renders_prefixes() {
        let mut log = PromptRecords::new();
        let c = Compositor::numbered_list();
        c.enter(&mut log);
        log.record_text("item1");
        log.record_text("item2");
        c.exit(&mut log);
        assert_eq!(rendered(&log).await, "1. item1\n2. item2");
    }

    #[tokio::test]
    async fn tagged_wraps_and_indents_body() {
        let mut log = PromptRecords::new();
        let c = Compositor::tagged("div", &BTreeMap::new(), Some(INDENT));
        c.enter(&mut log);
        log.record_text("item1");
        log.record_text("item2");
        c.exit(&mut log);
        assert_eq!(rendered(&log).await, "<div>\n    item1\n    item2\n</div>");
    }

    #[tokio::test]
    async fn tagged_renders_attributes() {
        let mut log = PromptRecords::new();
        let mut attrs = BTreeMap::new();
        attrs.insert("class".to_string(), "hint".to_string());
        let c = Compositor::tagged("p", &attrs, None);
        c.enter(&mut log);
        log.record_text("x");
        c.exit(&mut log);
        assert_eq!(rendered(&log).await, "<p class=\"hint\">\nx\n</p>");
    }

    #[tokio::test]
    async fn inline_tagged_stays_on_one_line() {
        let mut log = PromptRecords::new();
        let c = Compositor::inline_tagged("div", ",");
        c.enter(&mut log);
        log.record_text("item1");
        log.record_text("item2");
        c.exit(&mut log);
        assert_eq!(rendered(&log).await, "<div>item1,item2</div>");
    }

    #[tokio::test]
    async fn logged_wraps_with_prolog_and_epilog() {
        let mut log = PromptRecords::new();
        let c = Compositor::logged("BEGIN", "END", None);
        c.enter(&mut log);
        log.record_text("item1");
        log.record_text("item2");
        c.exit(&mut log);
        assert_eq!(rendered(&log).await, "BEGIN\nitem1\nitem2\nEND");
    }

    #[tokio::test]
    async fn inline_str_glues_segments() {
        let mut log = PromptRecords::new();
        log.record_text("before");
        let c = Compositor::inline_str();
        c.enter(&mut log);
        log.record_text("Q: ");
        log.record_text("why?");
        c.exit(&mut log);
        log.record_text("after");
        assert_eq!(rendered(&log).await, "before\nQ: why?\nafter");
    }

    #[tokio::test]
    async fn role_scope_changes_the_message_role() {
        let mut log = PromptRecords::new();
        let scope = RoleScope::assistant();
        scope.enter(&mut log);
        log.record_text("thinking");
        scope.exit(&mut log);
        let convo = render(&log).unwrap();
        assert_eq!(convo.messages[0].role, Some(MessageRole::assistant()));
    }
}
