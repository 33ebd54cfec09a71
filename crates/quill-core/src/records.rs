//! The append-only capture log.
//!
//! Every statement a prompt function executes lands here as a
//! [`PromptRecord`], in strict source order. Formatting scopes appear as
//! explicit push/pop markers; nothing is baked into record text at append
//! time, so the same log can be re-rendered at any point.

use quill_futures::StringFuture;

use crate::message::RenderedMessage;
use crate::printer::Indexing;
use crate::role::MessageRole;

/// Deltas a formatting scope applies while it is open.
///
/// `None` fields inherit from the enclosing printer state.
#[derive(Debug, Clone, Default)]
pub struct ScopePush {
    /// Role override; legal only at the outermost scope.
    pub new_role: Option<MessageRole>,
    /// Separator between items in this scope.
    pub separator: Option<String>,
    /// Indexing template; cloned per render so counters start fresh.
    pub indexing: Option<Indexing>,
    /// Indent appended to the parent's indent.
    pub inc_indent: String,
    /// Indent replacing the parent's indent. Conflicts with `inc_indent`.
    pub new_indent: Option<String>,
    /// Inline scopes inherit the first indent and index from the
    /// enclosing non-inline scope.
    pub is_inline: bool,
}

/// One captured statement.
#[derive(Debug, Clone)]
pub enum PromptRecord {
    /// Prompt text, possibly still pending.
    Text(StringFuture),
    /// A complete message with its own role.
    Message(RenderedMessage),
    /// Open a formatting scope.
    ScopePush(ScopePush),
    /// Close the innermost open scope.
    ScopePop,
}

/// An ordered log of prompt records.
#[derive(Debug, Clone, Default)]
pub struct PromptRecords {
    records: Vec<PromptRecord>,
}

impl PromptRecords {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record.
    pub fn record(&mut self, record: PromptRecord) {
        self.records.push(record);
    }

    /// Append a text record.
    pub fn record_text(&mut self, text: impl Into<StringFuture>) {
        self.records.push(PromptRecord::Text(text.into()));
    }

    /// Append every record of `other`, preserving order.
    pub fn extend(&mut self, other: &PromptRecords) {
        self.records.extend(other.records.iter().cloned());
    }

    /// The records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[PromptRecord] {
        &self.records
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// An independent deep copy.
    ///
    /// Pending text nodes stay shared (they are immutable once built), but
    /// the log itself is fully detached from `self`.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        self.clone()
    }
}

impl IntoIterator for PromptRecords {
    type Item = PromptRecord;
    type IntoIter = std::vec::IntoIter<PromptRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl FromIterator<PromptRecord> for PromptRecords {
    fn from_iter<T: IntoIterator<Item = PromptRecord>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn records_preserve_insertion_order() {
        let mut log = PromptRecords::new();
        log.record_text("a");
        log.record(PromptRecord::ScopePush(ScopePush::default()));
        log.record_text("b");
        log.record(PromptRecord::ScopePop);
        assert_eq!(log.len(), 4);
        assert_matches!(log.records()[0], PromptRecord::Text(_));
        assert_matches!(log.records()[1], PromptRecord::ScopePush(_));
        assert_matches!(log.records()[3], PromptRecord::ScopePop);
    }

    #[test]
    fn snapshot_is_detached() {
        let mut log = PromptRecords::new();
        log.record_text("a");
        let snap = log.snapshot();
        log.record_text("b");
        assert_eq!(snap.len(), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn extend_appends_in_order() {
        let mut a = PromptRecords::new();
        a.record_text("1");
        let mut b = PromptRecords::new();
        b.record_text("2");
        b.record_text("3");
        a.extend(&b);
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 2);
    }
}
