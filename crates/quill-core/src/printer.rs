//! The rendering state machine.
//!
//! [`render`] walks a record log once, maintaining a stack of
//! [`PrinterState`]s that track the active role, separator, indexing, and
//! indentation. Text records become role-tagged messages whose contents
//! are still lazy; nothing is forced during rendering.

use quill_futures::StringFuture;

use crate::errors::{CoreError, Result};
use crate::message::{Conversation, RenderedMessage};
use crate::records::{PromptRecord, PromptRecords, ScopePush};
use crate::role::MessageRole;

/// Numbering style for indexed scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexMethod {
    /// `1.`, `2.`, ...
    Number,
    /// `A.`, `B.`, ...
    LetterUpper,
    /// `a.`, `b.`, ...
    LetterLower,
    /// `I.`, `II.`, ...
    RomanUpper,
    /// `i.`, `ii.`, ...
    RomanLower,
    /// `- ` bullets.
    Dash,
    /// `* ` bullets.
    Star,
    /// `#`, `##`, ... heading markers of the given depth.
    Sharp(usize),
}

/// A stateful index prefix generator.
///
/// Each call to [`Indexing::next_index`] yields the prefix for the next
/// item and advances the counter.
#[derive(Debug, Clone)]
pub struct Indexing {
    method: Option<IndexMethod>,
    ind: usize,
    prefix: String,
    suffix: Option<String>,
}

impl Indexing {
    /// Indexing with the given style, counting from zero.
    #[must_use]
    pub fn new(method: IndexMethod) -> Self {
        Self {
            method: Some(method),
            ind: 0,
            prefix: String::new(),
            suffix: None,
        }
    }

    /// No indexing; every prefix is empty.
    #[must_use]
    pub fn none() -> Self {
        Self {
            method: None,
            ind: 0,
            prefix: String::new(),
            suffix: None,
        }
    }

    /// Override the text placed before the index.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Override the text placed after the index (default `". "` for
    /// counted styles, `" "` for bullets).
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    /// The prefix for the next item; advances the counter.
    pub fn next_index(&mut self) -> Result<String> {
        let ind = self.ind;
        self.ind += 1;
        self.index_at(ind)
    }

    fn index_at(&self, ind: usize) -> Result<String> {
        let Some(method) = self.method else {
            return Ok(String::new());
        };
        let mut default_suffix = ". ";
        let base = match method {
            IndexMethod::Number => (ind + 1).to_string(),
            IndexMethod::LetterUpper | IndexMethod::LetterLower => {
                if ind >= 26 {
                    return Err(CoreError::IndexOverflow);
                }
                let c = (b'A' + u8::try_from(ind).unwrap_or(25)) as char;
                if method == IndexMethod::LetterLower {
                    c.to_ascii_lowercase().to_string()
                } else {
                    c.to_string()
                }
            }
            IndexMethod::RomanUpper => to_roman(ind + 1),
            IndexMethod::RomanLower => to_roman(ind + 1).to_lowercase(),
            IndexMethod::Dash => {
                default_suffix = " ";
                "-".to_string()
            }
            IndexMethod::Star => {
                default_suffix = " ";
                "*".to_string()
            }
            IndexMethod::Sharp(depth) => {
                default_suffix = " ";
                "#".repeat(depth.max(1))
            }
        };
        let suffix = self.suffix.as_deref().unwrap_or(default_suffix);
        Ok(format!("{}{base}{suffix}", self.prefix))
    }
}

fn to_roman(mut n: usize) -> String {
    const TABLE: [(usize, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, sym) in TABLE {
        while n >= value {
            out.push_str(sym);
            n -= value;
        }
    }
    out
}

/// One frame of the printer stack.
#[derive(Debug, Clone)]
struct PrinterState {
    role: Option<MessageRole>,
    separator: String,
    /// `None` inherits the nearest ancestor's indexing, counter included.
    indexing: Option<Indexing>,
    indent: String,
    is_inline: bool,
    is_start: bool,
    current_sep: String,
}

impl PrinterState {
    fn root() -> Self {
        Self {
            role: None,
            separator: "\n".to_string(),
            indexing: Some(Indexing::none()),
            indent: String::new(),
            is_inline: false,
            is_start: true,
            current_sep: String::new(),
        }
    }
}

/// Renders a record log into lazy role-tagged messages.
struct PromptPrinter {
    states: Vec<PrinterState>,
    is_newline: bool,
}

impl PromptPrinter {
    fn new() -> Self {
        Self {
            states: vec![PrinterState::root()],
            is_newline: true,
        }
    }

    fn push(&mut self, push: &ScopePush) -> Result<()> {
        let top = self.states.len() - 1;
        let state = &self.states[top];

        let same_role = push.new_role.is_none() || push.new_role == state.role;
        let (role, current_sep, default_sep, mut new_indent);
        let inherit_indexing;
        if same_role {
            role = state.role.clone();
            current_sep = state.current_sep.clone();
            default_sep = state.separator.clone();
            inherit_indexing = true;
            new_indent = push.new_indent.clone();
        } else {
            let new_role = push.new_role.clone();
            tracing::debug!(role = ?new_role, "new role started");
            if self.states.len() > 1 {
                return Err(CoreError::NestedRoleChange {
                    role: new_role.as_ref().map(ToString::to_string).unwrap_or_default(),
                });
            }
            let outer = &mut self.states[top];
            outer.is_start = true;
            outer.current_sep = String::new();
            role = new_role;
            current_sep = String::new();
            default_sep = "\n".to_string();
            inherit_indexing = false;
            new_indent = push.new_indent.clone();
            if new_indent.is_none() {
                if !push.inc_indent.is_empty() {
                    return Err(CoreError::InvalidScope(
                        "inc_indent is not allowed when a new role starts; use new_indent"
                            .to_string(),
                    ));
                }
                new_indent = Some(String::new());
            }
        }

        let separator = push.separator.clone().unwrap_or(default_sep);
        let indexing = match &push.indexing {
            Some(idx) => Some(idx.clone()),
            None if inherit_indexing => None,
            None => Some(Indexing::none()),
        };
        let indent = match new_indent {
            Some(indent) => {
                if !push.inc_indent.is_empty() {
                    return Err(CoreError::InvalidScope(
                        "inc_indent and new_indent cannot both be set".to_string(),
                    ));
                }
                indent
            }
            None => format!("{}{}", self.states[self.states.len() - 1].indent, push.inc_indent),
        };

        self.states.push(PrinterState {
            role,
            separator,
            indexing,
            indent,
            is_inline: push.is_inline,
            is_start: true,
            current_sep,
        });
        Ok(())
    }

    fn pop(&mut self) -> Result<()> {
        if self.states.len() == 1 {
            return Err(CoreError::UnbalancedScope);
        }
        self.states.pop();
        Ok(())
    }

    /// Advance and return the effective index, resolving inheritance from
    /// `from` toward the root.
    fn advance_index(&mut self, from: usize) -> Result<String> {
        let mut i = from;
        loop {
            if let Some(idx) = self.states[i].indexing.as_mut() {
                return idx.next_index();
            }
            if i == 0 {
                return Ok(String::new());
            }
            i -= 1;
        }
    }

    fn print_text(&mut self, content: &StringFuture) -> Result<StringFuture> {
        let top = self.states.len() - 1;
        let role = self.states[top].role.clone();
        let sep = self.states[top].current_sep.clone();
        let mut indent = self.states[top].indent.clone();
        let mut index_frame = top;

        if self.states[top].is_start {
            // First item in this scope: switch to the scope's own
            // separator, and cascade the switch into enclosing scopes
            // still at their start.
            self.states[top].is_start = false;
            self.states[top].current_sep = self.states[top].separator.clone();
            for i in (0..top).rev() {
                if self.states[i].role != role {
                    break;
                }
                if self.states[i].is_start {
                    self.states[i].is_start = false;
                    self.states[i].current_sep = self.states[i].separator.clone();
                } else {
                    break;
                }
            }
            if self.states[top].is_inline {
                // First item of an inline scope borrows the indent and
                // indexing of the nearest enclosing non-inline scope.
                for i in (0..top).rev() {
                    if self.states[i].role != role {
                        break;
                    }
                    if !self.states[i].is_inline {
                        indent = self.states[i].indent.clone();
                        index_frame = i;
                        break;
                    }
                }
            }
        }

        if sep.ends_with('\n') {
            self.is_newline = true;
        }

        let mut s = StringFuture::literal(sep);
        if self.is_newline {
            if !indent.is_empty() {
                s = s + indent.as_str();
            }
            self.is_newline = false;
        }
        let index = self.advance_index(index_frame)?;
        if !index.is_empty() {
            s = s + index.as_str();
        }
        Ok(s + content.clone())
    }

    fn handle(&mut self, record: &PromptRecord, convo: &mut Conversation) -> Result<()> {
        match record {
            PromptRecord::Text(content) => {
                let role = self.states[self.states.len() - 1].role.clone();
                let content = self.print_text(content)?;
                convo.append(RenderedMessage { role, content });
            }
            PromptRecord::Message(message) => {
                let explicit_role = message.role.is_some();
                convo.append(message.clone());
                if explicit_role && self.states.len() == 1 {
                    // A role-tagged message restarts the outermost scope.
                    let outer = &mut self.states[0];
                    outer.is_start = true;
                    outer.current_sep = String::new();
                }
            }
            PromptRecord::ScopePush(push) => self.push(push)?,
            PromptRecord::ScopePop => self.pop()?,
        }
        Ok(())
    }
}

/// Render a record log into a conversation of lazy messages.
///
/// Adjacent same-role messages are collapsed into single logical turns.
pub fn render(records: &PromptRecords) -> Result<Conversation> {
    let mut printer = PromptPrinter::new();
    let mut convo = Conversation::new();
    for record in records.records() {
        printer.handle(record, &mut convo)?;
    }
    Ok(convo.collapse())
}
