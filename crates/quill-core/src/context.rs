//! Prompt contexts.
//!
//! A [`PromptContext`] pairs a shared conversation log with the records
//! captured through this particular handle. Sharing is what makes the
//! propagation modes cheap: a copied context deep-copies the log, an
//! inherited one aliases it, and a fresh one starts empty.

use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use quill_futures::StringFuture;

use crate::compositor::{Compositor, RoleScope};
use crate::errors::Result;
use crate::message::{Conversation, RenderedMessage};
use crate::printer::render;
use crate::records::{PromptRecord, PromptRecords, ScopePush};
use crate::role::MessageRole;
use crate::value::Value;

/// The context a prompt function executes against.
#[derive(Debug, Clone)]
pub struct PromptContext {
    id: Uuid,
    /// Conversation log, shared with every inherited handle.
    shared: Arc<Mutex<PromptRecords>>,
    /// Records appended through this handle only.
    local: PromptRecords,
}

impl Default for PromptContext {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptContext {
    /// A fresh, empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            shared: Arc::new(Mutex::new(PromptRecords::new())),
            local: PromptRecords::new(),
        }
    }

    /// Handle identity. Distinct per handle, including inherited ones.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// An independent deep copy of the visible conversation.
    ///
    /// Later appends through either side stay invisible to the other.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            shared: Arc::new(Mutex::new(self.shared.lock().snapshot())),
            local: PromptRecords::new(),
        }
    }

    /// A handle aliasing this context's conversation log.
    ///
    /// Appends through the new handle are immediately visible here. Not
    /// safe for concurrent fan-out; use [`PromptContext::snapshot`] for
    /// parallel branches.
    #[must_use]
    pub fn inherit(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            shared: Arc::clone(&self.shared),
            local: PromptRecords::new(),
        }
    }

    /// Append one record to the conversation and the local log.
    pub fn append_record(&mut self, record: PromptRecord) {
        self.shared.lock().record(record.clone());
        self.local.record(record);
    }

    /// Append prompt text.
    pub fn append_text(&mut self, text: impl Into<StringFuture>) {
        self.append_record(PromptRecord::Text(text.into()));
    }

    /// Append a complete message.
    pub fn append_message(&mut self, message: RenderedMessage) {
        self.append_record(PromptRecord::Message(message));
    }

    /// Append every record of `records` in order.
    pub fn append_records(&mut self, records: &PromptRecords) {
        for record in records.records() {
            self.append_record(record.clone());
        }
    }

    /// Capture a statement value.
    ///
    /// Scalars are not prompt content: they are logged at debug level and
    /// dropped. Lists capture element by element. Nothing here errors.
    pub fn append_value(&mut self, value: Value) {
        match value {
            Value::Null => {}
            Value::Bool(_) | Value::Int(_) | Value::Float(_) => {
                tracing::debug!(kind = value.kind(), "skipping non-prompt value");
            }
            Value::Text(text) => self.append_text(text),
            Value::List(items) => {
                for item in items {
                    self.append_value(item);
                }
            }
            Value::Records(records) => self.append_records(&records),
            Value::Message(message) => self.append_message(message),
            Value::Promptable(p) => self.append_text(p.to_prompt()),
        }
    }

    /// Open a formatting scope.
    pub fn enter_scope(&mut self, compositor: &Compositor) {
        let mut staged = PromptRecords::new();
        compositor.enter(&mut staged);
        for record in staged {
            self.append_record(record);
        }
    }

    /// Close a formatting scope opened with [`PromptContext::enter_scope`].
    pub fn exit_scope(&mut self, compositor: &Compositor) {
        let mut staged = PromptRecords::new();
        compositor.exit(&mut staged);
        for record in staged {
            self.append_record(record);
        }
    }

    /// Open a role scope.
    pub fn enter_role(&mut self, scope: &RoleScope) {
        let mut staged = PromptRecords::new();
        scope.enter(&mut staged);
        for record in staged {
            self.append_record(record);
        }
    }

    /// Close a role scope.
    pub fn exit_role(&mut self, scope: &RoleScope) {
        let mut staged = PromptRecords::new();
        scope.exit(&mut staged);
        for record in staged {
            self.append_record(record);
        }
    }

    /// Records appended through this handle.
    #[must_use]
    pub fn local_records(&self) -> &PromptRecords {
        &self.local
    }

    /// A detached copy of the full visible conversation log.
    #[must_use]
    pub fn full_records(&self) -> PromptRecords {
        self.shared.lock().snapshot()
    }

    /// Render the full visible conversation.
    pub fn full_conversation(&self) -> Result<Conversation> {
        render(&self.full_records())
    }

    /// Merge records into this context, optionally under a role override.
    pub fn merge(&mut self, records: &PromptRecords, role_override: Option<MessageRole>) {
        match role_override {
            Some(role) => {
                self.append_record(PromptRecord::ScopePush(ScopePush {
                    new_role: Some(role),
                    ..ScopePush::default()
                }));
                self.append_records(records);
                self.append_record(PromptRecord::ScopePop);
            }
            None => self.append_records(records),
        }
    }
}
