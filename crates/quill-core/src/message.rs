//! Role-tagged messages and conversations.

use futures::future::try_join_all;
use quill_futures::StringFuture;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::role::{MessageRole, RoleKind};

/// A message whose content may still be pending.
#[derive(Debug, Clone)]
pub struct RenderedMessage {
    /// Role, or `None` for the ambient default at send time.
    pub role: Option<MessageRole>,
    /// Message content.
    pub content: StringFuture,
}

impl RenderedMessage {
    /// A message with an explicit role.
    #[must_use]
    pub fn new(role: impl Into<Option<MessageRole>>, content: impl Into<StringFuture>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    fn is_tool(&self) -> bool {
        matches!(
            &self.role,
            Some(MessageRole {
                kind: RoleKind::Tool,
                ..
            })
        )
    }

    fn is_system(&self) -> bool {
        matches!(
            &self.role,
            Some(MessageRole {
                kind: RoleKind::System,
                ..
            })
        )
    }

    /// Whether this message may absorb `other` into one logical turn.
    ///
    /// Tool messages never merge; otherwise merging requires identical
    /// roles (names included).
    #[must_use]
    pub fn should_merge(&self, other: &RenderedMessage) -> bool {
        if self.is_tool() || other.is_tool() {
            return false;
        }
        match (&self.role, &other.role) {
            (Some(a), Some(b)) => a.compatible(b),
            (None, None) => true,
            _ => false,
        }
    }

    fn merged(&self, other: &RenderedMessage) -> RenderedMessage {
        RenderedMessage {
            role: self.role.clone(),
            content: self.content.clone() + other.content.clone(),
        }
    }
}

/// A fully resolved message ready for a model server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Chat role.
    pub role: MessageRole,
    /// Resolved content.
    pub content: String,
}

/// An ordered conversation, system messages split out.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    /// System messages, kept ahead of the turn list.
    pub system: Vec<RenderedMessage>,
    /// Non-system turns in order.
    pub messages: Vec<RenderedMessage>,
}

impl Conversation {
    /// An empty conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message, routing system messages to the system list.
    pub fn append(&mut self, message: RenderedMessage) {
        if message.is_system() {
            if !self.messages.is_empty() {
                tracing::warn!("system message appended after non-system turns");
            }
            self.system.push(message);
        } else {
            self.messages.push(message);
        }
    }

    /// Merge adjacent mergeable messages into single logical turns.
    ///
    /// Separators between merged pieces were already emitted by the
    /// renderer, so contents concatenate directly.
    #[must_use]
    pub fn collapse(mut self) -> Self {
        self.system = collapse_messages(self.system);
        self.messages = collapse_messages(self.messages);
        self
    }

    /// Total message count across both lists.
    #[must_use]
    pub fn len(&self) -> usize {
        self.system.len() + self.messages.len()
    }

    /// Whether the conversation holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.system.is_empty() && self.messages.is_empty()
    }

    /// Force every content and produce wire-ready messages.
    ///
    /// Messages without an explicit role take `default_role`. Contents
    /// resolve concurrently; output order is conversation order.
    pub async fn resolve(&self, default_role: MessageRole) -> Result<Vec<ChatMessage>> {
        let all = self.system.iter().chain(self.messages.iter());
        let contents =
            try_join_all(all.clone().map(|m| m.content.resolve())).await?;
        Ok(all
            .zip(contents)
            .map(|(m, content)| ChatMessage {
                role: m.role.clone().unwrap_or_else(|| default_role.clone()),
                content,
            })
            .collect())
    }
}

fn collapse_messages(messages: Vec<RenderedMessage>) -> Vec<RenderedMessage> {
    let mut out: Vec<RenderedMessage> = Vec::with_capacity(messages.len());
    for m in messages {
        match out.last() {
            Some(last) if last.should_merge(&m) => {
                let merged = last.merged(&m);
                *out.last_mut().unwrap() = merged;
            }
            _ => out.push(m),
        }
    }
    out
}
