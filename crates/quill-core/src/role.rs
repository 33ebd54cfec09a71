//! Message roles.

use serde::{Deserialize, Serialize};

/// The four chat role kinds understood by model servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleKind {
    /// System instructions.
    System,
    /// End-user turns.
    User,
    /// Model turns.
    Assistant,
    /// Tool invocation results.
    Tool,
}

impl RoleKind {
    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RoleKind::System => "system",
            RoleKind::User => "user",
            RoleKind::Assistant => "assistant",
            RoleKind::Tool => "tool",
        }
    }
}

/// A role kind plus an optional speaker name.
///
/// Named roles keep the same kind on the wire but never collapse with
/// differently-named neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRole {
    /// Chat role kind.
    pub kind: RoleKind,
    /// Speaker name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl MessageRole {
    /// A bare role of the given kind.
    #[must_use]
    pub fn new(kind: RoleKind) -> Self {
        Self { kind, name: None }
    }

    /// A named role of the given kind.
    #[must_use]
    pub fn named(kind: RoleKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
        }
    }

    /// `system`
    #[must_use]
    pub fn system() -> Self {
        Self::new(RoleKind::System)
    }

    /// `user`
    #[must_use]
    pub fn user() -> Self {
        Self::new(RoleKind::User)
    }

    /// `assistant`
    #[must_use]
    pub fn assistant() -> Self {
        Self::new(RoleKind::Assistant)
    }

    /// `tool`
    #[must_use]
    pub fn tool() -> Self {
        Self::new(RoleKind::Tool)
    }

    /// Whether two roles may share a collapsed message.
    #[must_use]
    pub fn compatible(&self, other: &MessageRole) -> bool {
        self == other
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}:{name}", self.kind.as_str()),
            None => f.write_str(self.kind.as_str()),
        }
    }
}

impl From<RoleKind> for MessageRole {
    fn from(kind: RoleKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_name() {
        assert_eq!(MessageRole::user().to_string(), "user");
        assert_eq!(
            MessageRole::named(RoleKind::User, "alice").to_string(),
            "user:alice"
        );
    }

    #[test]
    fn named_roles_do_not_collapse_across_names() {
        let alice = MessageRole::named(RoleKind::User, "alice");
        let bob = MessageRole::named(RoleKind::User, "bob");
        assert!(!alice.compatible(&bob));
        assert!(alice.compatible(&alice.clone()));
        assert!(!MessageRole::user().compatible(&alice));
    }

    #[test]
    fn serde_round_trip() {
        let role = MessageRole::named(RoleKind::Assistant, "critic");
        let json = serde_json::to_string(&role).unwrap();
        assert_eq!(json, r#"{"kind":"assistant","name":"critic"}"#);
        let back: MessageRole = serde_json::from_str(&json).unwrap();
        assert_eq!(back, role);
    }
}
