//! Host tools offered to the model.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use quill_core::message::RenderedMessage;
use quill_core::role::MessageRole;

use crate::errors::{LlmError, Result};

/// JSON-schema description of one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSchema {
    /// Tool name the model calls it by.
    pub name: String,
    /// What the tool does.
    pub description: String,
    /// JSON schema of the parameter object.
    pub parameters: serde_json::Value,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    /// Tool to invoke.
    pub name: String,
    /// Argument object.
    pub arguments: serde_json::Value,
}

type ToolHandler = Arc<dyn Fn(serde_json::Value) -> Result<String> + Send + Sync>;

/// A registered host callable.
#[derive(Clone)]
pub struct Tool {
    schema: ToolSchema,
    handler: ToolHandler,
}

impl Tool {
    /// Register a handler under a schema.
    pub fn new(
        schema: ToolSchema,
        handler: impl Fn(serde_json::Value) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            schema,
            handler: Arc::new(handler),
        }
    }

    /// The tool's schema.
    #[must_use]
    pub fn schema(&self) -> &ToolSchema {
        &self.schema
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool").field("name", &self.schema.name).finish()
    }
}

/// The set of tools offered on a call.
#[derive(Debug, Clone, Default)]
pub struct Toolkit {
    tools: Vec<Tool>,
}

impl Toolkit {
    /// An empty toolkit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool.
    pub fn register(&mut self, tool: Tool) {
        self.tools.push(tool);
    }

    /// Schemas for the call parameter bag.
    #[must_use]
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema.clone()).collect()
    }

    /// Run a requested call and wrap the output as a tool message.
    pub fn execute(&self, call: &ToolCall) -> Result<RenderedMessage> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.schema.name == call.name)
            .ok_or_else(|| LlmError::UnknownTool(call.name.clone()))?;
        let output = (tool.handler)(call.arguments.clone()).map_err(|e| LlmError::Tool {
            name: call.name.clone(),
            message: e.to_string(),
        })?;
        Ok(RenderedMessage::new(
            MessageRole::named(quill_core::role::RoleKind::Tool, call.name.clone()),
            output,
        ))
    }
}
