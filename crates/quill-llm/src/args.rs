//! Call parameters and the content-addressed cache key.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use quill_core::message::ChatMessage;

use crate::errors::Result;
use crate::tool::ToolSchema;

/// Sampling and transport parameters for one model call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenParams {
    /// Model identity; `None` uses the server's default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Sampling temperature. Zero means deterministic and cacheable.
    pub temperature: f64,
    /// Nucleus sampling bound.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Completion token limit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
    /// Stream partial output instead of waiting for the full response.
    pub stream: bool,
    /// Per-call timeout in seconds; `None` uses the settings default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for GenParams {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.0,
            top_p: None,
            max_tokens: None,
            stop: Vec::new(),
            stream: false,
            timeout_secs: None,
        }
    }
}

impl GenParams {
    /// Set the model identity.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Enable streaming.
    #[must_use]
    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }
}

/// Everything a server needs for one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenArgs {
    /// Resolved conversation in order.
    pub messages: Vec<ChatMessage>,
    /// Sampling parameters.
    pub params: GenParams,
    /// Tool schemas offered to the model.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tools: Vec<ToolSchema>,
}

impl GenArgs {
    /// Args for a plain call with default parameters.
    #[must_use]
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            params: GenParams::default(),
            tools: Vec::new(),
        }
    }

    /// Serialized form used for cache and trace keys.
    ///
    /// The streaming flag does not affect the response content, so it is
    /// stripped before keying.
    pub fn cache_key(&self) -> Result<String> {
        let mut value = serde_json::to_value(self)?;
        if let Some(params) = value.get_mut("params").and_then(|p| p.as_object_mut()) {
            params.remove("stream");
        }
        Ok(value.to_string())
    }

    /// Stable content id for the sqlite cache row.
    pub fn content_id(&self) -> Result<Uuid> {
        Ok(Uuid::new_v5(
            &Uuid::NAMESPACE_DNS,
            self.cache_key()?.as_bytes(),
        ))
    }
}
