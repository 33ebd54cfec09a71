//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and implement
//! [`Default`] with production values. `#[serde(default)]` allows partial
//! JSON; missing fields take their defaults during deserialization.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root settings type.
///
/// Loaded from `~/.quill/settings.json` with defaults applied for missing
/// fields, then `QUILL_*` environment overrides on top.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuillSettings {
    /// Settings schema version.
    pub version: String,
    /// Model server defaults.
    pub server: ServerSettings,
    /// Response cache behavior.
    pub cache: CacheSettings,
    /// Call trace behavior.
    pub trace: TraceSettings,
    /// Prompt display appearance.
    pub display: DisplaySettings,
}

impl Default for QuillSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            server: ServerSettings::default(),
            cache: CacheSettings::default(),
            trace: TraceSettings::default(),
            display: DisplaySettings::default(),
        }
    }
}

impl QuillSettings {
    /// Correct invalid values in place instead of rejecting the file.
    pub fn validate(&mut self) {
        if self.server.workers == 0 {
            tracing::warn!("server.workers must be at least 1, corrected");
            self.server.workers = 1;
        }
        if self.server.timeout_secs == 0 {
            tracing::warn!("server.timeoutSecs must be at least 1, corrected");
            self.server.timeout_secs = ServerSettings::default().timeout_secs;
        }
    }
}

/// Model server defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Server used when a call names none.
    pub default_server: String,
    /// Model identity passed to the default server.
    pub default_model: String,
    /// Concurrent model calls allowed in flight.
    pub workers: usize,
    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            default_server: "mock".to_string(),
            default_model: "quill-small".to_string(),
            workers: 8,
            timeout_secs: 120,
        }
    }
}

/// Response cache behavior.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Whether lookups and inserts happen at all.
    pub enabled: bool,
    /// Sqlite database path; `None` keeps the cache in memory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Entries kept before the oldest are evicted.
    pub max_entries: u64,
    /// Seconds an entry stays valid; 0 disables expiry.
    pub ttl_secs: u64,
    /// Cache non-deterministic calls too. Off by default: only
    /// temperature-zero responses are replayable.
    pub allow_nonzero_temperature: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            max_entries: 100_000,
            ttl_secs: 0,
            allow_nonzero_temperature: false,
        }
    }
}

/// Call trace behavior.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TraceSettings {
    /// Record call/response events.
    pub enabled: bool,
    /// Replay only when prompt and call identity both match; relaxed
    /// matching falls back to the prompt alone.
    pub strict_match: bool,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            strict_match: true,
        }
    }
}

/// Prompt display appearance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplaySettings {
    /// ANSI color name per role, used when pretty-printing conversations.
    pub system_color: String,
    /// User role color.
    pub user_color: String,
    /// Assistant role color.
    pub assistant_color: String,
    /// Tool role color.
    pub tool_color: String,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            system_color: "red".to_string(),
            user_color: "green".to_string(),
            assistant_color: "cyan".to_string(),
            tool_color: "magenta".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let s: QuillSettings =
            serde_json::from_str(r#"{"server":{"workers":2}}"#).unwrap();
        assert_eq!(s.server.workers, 2);
        assert_eq!(s.server.default_model, "quill-small");
        assert!(s.cache.enabled);
    }

    #[test]
    fn validate_corrects_zero_workers() {
        let mut s = QuillSettings::default();
        s.server.workers = 0;
        s.validate();
        assert_eq!(s.server.workers, 1);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_string(&QuillSettings::default()).unwrap();
        assert!(json.contains("defaultModel"));
        assert!(json.contains("strictMatch"));
    }
}
