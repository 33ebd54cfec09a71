//! Settings loading: file, deep merge, env overrides.

use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::types::QuillSettings;

/// Default settings file location: `~/.quill/settings.json`.
#[must_use]
pub fn settings_path() -> PathBuf {
    let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
    home.join(".quill").join("settings.json")
}

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key; any other value in the overlay replaces the
/// base value wholesale.
pub fn deep_merge(base: &mut serde_json::Value, overlay: serde_json::Value) {
    match (base, overlay) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base_slot, overlay_value) => *base_slot = overlay_value,
    }
}

/// Load settings from the default path.
pub fn load_settings() -> Result<QuillSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from `path`, deep-merged over compiled defaults, with
/// `QUILL_*` env overrides applied last. A missing file is not an error.
pub fn load_settings_from_path(path: &Path) -> Result<QuillSettings> {
    let mut merged = serde_json::to_value(QuillSettings::default())?;
    if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        let overlay: serde_json::Value = serde_json::from_str(&raw)?;
        deep_merge(&mut merged, overlay);
    }
    apply_env_overrides(&mut merged);
    let mut settings: QuillSettings = serde_json::from_value(merged)?;
    settings.validate();
    Ok(settings)
}

fn apply_env_overrides(merged: &mut serde_json::Value) {
    let overrides: [(&str, &[&str], fn(&str) -> Option<serde_json::Value>); 6] = [
        ("QUILL_DEFAULT_SERVER", &["server", "defaultServer"], |v| {
            Some(serde_json::Value::String(v.to_string()))
        }),
        ("QUILL_DEFAULT_MODEL", &["server", "defaultModel"], |v| {
            Some(serde_json::Value::String(v.to_string()))
        }),
        ("QUILL_WORKERS", &["server", "workers"], parse_number),
        ("QUILL_TIMEOUT_SECS", &["server", "timeoutSecs"], parse_number),
        ("QUILL_CACHE_PATH", &["cache", "path"], |v| {
            Some(serde_json::Value::String(v.to_string()))
        }),
        ("QUILL_TRACE_STRICT", &["trace", "strictMatch"], parse_bool),
    ];

    for (var, path, parse) in overrides {
        let Ok(raw) = std::env::var(var) else {
            continue;
        };
        let Some(value) = parse(&raw) else {
            tracing::warn!(var, raw, "ignoring unparsable env override");
            continue;
        };
        set_path(merged, path, value);
    }
}

fn parse_number(raw: &str) -> Option<serde_json::Value> {
    raw.parse::<u64>().map(serde_json::Value::from).ok()
}

fn parse_bool(raw: &str) -> Option<serde_json::Value> {
    match raw {
        "1" | "true" | "yes" => Some(serde_json::Value::Bool(true)),
        "0" | "false" | "no" => Some(serde_json::Value::Bool(false)),
        _ => None,
    }
}

fn set_path(root: &mut serde_json::Value, path: &[&str], value: serde_json::Value) {
    let mut slot = root;
    for key in &path[..path.len() - 1] {
        let Some(map) = slot.as_object_mut() else {
            // A malformed file may have replaced a section with a scalar.
            return;
        };
        slot = map
            .entry((*key).to_string())
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
    }
    if let Some(map) = slot.as_object_mut() {
        map.insert(path[path.len() - 1].to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_merge_replaces_scalars_and_merges_objects() {
        let mut base = serde_json::json!({
            "server": {"workers": 8, "defaultModel": "quill-small"},
            "version": "0.1.0"
        });
        deep_merge(
            &mut base,
            serde_json::json!({"server": {"workers": 2}, "version": "0.2.0"}),
        );
        assert_eq!(base["server"]["workers"], 2);
        assert_eq!(base["server"]["defaultModel"], "quill-small");
        assert_eq!(base["version"], "0.2.0");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from_path(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings.server.workers, 8);
    }

    #[test]
    fn file_values_merge_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"cache":{"ttlSecs":60}}"#).unwrap();
        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.cache.ttl_secs, 60);
        assert!(settings.cache.enabled);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_settings_from_path(&path).is_err());
    }
}
