//! # quill-settings
//!
//! Configuration management with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`QuillSettings::default()`]
//! 2. **User file**: `~/.quill/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `QUILL_*` overrides (highest priority)
//!
//! The global singleton is reloadable: [`reload_settings_from_path`] swaps
//! the cached value so all subsequent [`get_settings`] calls return fresh
//! data.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

use std::path::Path;
use std::sync::{Arc, RwLock};

/// Global settings singleton.
///
/// `RwLock<Option<Arc<QuillSettings>>>` rather than `OnceLock` so the
/// cached value can be swapped on reload. Reads are a shared lock plus an
/// `Arc::clone`.
static SETTINGS: RwLock<Option<Arc<QuillSettings>>> = RwLock::new(None);

/// Get the global settings instance.
///
/// First call loads from `~/.quill/settings.json` with env overrides;
/// later calls return the cached value. A load failure falls back to
/// compiled defaults.
pub fn get_settings() -> Arc<QuillSettings> {
    {
        let guard = SETTINGS.read().expect("settings lock poisoned");
        if let Some(ref s) = *guard {
            return Arc::clone(s);
        }
    }

    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    // Another thread may have initialized between the locks.
    if let Some(ref s) = *guard {
        return Arc::clone(s);
    }

    let settings = Arc::new(match load_settings() {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load settings, using defaults");
            QuillSettings::default()
        }
    });
    *guard = Some(Arc::clone(&settings));
    settings
}

/// Initialize the global settings with a specific value.
///
/// Replaces any previously cached settings. Useful for tests and for
/// embedders that assemble settings themselves.
pub fn init_settings(settings: QuillSettings) {
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = Some(Arc::new(settings));
}

/// Reload settings from a specific file path and swap the global cache.
pub fn reload_settings_from_path(path: &Path) {
    let new = Arc::new(match load_settings_from_path(path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, ?path, "failed to reload settings, falling back to defaults");
            QuillSettings::default()
        }
    });
    let mut guard = SETTINGS.write().expect("settings lock poisoned");
    *guard = Some(new);
    tracing::info!(?path, "settings reloaded from disk");
}
