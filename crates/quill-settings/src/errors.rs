//! Settings loading errors.

/// Errors raised while loading or parsing settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file is not valid JSON or has the wrong shape.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenience alias for settings results.
pub type Result<T, E = SettingsError> = std::result::Result<T, E>;
