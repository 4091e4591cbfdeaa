use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("Could not find home directory")]
    NoHomeDir,

    #[error("Could not save preferences to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize preferences: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The value read back after a save differs from what was written.
    #[error("Failed to save preferred location. Expected: {expected:?}, Got: {actual:?}")]
    Verification {
        expected: Option<String>,
        actual: Option<String>,
    },
}

impl PrefsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PrefsError::Io {
            path: path.into(),
            source,
        }
    }
}
