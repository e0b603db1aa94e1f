//! Error types for fromscratch-core operations.

use std::path::PathBuf;

/// All errors that can occur in the lifecycle core.
///
/// Which of these are fatal depends on the path they occur on: the
/// coordinator contains and logs errors from state restore and the update
/// check, and returns errors from content writes and window creation.
#[derive(Debug, thiserror::Error)]
pub enum ScratchError {
    // ─────────────────────────────────────────────────────────────────────
    // Location Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Current directory unavailable: {source}")]
    CurrentDirUnavailable {
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Content write failed: {path}: {source}")]
    ContentWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Host Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Window creation failed: {0}")]
    WindowCreation(String),

    #[error("Window operation failed: {operation}: {details}")]
    WindowOperation {
        operation: &'static str,
        details: String,
    },

    #[error("Shortcut registration failed: {accelerator}: {details}")]
    ShortcutRegistration {
        accelerator: String,
        details: String,
    },

    #[error("Core channel closed: {0}")]
    ChannelClosed(&'static str),

    // ─────────────────────────────────────────────────────────────────────
    // Update Check Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Update request failed: {url}: {details}")]
    UpdateTransport { url: String, details: String },

    #[error("Update response malformed: {source}")]
    UpdateMalformed {
        #[source]
        source: serde_json::Error,
    },
}

impl ScratchError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ScratchError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        ScratchError::Json {
            context: context.into(),
            source,
        }
    }

    pub fn window(operation: &'static str, details: impl ToString) -> Self {
        ScratchError::WindowOperation {
            operation,
            details: details.to_string(),
        }
    }
}

/// Convenience type alias for Results using ScratchError.
pub type Result<T> = std::result::Result<T, ScratchError>;

// Shell commands hand errors to the UI as strings.
impl From<ScratchError> for String {
    fn from(err: ScratchError) -> String {
        err.to_string()
    }
}
