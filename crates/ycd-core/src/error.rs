//! Error types for YCD operations.
//!
//! [`YcdError`] covers the failures that can reach the user from the CLI and
//! dashboard: configuration, file access, snapshot parsing, and terminal setup.
//! Display-layer tolerance (missing usage, unknown tiers) never produces one of
//! these; those cases degrade the render instead.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`YcdError`].
pub type Result<T> = std::result::Result<T, YcdError>;

/// Error type for YCD operations.
#[derive(Debug, Error)]
pub enum YcdError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file not found
    #[error("Configuration not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration file is invalid YAML
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error with context
    #[error("I/O error {operation}: {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Directory creation failed
    #[error("Failed to create directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Data Errors
    // =========================================================================
    /// A value could not be serialized for output
    #[error("Failed to serialize {context}: {source}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot file could not be turned into a subscription or batch record
    #[error("Invalid snapshot file {path}: {message}")]
    SnapshotParse { path: PathBuf, message: String },

    // =========================================================================
    // File Watching Errors
    // =========================================================================
    /// File watcher initialization failed
    #[error("Failed to initialize file watcher: {message}")]
    WatcherInit { message: String },

    // =========================================================================
    // TUI Errors
    // =========================================================================
    /// Terminal initialization failed
    #[error("Terminal initialization failed: {message}")]
    TerminalInit { message: String },

    /// Terminal I/O failed while the dashboard was running
    #[error("Terminal I/O error while {operation}")]
    Terminal {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error (bug in YCD)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl YcdError {
    /// Create a ConfigNotFound error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Create a terminal I/O error
    pub fn terminal(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Terminal {
            operation: operation.into(),
            source,
        }
    }

    /// Create a snapshot parse error
    pub fn snapshot_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::SnapshotParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. } | Self::ConfigInvalid { .. } | Self::ConfigValidation { .. }
        )
    }

    /// Returns actionable guidance for the user
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound { .. } => Some("Create ~/.ycd/config.yaml or pass --config"),
            Self::ConfigInvalid { .. } => Some("Check YAML syntax in the configuration file"),
            Self::FileNotFound { .. } => {
                Some("Point status_file/batch_file in ~/.ycd/config.yaml at an existing file")
            }
            Self::SnapshotParse { .. } => {
                Some("Snapshot files must be JSON written by the subscription or batch service")
            }
            Self::TerminalInit { .. } => Some("Try running in a different terminal"),
            _ => None,
        }
    }
}
