//! Error types for the plan and usage model.

use thiserror::Error;

/// Plan and usage errors.
///
/// Display-side evaluation never returns these; they come from loading
/// catalogs and snapshots, and from billing lookups that refuse to guess.
#[derive(Error, Debug)]
pub enum PlanError {
    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO error (file reading)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tier id that is not in the catalog
    #[error("unknown subscription tier: {tier}")]
    UnknownTier {
        /// Raw tier id as received
        tier: String,
    },

    /// Snapshot document has the wrong overall shape
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// Catalog file parsed but violates catalog rules
    #[error("invalid plan catalog: {0}")]
    InvalidCatalog(String),
}

impl PlanError {
    /// Create a user-friendly message for this error.
    pub fn friendly_message(&self) -> String {
        match self {
            PlanError::UnknownTier { tier } => {
                format!("Subscription tier '{}' is not recognised; limits cannot be computed.", tier)
            }
            PlanError::Io(e) => {
                let msg = e.to_string().to_lowercase();
                if msg.contains("permission") {
                    "Permission denied. Check file permissions.".to_string()
                } else if msg.contains("not found") || e.kind() == std::io::ErrorKind::NotFound {
                    "File or directory not found.".to_string()
                } else {
                    format!("File system error: {}", e)
                }
            }
            _ => format!("Error: {}", self),
        }
    }
}

/// Result type for plan and usage operations.
pub type Result<T> = std::result::Result<T, PlanError>;
