//! Application configuration loaded from `~/.ycd/config.yaml`.
//!
//! Every field is optional. A missing file yields [`AppConfig::default`];
//! a present but malformed file is an error so typos do not go unnoticed.
//!
//! ```yaml
//! plans_file: ~/.ycd/plans.yaml
//! status_file: /var/lib/ycd/subscription.json
//! batch_file: /var/lib/ycd/batch.json
//! title_max_len: 40
//! message_max_len: 60
//! debounce_ms: 50
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, YcdError};
use crate::logging::ycd_home;

/// Default truncation length for video titles in batch results.
pub const DEFAULT_TITLE_MAX_LEN: usize = 40;

/// Default truncation length for failure messages in batch results.
pub const DEFAULT_MESSAGE_MAX_LEN: usize = 60;

/// Shortest truncation length that leaves room for text before the "...".
pub const MIN_TRUNCATE_LEN: usize = 4;

/// Default debounce for snapshot file watching, in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 50;

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// YAML file overriding the built-in plan catalog
    pub plans_file: Option<PathBuf>,
    /// JSON subscription snapshot written by the subscription service
    pub status_file: Option<PathBuf>,
    /// JSON batch job snapshot written by the batch job service
    pub batch_file: Option<PathBuf>,
    /// Maximum characters of a video title shown in a batch row
    pub title_max_len: usize,
    /// Maximum characters of a failure message shown in a batch row
    pub message_max_len: usize,
    /// Debounce window for snapshot file changes
    pub debounce_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            plans_file: None,
            status_file: None,
            batch_file: None,
            title_max_len: DEFAULT_TITLE_MAX_LEN,
            message_max_len: DEFAULT_MESSAGE_MAX_LEN,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl AppConfig {
    /// Default config path (`~/.ycd/config.yaml`).
    pub fn default_path() -> Result<PathBuf> {
        Ok(ycd_home()?.join("config.yaml"))
    }

    /// Load configuration from the default path, falling back to defaults.
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                YcdError::ConfigNotFound {
                    path: path.to_path_buf(),
                    source: Some(e),
                }
            } else {
                YcdError::io("reading config", path, e)
            }
        })?;

        let config = Self::from_yaml(&content).map_err(|e| match e {
            YcdError::ConfigInvalid { message, .. } => YcdError::ConfigInvalid {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;

        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse configuration from YAML text and validate it.
    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file deserializes to unit, not a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(content).map_err(|e| YcdError::ConfigInvalid {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config.expand_paths())
    }

    /// Reject values that would make the display unusable.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("title_max_len", self.title_max_len),
            ("message_max_len", self.message_max_len),
        ] {
            if value < MIN_TRUNCATE_LEN {
                return Err(YcdError::ConfigValidation {
                    message: format!("{field} must be at least {MIN_TRUNCATE_LEN}, got {value}"),
                });
            }
        }
        Ok(())
    }

    fn expand_paths(mut self) -> Self {
        self.plans_file = self.plans_file.map(expand_tilde);
        self.status_file = self.status_file.map(expand_tilde);
        self.batch_file = self.batch_file.map(expand_tilde);
        self
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_tilde(path: PathBuf) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path,
        },
        Err(_) => path,
    }
}
