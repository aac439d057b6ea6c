//! Logging infrastructure for YCD.
//!
//! Structured logging using the `tracing` ecosystem.
//!
//! ## Features
//!
//! - JSON lines format for machine parsing
//! - File output to `~/.ycd/logs/ycd.log`
//! - Console output with configurable verbosity
//!
//! ## Example
//!
//! ```no_run
//! use ycd_core::logging;
//!
//! let _guard = logging::init_logging(None, false, true).expect("logging init");
//!
//! tracing::info!("YCD started");
//! tracing::debug!(tier = "pro", "evaluating usage");
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::error::{Result, YcdError};

/// Guard that must be held to ensure log flushing on shutdown.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the YCD logging system.
///
/// This sets up:
/// - File logging to `~/.ycd/logs/ycd.log` (JSON lines format)
/// - Console logging to stderr (human-readable format), when `console` is set
///
/// # Arguments
///
/// * `log_dir` - Optional custom log directory. Defaults to `~/.ycd/logs/`
/// * `verbose` - If true, sets log level to DEBUG. Otherwise uses INFO.
/// * `console` - Also log to stderr. Off while the dashboard owns the terminal.
///
/// The returned [`LogGuard`] must be held for the application lifetime.
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool, console: bool) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };

    std::fs::create_dir_all(&log_dir).map_err(|e| YcdError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "ycd.log");
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "ycd={default_level},ycd_core={default_level},ycd_plans={default_level},ycd_tui={default_level}"
        ))
    });

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(true);

    let console_layer = console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_file(verbose)
            .with_line_number(verbose)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::debug!(log_dir = %log_dir.display(), verbose, console, "logging initialized");

    Ok(LogGuard {
        _file_guard: Some(file_guard),
    })
}

/// Initialize minimal console-only logging for tests.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Base directory for YCD state: `~/.ycd/`.
pub fn ycd_home() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| YcdError::Internal {
        message: "home directory could not be determined".into(),
    })?;

    Ok(home.join(".ycd"))
}

/// Get the default log directory path (`~/.ycd/logs/`).
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(ycd_home()?.join("logs"))
}

/// Convenience macro for logging subscription data-integrity findings.
///
/// # Example
///
/// ```ignore
/// log_integrity_warning!("unknown_tier", tier = "gold");
/// ```
#[macro_export]
macro_rules! log_integrity_warning {
    ($kind:expr) => {
        tracing::warn!(
            target: "ycd::integrity",
            kind = $kind,
            "subscription data integrity warning"
        )
    };
    ($kind:expr, $($field:tt)*) => {
        tracing::warn!(
            target: "ycd::integrity",
            kind = $kind,
            $($field)*,
            "subscription data integrity warning"
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_default_log_dir() {
        // SAFETY: serialized with every other test that touches HOME
        unsafe { std::env::set_var("HOME", "/tmp/test-home") };
        let dir = default_log_dir().unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/test-home/.ycd/logs"));
    }

    #[test]
    #[serial]
    fn test_ycd_home() {
        // SAFETY: serialized with every other test that touches HOME
        unsafe { std::env::set_var("HOME", "/tmp/test-home") };
        assert_eq!(ycd_home().unwrap(), PathBuf::from("/tmp/test-home/.ycd"));
    }

    #[test]
    fn test_init_test_logging() {
        init_test_logging();
        log_integrity_warning!("unit_test", detail = "ok");
    }
}
