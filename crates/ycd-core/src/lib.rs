//! # ycd-core
//!
//! Core errors, logging, and configuration for YCD.
//!
//! This crate provides:
//! - [`YcdError`] - Error types surfaced by the CLI and dashboard
//! - [`logging`] - Tracing setup and log directory helpers
//! - [`config`] - `~/.ycd/config.yaml` loading
//!
//! ## Example
//!
//! ```no_run
//! use ycd_core::{AppConfig, logging};
//!
//! fn main() -> ycd_core::Result<()> {
//!     let _guard = logging::init_logging(None, false, true)?;
//!     let config = AppConfig::load_default()?;
//!     tracing::info!(status_file = ?config.status_file, "configuration ready");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::AppConfig;
pub use error::{Result, YcdError};
pub use logging::{LogGuard, init_logging};
