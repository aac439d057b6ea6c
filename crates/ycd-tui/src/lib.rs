//! Terminal UI for YCD subscriptions.
//!
//! This crate provides the Ratatui widgets that present plan and usage data,
//! plain-text renderings of the same for the CLI, and the live dashboard.
//!
//! ## Widgets
//!
//! - [`SubscriptionBanner`] - Plan badge, limit warnings and upgrade prompt
//! - [`SubscriptionStatusCard`] - Usage bar per resource kind and expiry
//! - [`SubscriptionPlanCard`] - Price, limits and features of one plan
//! - [`BatchResultCell`] - One batch item's status or download links
//!
//! ## Hotkeys
//!
//! - `u` - Upgrade
//! - `p` - Compare plans
//! - `r` - Reload snapshots
//! - `Tab` - Switch focused panel
//! - `?` or `h` - Help
//! - `Esc` - Close overlay
//! - `q` - Quit

pub mod app;
pub mod banner;
pub mod batch_cell;
pub mod event;
pub mod plan_card;
pub mod status_card;
pub mod text;
pub mod theme;
pub mod watcher;

pub use app::{App, Panel, UpgradeCallback};
pub use banner::SubscriptionBanner;
pub use batch_cell::{BatchResultCell, BatchResultsTable};
pub use event::{AppEvent, InputHandler};
pub use plan_card::{PlanComparison, SubscriptionPlanCard};
pub use status_card::SubscriptionStatusCard;
pub use watcher::{SnapshotEvent, SnapshotKind, SnapshotWatcher, SnapshotWatcherConfig, WatcherError};
