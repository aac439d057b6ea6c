//! # ycd-plans
//!
//! Plan catalog, usage evaluation, and batch result projection for YCD.
//!
//! This crate provides:
//! - [`PlanCatalog`] - The free/pro/premium tiers and their limits
//! - [`Limit`] - A quota that is either finite or unlimited
//! - [`SubscriptionStatus`] - A user's usage snapshot, normalized at ingestion
//! - [`UsageEvaluator`] - Remaining quota, progress, and limit warnings
//! - [`BatchCellView`] - What a batch result cell shows for each item
//!
//! ## Example
//!
//! ```no_run
//! use chrono::Utc;
//! use ycd_plans::{PlanCatalog, SubscriptionStatus, UsageEvaluator};
//!
//! fn main() -> ycd_plans::Result<()> {
//!     let status = SubscriptionStatus::load("subscription.json")?;
//!     let evaluator = UsageEvaluator::new(PlanCatalog::builtin());
//!     let report = evaluator.evaluate(&status, Utc::now().date_naive());
//!
//!     for row in &report.resources {
//!         println!("{}: {} ({}%)", row.kind.display_name(), row.usage_label(), row.percent);
//!     }
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod catalog;
pub mod error;
pub mod limit;
pub mod resource;
pub mod status;
pub mod usage;

pub use batch::{
    BatchCellView, BatchJobItem, BatchStatus, BatchSummary, CellLimits, DownloadLink, LinkKind,
    format_file_size, load_batch, parse_batch, truncate_text,
};
pub use catalog::{Plan, PlanCatalog, PlanTier, TierId};
pub use error::{PlanError, Result};
pub use limit::Limit;
pub use resource::ResourceKind;
pub use status::{ConsistencyIssue, SubscriptionStatus};
pub use usage::{
    ExpiryInfo, ProgressTone, ResourceUsage, UsageEvaluator, UsageReport, is_nearing_limit,
    progress_color_class, progress_percent,
};
