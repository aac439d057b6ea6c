//! Usage evaluation: remaining quota, progress, and limit warnings.
//!
//! Everything here is a pure function of its inputs. The dashboard calls it
//! on every render with whatever snapshot is current, so nothing is cached
//! between calls.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{PlanCatalog, PlanTier, TierId};
use crate::limit::Limit;
use crate::resource::ResourceKind;
use crate::status::SubscriptionStatus;

/// Absolute buffer below which a finite quota is "nearing" its limit.
pub const NEARING_LIMIT_MIN_BUFFER: f64 = 3.0;

/// Proportional buffer below which a finite quota is "nearing" its limit.
pub const NEARING_LIMIT_RATIO: f64 = 0.1;

/// Percent above which a progress bar turns to warning.
pub const WARNING_THRESHOLD_PCT: u8 = 70;

/// Percent above which a progress bar turns to danger.
pub const DANGER_THRESHOLD_PCT: u8 = 90;

/// Days before expiry at which the subscription counts as expiring soon.
pub const EXPIRY_WARNING_DAYS: i64 = 7;

/// Whether remaining quota is low enough to warn about.
///
/// Remaining must be at most `max(3, limit * 10%)`: small plans get a fixed
/// buffer of three, large plans a proportional one. Unlimited never warns.
pub fn is_nearing_limit(used: u64, limit: Limit) -> bool {
    match limit {
        Limit::Unlimited => false,
        Limit::Finite(cap) => {
            let remaining = cap as f64 - used as f64;
            let threshold = NEARING_LIMIT_MIN_BUFFER.max(cap as f64 * NEARING_LIMIT_RATIO);
            remaining <= threshold
        }
    }
}

/// Percent of a finite limit consumed, rounded and clamped to `0..=100`.
///
/// Unlimited and zero limits report 0.
pub fn progress_percent(used: u64, limit: Limit) -> u8 {
    match limit {
        Limit::Finite(cap) if cap > 0 => {
            let pct = (used as f64 / cap as f64 * 100.0).round();
            pct.clamp(0.0, 100.0) as u8
        }
        _ => 0,
    }
}

/// Severity bucket for a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressTone {
    /// Plenty left
    Ok,
    /// Getting close
    Warning,
    /// Nearly or fully used
    Danger,
}

impl ProgressTone {
    /// Bucket a percentage. Thresholds are strict: 90 is warning, 70 is ok.
    pub fn from_percent(percent: u8) -> Self {
        if percent > DANGER_THRESHOLD_PCT {
            ProgressTone::Danger
        } else if percent > WARNING_THRESHOLD_PCT {
            ProgressTone::Warning
        } else {
            ProgressTone::Ok
        }
    }

    /// Class name used by the web front-end for this bucket.
    pub fn class_name(&self) -> &'static str {
        match self {
            ProgressTone::Ok => "ok",
            ProgressTone::Warning => "warning",
            ProgressTone::Danger => "danger",
        }
    }
}

/// Colour bucket for a percentage. See [`ProgressTone::from_percent`].
pub fn progress_color_class(percent: u8) -> ProgressTone {
    ProgressTone::from_percent(percent)
}

/// Derived view of one resource in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceUsage {
    /// Resource kind
    pub kind: ResourceKind,
    /// Units consumed this period
    pub used: u64,
    /// Cap for the period
    pub limit: Limit,
    /// What is left
    pub remaining: Limit,
    /// Percent consumed (0 for unlimited)
    pub percent: u8,
    /// Progress bar bucket
    pub tone: ProgressTone,
    /// Remaining quota is low
    pub nearing_limit: bool,
    /// Finite quota fully used
    pub exhausted: bool,
}

impl ResourceUsage {
    /// Evaluate one resource of a snapshot.
    pub fn evaluate(status: &SubscriptionStatus, kind: ResourceKind) -> Self {
        let used = status.used(kind);
        let limit = status.limit(kind);
        let percent = progress_percent(used, limit);

        Self {
            kind,
            used,
            limit,
            remaining: status.remaining(kind),
            percent,
            tone: progress_color_class(percent),
            nearing_limit: is_nearing_limit(used, limit),
            exhausted: limit.is_exhausted_by(used),
        }
    }

    /// "used/limit" label, e.g. "18/20" or "42/∞".
    pub fn usage_label(&self) -> String {
        format!("{}/{}", self.used, self.limit.compact())
    }
}

/// Expiry information relative to a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExpiryInfo {
    /// Date the subscription period ends
    pub date: NaiveDate,
    /// Whole days from `today` to `date` (negative once past)
    pub days_remaining: i64,
}

impl ExpiryInfo {
    /// Compute expiry information for a date as seen on `today`.
    pub fn new(date: NaiveDate, today: NaiveDate) -> Self {
        Self {
            date,
            days_remaining: (date - today).num_days(),
        }
    }

    /// The period has ended.
    pub fn is_expired(&self) -> bool {
        self.days_remaining < 0
    }

    /// Ends within [`EXPIRY_WARNING_DAYS`].
    pub fn expires_soon(&self) -> bool {
        !self.is_expired() && self.days_remaining <= EXPIRY_WARNING_DAYS
    }

    /// Human label, e.g. "Renews in 5 days" or "Expired 2 days ago".
    pub fn label(&self) -> String {
        match self.days_remaining {
            d if d < -1 => format!("Expired {} days ago", -d),
            -1 => "Expired yesterday".to_string(),
            0 => "Expires today".to_string(),
            1 => "Expires tomorrow".to_string(),
            d => format!("Expires in {} days", d),
        }
    }
}

/// Everything the widgets need from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    /// Tier as received
    pub tier: TierId,
    /// Display plan name (free plan's name for unknown tiers)
    pub plan_name: String,
    /// One row per resource kind, in display order
    pub resources: Vec<ResourceUsage>,
    /// Expiry, if the snapshot carries a date
    pub expiry: Option<ExpiryInfo>,
}

impl UsageReport {
    /// Row for a resource kind.
    pub fn resource(&self, kind: ResourceKind) -> Option<&ResourceUsage> {
        self.resources.iter().find(|r| r.kind == kind)
    }

    /// Tier to style with. Unknown tiers style as free.
    pub fn display_tier(&self) -> PlanTier {
        self.tier.tier().unwrap_or(PlanTier::Free)
    }

    /// Resources whose remaining quota is low.
    pub fn nearing(&self) -> impl Iterator<Item = &ResourceUsage> {
        self.resources.iter().filter(|r| r.nearing_limit)
    }

    /// Any resource is nearing its limit.
    pub fn any_nearing_limit(&self) -> bool {
        self.resources.iter().any(|r| r.nearing_limit)
    }

    /// Any resource is fully used.
    pub fn any_exhausted(&self) -> bool {
        self.resources.iter().any(|r| r.exhausted)
    }

    /// Whether the banner should offer an upgrade.
    pub fn should_prompt_upgrade(&self) -> bool {
        if matches!(self.tier.tier(), Some(PlanTier::Premium)) {
            return false;
        }
        self.tier.tier() == Some(PlanTier::Free) || self.any_nearing_limit() || self.any_exhausted()
    }
}

/// Evaluates subscription snapshots against the plan catalog.
#[derive(Debug, Clone, Default)]
pub struct UsageEvaluator {
    catalog: PlanCatalog,
}

impl UsageEvaluator {
    /// Create an evaluator over a catalog.
    pub fn new(catalog: PlanCatalog) -> Self {
        Self { catalog }
    }

    /// The catalog in use.
    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// Evaluate a snapshot as of `today`.
    ///
    /// Never fails and has no side effects, so it is safe to call on every
    /// redraw. An unknown tier keeps its raw id in the report so callers can
    /// tell it from a real free user.
    pub fn evaluate(&self, status: &SubscriptionStatus, today: NaiveDate) -> UsageReport {
        let plan = self.catalog.plan_for_display(status.tier.as_str());
        let resources = ResourceKind::ALL
            .iter()
            .map(|kind| ResourceUsage::evaluate(status, *kind))
            .collect();
        let expiry = status.expiry_date.map(|date| ExpiryInfo::new(date, today));

        debug!(tier = %status.tier, "evaluated subscription usage");

        UsageReport {
            tier: status.tier.clone(),
            plan_name: plan.name.clone(),
            resources,
            expiry,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_nearing_limit_small_plan() {
        // remaining 2, threshold max(3, 2) = 3
        assert!(is_nearing_limit(18, Limit::Finite(20)));
        assert!(is_nearing_limit(17, Limit::Finite(20)));
        assert!(!is_nearing_limit(16, Limit::Finite(20)));
    }

    #[test]
    fn test_nearing_limit_large_plan() {
        assert!(!is_nearing_limit(50, Limit::Finite(100)));
        assert!(is_nearing_limit(90, Limit::Finite(100)));
        assert!(!is_nearing_limit(89, Limit::Finite(100)));
    }

    #[test]
    fn test_nearing_limit_over_quota_and_zero() {
        assert!(is_nearing_limit(25, Limit::Finite(20)));
        assert!(is_nearing_limit(0, Limit::Finite(0)));
    }

    #[test]
    fn test_unlimited_never_warns() {
        for used in [0, 1, 1_000, u64::MAX] {
            assert!(!is_nearing_limit(used, Limit::Unlimited));
            assert_eq!(progress_percent(used, Limit::Unlimited), 0);
        }
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0, Limit::Finite(0)), 0);
        assert_eq!(progress_percent(1, Limit::Finite(3)), 33);
        assert_eq!(progress_percent(2, Limit::Finite(3)), 67);
        assert_eq!(progress_percent(250, Limit::Finite(100)), 100);
        assert_eq!(progress_percent(90, Limit::Finite(100)), 90);
    }

    #[test]
    fn test_progress_percent_is_bounded_and_pure() {
        for cap in [1u64, 7, 20, 100, 1_000] {
            for used in [0u64, 1, cap / 2, cap, cap * 3] {
                let first = progress_percent(used, Limit::Finite(cap));
                assert!(first <= 100);
                assert_eq!(first, progress_percent(used, Limit::Finite(cap)));
            }
        }
    }

    #[test]
    fn test_tone_boundaries() {
        assert_eq!(progress_color_class(progress_percent(90, Limit::Finite(100))), ProgressTone::Warning);
        assert_eq!(progress_color_class(progress_percent(91, Limit::Finite(100))), ProgressTone::Danger);
        assert_eq!(progress_color_class(progress_percent(70, Limit::Finite(100))), ProgressTone::Ok);
        assert_eq!(progress_color_class(progress_percent(71, Limit::Finite(100))), ProgressTone::Warning);
        assert_eq!(ProgressTone::Danger.class_name(), "danger");
    }

    #[test]
    fn test_expiry_labels() {
        let today = day(2026, 3, 10);
        assert_eq!(ExpiryInfo::new(day(2026, 3, 15), today).label(), "Expires in 5 days");
        assert_eq!(ExpiryInfo::new(day(2026, 3, 10), today).label(), "Expires today");
        assert_eq!(ExpiryInfo::new(day(2026, 3, 9), today).label(), "Expired yesterday");
        assert!(ExpiryInfo::new(day(2026, 3, 8), today).is_expired());
        assert!(ExpiryInfo::new(day(2026, 3, 17), today).expires_soon());
        assert!(!ExpiryInfo::new(day(2026, 3, 18), today).expires_soon());
    }

    fn status(tier: &str, usage: &[(ResourceKind, u64)]) -> SubscriptionStatus {
        let catalog = PlanCatalog::builtin();
        let tier_id = TierId::from(tier);
        let plan = catalog.plan_for_display(tier);
        let usage: BTreeMap<_, _> = usage.iter().copied().collect();
        let limits: BTreeMap<_, _> = usage.keys().map(|k| (*k, plan.limit(*k))).collect();
        let remaining = usage
            .iter()
            .map(|(k, used)| (*k, plan.limit(*k).remaining_after(*used)))
            .collect();
        SubscriptionStatus {
            tier: tier_id,
            usage,
            limits,
            remaining,
            expiry_date: None,
        }
    }

    #[test]
    fn test_evaluate_report() {
        let evaluator = UsageEvaluator::default();
        let snapshot = status(
            "pro",
            &[
                (ResourceKind::CleanTranscripts, 95),
                (ResourceKind::VideoDownloads, 2),
            ],
        );
        let report = evaluator.evaluate(&snapshot, day(2026, 1, 1));

        assert_eq!(report.plan_name, "Pro");
        assert_eq!(report.resources.len(), ResourceKind::ALL.len());

        let clean = report.resource(ResourceKind::CleanTranscripts).unwrap();
        assert_eq!(clean.percent, 95);
        assert_eq!(clean.tone, ProgressTone::Danger);
        assert!(clean.nearing_limit);
        assert_eq!(clean.remaining, Limit::Finite(5));
        assert_eq!(clean.usage_label(), "95/100");

        // Missing from the snapshot: no usage, no cap
        let audio = report.resource(ResourceKind::AudioDownloads).unwrap();
        assert_eq!(audio.used, 0);
        assert_eq!(audio.limit, Limit::Unlimited);
        assert!(!audio.nearing_limit);

        assert!(report.should_prompt_upgrade());
    }

    #[test]
    fn test_unknown_tier_is_distinct_from_free() {
        let evaluator = UsageEvaluator::default();
        let report = evaluator.evaluate(&status("gold", &[]), day(2026, 1, 1));

        assert!(!report.tier.is_known());
        assert_eq!(report.display_tier(), PlanTier::Free);
        assert_eq!(report.plan_name, "Free");
        assert!(!report.should_prompt_upgrade());
    }

    #[test]
    fn test_premium_never_prompts() {
        let evaluator = UsageEvaluator::default();
        let report = evaluator.evaluate(
            &status("premium", &[(ResourceKind::VideoDownloads, 10_000)]),
            day(2026, 1, 1),
        );
        assert!(!report.any_nearing_limit());
        assert!(!report.should_prompt_upgrade());
    }
}
