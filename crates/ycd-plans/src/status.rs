//! Subscription snapshots and their ingestion from JSON.
//!
//! The subscription service writes a JSON object per user:
//!
//! ```json
//! {
//!   "tier": "pro",
//!   "usage":     { "clean_transcripts": 18, "audio_downloads": 4 },
//!   "limits":    { "clean_transcripts": 20, "audio_downloads": "unlimited" },
//!   "remaining": { "clean_transcripts": 2,  "audio_downloads": "unlimited" },
//!   "expiry_date": "2026-11-01"
//! }
//! ```
//!
//! Parsing is forgiving below the top level. Counts that are not
//! numbers read as zero, limits that cannot be understood read as unlimited,
//! unknown resource keys are skipped. Only a document that is not a JSON
//! object at all is rejected.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::catalog::TierId;
use crate::error::{PlanError, Result};
use crate::limit::Limit;
use crate::resource::ResourceKind;

/// A user's billing and usage snapshot.
///
/// Read-only once built: a refresh produces a new value rather than
/// mutating the old one.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SubscriptionStatus {
    /// Tier as received
    pub tier: TierId,
    /// Units consumed per resource this period
    pub usage: BTreeMap<ResourceKind, u64>,
    /// Cap per resource
    pub limits: BTreeMap<ResourceKind, Limit>,
    /// Quota left per resource
    pub remaining: BTreeMap<ResourceKind, Limit>,
    /// End of the current billing period
    pub expiry_date: Option<NaiveDate>,
}

/// Keys accepted for the tier, in order of preference.
const TIER_KEYS: &[&str] = &["tier", "plan", "subscription_tier"];

/// Keys accepted for the end of the billing period, in order of preference.
const EXPIRY_KEYS: &[&str] = &["expiry_date", "expiryDate", "expires_at"];

impl SubscriptionStatus {
    /// Empty snapshot for a tier.
    pub fn new(tier: impl Into<TierId>) -> Self {
        Self {
            tier: tier.into(),
            ..Default::default()
        }
    }

    /// Record usage of a resource with its limit; remaining is derived.
    pub fn with_usage(mut self, kind: ResourceKind, used: u64, limit: Limit) -> Self {
        self.usage.insert(kind, used);
        self.limits.insert(kind, limit);
        self.remaining.insert(kind, limit.remaining_after(used));
        self
    }

    /// Set the end of the billing period.
    pub fn with_expiry(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }

    /// Parse a snapshot from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    /// Normalize an already-parsed JSON document.
    ///
    /// When several alias keys are present the first in preference order
    /// wins. Integrity warnings for the snapshot are logged here, once per
    /// ingested document.
    pub fn from_value(value: Value) -> Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(PlanError::InvalidSnapshot(
                "subscription status must be a JSON object".to_string(),
            ));
        };

        let status = Self {
            tier: parse_tier(first_present(object, TIER_KEYS)),
            usage: parse_resource_map(first_present(object, &["usage"]), "usage", parse_count),
            limits: parse_resource_map(first_present(object, &["limits"]), "limits", parse_limit),
            remaining: parse_resource_map(
                first_present(object, &["remaining"]),
                "remaining",
                parse_limit,
            ),
            expiry_date: parse_date(first_present(object, EXPIRY_KEYS)),
        };
        status.report_integrity();
        Ok(status)
    }

    /// Load a snapshot file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Units used. Missing entries read as zero.
    pub fn used(&self, kind: ResourceKind) -> u64 {
        self.usage.get(&kind).copied().unwrap_or(0)
    }

    /// Cap for a resource. Missing entries read as unlimited.
    pub fn limit(&self, kind: ResourceKind) -> Limit {
        self.limits.get(&kind).copied().unwrap_or(Limit::Unlimited)
    }

    /// Quota left. Uses the reported value, or derives it when absent.
    pub fn remaining(&self, kind: ResourceKind) -> Limit {
        match self.remaining.get(&kind) {
            Some(limit) => *limit,
            None => self.limit(kind).remaining_after(self.used(kind)),
        }
    }

    fn report_integrity(&self) {
        if !self.tier.is_known() {
            ycd_core::log_integrity_warning!("unknown_tier", tier = %self.tier);
        }
        for issue in self.consistency_issues() {
            ycd_core::log_integrity_warning!("inconsistent_snapshot", detail = %issue);
        }
    }

    /// Invariant violations in this snapshot. Empty for a well-formed one.
    pub fn consistency_issues(&self) -> Vec<ConsistencyIssue> {
        let mut issues = Vec::new();

        for (kind, used) in &self.usage {
            let limit = self.limits.get(kind);
            let remaining = self.remaining.get(kind);

            if limit.is_none() {
                issues.push(ConsistencyIssue::MissingLimit(*kind));
            }
            if remaining.is_none() {
                issues.push(ConsistencyIssue::MissingRemaining(*kind));
            }
            if let (Some(limit), Some(actual)) = (limit, remaining) {
                let expected = limit.remaining_after(*used);
                if expected != *actual {
                    issues.push(ConsistencyIssue::RemainingMismatch {
                        kind: *kind,
                        expected,
                        actual: *actual,
                    });
                }
            }
        }

        issues
    }
}

/// A violation of the usage/limits/remaining invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyIssue {
    /// Usage reported without a limit
    MissingLimit(ResourceKind),
    /// Usage reported without a remaining value
    MissingRemaining(ResourceKind),
    /// Remaining does not equal limit minus usage
    RemainingMismatch {
        kind: ResourceKind,
        expected: Limit,
        actual: Limit,
    },
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyIssue::MissingLimit(kind) => write!(f, "{} has usage but no limit", kind),
            ConsistencyIssue::MissingRemaining(kind) => {
                write!(f, "{} has usage but no remaining value", kind)
            }
            ConsistencyIssue::RemainingMismatch {
                kind,
                expected,
                actual,
            } => write!(f, "{} remaining is {} but limit minus usage is {}", kind, actual, expected),
        }
    }
}

static NULL: Value = Value::Null;

/// Value of the first alias key that is present and not null.
fn first_present<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> &'a Value {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .find(|value| !value.is_null())
        .unwrap_or(&NULL)
}

fn parse_tier(value: &Value) -> TierId {
    match value {
        Value::String(s) => TierId::from(s.as_str()),
        Value::Null => TierId::default(),
        other => TierId::from(other.to_string()),
    }
}

fn parse_resource_map<T>(
    value: &Value,
    field: &str,
    parse: impl Fn(&Value) -> T,
) -> BTreeMap<ResourceKind, T> {
    let Some(object) = value.as_object() else {
        if !value.is_null() {
            debug!(field, "expected an object, treating as empty");
        }
        return BTreeMap::new();
    };

    object
        .iter()
        .filter_map(|(key, entry)| match ResourceKind::parse(key) {
            Some(kind) => Some((kind, parse(entry))),
            None => {
                debug!(field, key = key.as_str(), "ignoring unknown resource kind");
                None
            }
        })
        .collect()
}

fn parse_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_i64().map(|_| 0))
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f.round() as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

fn parse_limit(value: &Value) -> Limit {
    Limit::deserialize(value).unwrap_or_else(|e| {
        debug!(error = %e, "unreadable limit, treating as unlimited");
        Limit::Unlimited
    })
}

fn parse_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    match DateTime::parse_from_rfc3339(text) {
        Ok(datetime) => Some(datetime.date_naive()),
        Err(e) => {
            debug!(value = text, error = %e, "unreadable expiry date");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PlanTier;

    #[test]
    fn test_parse_well_formed_snapshot() {
        let status = SubscriptionStatus::from_json_str(
            r#"{
                "tier": "pro",
                "usage": {"clean_transcripts": 18, "audio_downloads": 4},
                "limits": {"clean_transcripts": 20, "audio_downloads": "unlimited"},
                "remaining": {"clean_transcripts": 2, "audio_downloads": "unlimited"},
                "expiry_date": "2026-11-01"
            }"#,
        )
        .unwrap();

        assert_eq!(status.tier.tier(), Some(PlanTier::Pro));
        assert_eq!(status.used(ResourceKind::CleanTranscripts), 18);
        assert_eq!(status.limit(ResourceKind::AudioDownloads), Limit::Unlimited);
        assert_eq!(status.remaining(ResourceKind::CleanTranscripts), Limit::Finite(2));
        assert_eq!(status.expiry_date, NaiveDate::from_ymd_opt(2026, 11, 1));
        assert!(status.consistency_issues().is_empty());
    }

    #[test]
    fn test_missing_maps_default() {
        let status = SubscriptionStatus::from_json_str(r#"{"tier": "free"}"#).unwrap();
        assert_eq!(status.used(ResourceKind::VideoDownloads), 0);
        assert_eq!(status.limit(ResourceKind::VideoDownloads), Limit::Unlimited);
        assert_eq!(status.remaining(ResourceKind::VideoDownloads), Limit::Unlimited);
        assert!(status.expiry_date.is_none());
    }

    #[test]
    fn test_malformed_entries_are_tolerated() {
        let status = SubscriptionStatus::from_json_str(
            r#"{
                "tier": 7,
                "usage": {"clean_transcripts": "abc", "video_downloads": -3, "podcasts": 9},
                "limits": {"clean_transcripts": [1, 2], "video_downloads": null},
                "remaining": "not a map",
                "expiry_date": "soon"
            }"#,
        )
        .unwrap();

        assert_eq!(status.tier, TierId::Unknown("7".to_string()));
        assert_eq!(status.used(ResourceKind::CleanTranscripts), 0);
        assert_eq!(status.used(ResourceKind::VideoDownloads), 0);
        assert_eq!(status.usage.len(), 2);
        assert_eq!(status.limit(ResourceKind::CleanTranscripts), Limit::Unlimited);
        assert_eq!(status.limit(ResourceKind::VideoDownloads), Limit::Unlimited);
        assert!(status.remaining.is_empty());
        assert!(status.expiry_date.is_none());
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        assert!(SubscriptionStatus::from_json_str("[1, 2, 3]").is_err());
        assert!(SubscriptionStatus::from_json_str("{").is_err());
    }

    #[test]
    fn test_rfc3339_expiry_and_aliases() {
        let status = SubscriptionStatus::from_json_str(
            r#"{"plan": "basic", "expires_at": "2026-12-31T23:59:59Z"}"#,
        )
        .unwrap();
        assert_eq!(status.tier.tier(), Some(PlanTier::Pro));
        assert_eq!(status.expiry_date, NaiveDate::from_ymd_opt(2026, 12, 31));
    }

    #[test]
    fn test_duplicate_alias_keys_take_first() {
        let status = SubscriptionStatus::from_json_str(
            r#"{
                "tier": "premium",
                "plan": "free",
                "expiry_date": "2026-11-01",
                "expires_at": "2027-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(status.tier.tier(), Some(PlanTier::Premium));
        assert_eq!(status.expiry_date, NaiveDate::from_ymd_opt(2026, 11, 1));

        let status =
            SubscriptionStatus::from_json_str(r#"{"tier": null, "plan": "pro", "subscription_tier": "free"}"#)
                .unwrap();
        assert_eq!(status.tier.tier(), Some(PlanTier::Pro));
    }

    #[test]
    fn test_remaining_derived_when_absent() {
        let mut status = SubscriptionStatus::new(PlanTier::Free).with_usage(
            ResourceKind::AudioDownloads,
            1,
            Limit::Finite(2),
        );
        status.remaining.clear();
        assert_eq!(status.remaining(ResourceKind::AudioDownloads), Limit::Finite(1));
    }

    #[test]
    fn test_consistency_issues() {
        let mut status = SubscriptionStatus::new(PlanTier::Pro)
            .with_usage(ResourceKind::CleanTranscripts, 18, Limit::Finite(20));
        status
            .remaining
            .insert(ResourceKind::CleanTranscripts, Limit::Finite(5));
        status.usage.insert(ResourceKind::VideoDownloads, 1);

        let issues = status.consistency_issues();
        assert_eq!(issues.len(), 3);
        assert!(issues.contains(&ConsistencyIssue::RemainingMismatch {
            kind: ResourceKind::CleanTranscripts,
            expected: Limit::Finite(2),
            actual: Limit::Finite(5),
        }));
        assert!(issues.contains(&ConsistencyIssue::MissingLimit(ResourceKind::VideoDownloads)));
        assert!(issues[0].to_string().contains("clean_transcripts"));
    }
}
