//! The plan catalog: the three subscription tiers and their limits.
//!
//! The built-in catalog mirrors what the pricing page sells. A YAML file can
//! replace it (prices and features change more often than code ships), but the
//! file must still describe exactly one plan per tier with a limit for every
//! resource kind.
//!
//! Lookups come in two flavours. [`PlanCatalog::plan_for_display`] never fails
//! and falls back to the free plan so an unexpected tier id still renders.
//! [`PlanCatalog::plan_for_billing`] refuses to guess and returns
//! [`PlanError::UnknownTier`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PlanError, Result};
use crate::limit::Limit;
use crate::resource::ResourceKind;

/// Subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Free tier
    Free,
    /// Paid individual tier (sold as "Basic" on older pages)
    #[serde(alias = "basic")]
    Pro,
    /// Top tier, unlimited everything
    Premium,
}

impl PlanTier {
    /// All tiers from cheapest to most expensive.
    pub const ALL: [PlanTier; 3] = [PlanTier::Free, PlanTier::Pro, PlanTier::Premium];

    /// Parse a tier id (case-insensitive, `basic` is an alias of `pro`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "free" => Some(PlanTier::Free),
            "pro" | "basic" => Some(PlanTier::Pro),
            "premium" => Some(PlanTier::Premium),
            _ => None,
        }
    }

    /// Wire identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
            PlanTier::Premium => "premium",
        }
    }

    /// The next tier up, if any.
    pub fn upgrade_target(&self) -> Option<PlanTier> {
        match self {
            PlanTier::Free => Some(PlanTier::Pro),
            PlanTier::Pro => Some(PlanTier::Premium),
            PlanTier::Premium => None,
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tier id as received from upstream: either a known tier or the raw text.
///
/// Keeping the raw id lets callers tell a genuine free-tier user apart from
/// a record whose tier nobody recognises.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TierId {
    /// Tier present in the catalog
    Known(PlanTier),
    /// Anything else, kept verbatim
    Unknown(String),
}

impl TierId {
    /// The known tier, if any.
    pub fn tier(&self) -> Option<PlanTier> {
        match self {
            TierId::Known(tier) => Some(*tier),
            TierId::Unknown(_) => None,
        }
    }

    /// Returns true when the id matched a catalog tier.
    pub fn is_known(&self) -> bool {
        matches!(self, TierId::Known(_))
    }

    /// Raw identifier text.
    pub fn as_str(&self) -> &str {
        match self {
            TierId::Known(tier) => tier.as_str(),
            TierId::Unknown(raw) => raw,
        }
    }
}

impl Default for TierId {
    fn default() -> Self {
        TierId::Unknown(String::new())
    }
}

impl From<String> for TierId {
    fn from(value: String) -> Self {
        match PlanTier::parse(&value) {
            Some(tier) => TierId::Known(tier),
            None => TierId::Unknown(value),
        }
    }
}

impl From<&str> for TierId {
    fn from(value: &str) -> Self {
        TierId::from(value.to_string())
    }
}

impl From<PlanTier> for TierId {
    fn from(value: PlanTier) -> Self {
        TierId::Known(value)
    }
}

impl From<TierId> for String {
    fn from(value: TierId) -> Self {
        match value {
            TierId::Known(tier) => tier.as_str().to_string(),
            TierId::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for TierId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Tier this plan describes
    pub tier: PlanTier,
    /// Marketing name (e.g., "Pro")
    pub name: String,
    /// Monthly price in USD
    pub price: f64,
    /// Quota per resource kind
    pub limits: BTreeMap<ResourceKind, Limit>,
    /// Feature bullet points in display order
    #[serde(default)]
    pub features: Vec<String>,
    /// Highlighted as the recommended plan
    #[serde(default)]
    pub popular: bool,
}

impl Plan {
    /// Limit for a resource kind. A missing entry means no cap.
    pub fn limit(&self, kind: ResourceKind) -> Limit {
        self.limits.get(&kind).copied().unwrap_or(Limit::Unlimited)
    }

    /// Returns true if every resource kind is uncapped.
    pub fn is_unlimited(&self) -> bool {
        ResourceKind::ALL.iter().all(|k| self.limit(*k).is_unlimited())
    }

    /// Price formatted for display ("Free", "$9.99/mo").
    pub fn price_label(&self) -> String {
        if self.price <= 0.0 {
            "Free".to_string()
        } else {
            format!("${:.2}/mo", self.price)
        }
    }
}

/// On-disk catalog layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogFile {
    plans: Vec<Plan>,
}

/// The registry of plans, one per tier.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanCatalog {
    free: Plan,
    pro: Plan,
    premium: Plan,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PlanCatalog {
    /// The catalog shipped with the product.
    pub fn builtin() -> Self {
        use Limit::{Finite, Unlimited};

        let limits = |clean, unclean, audio, video| {
            BTreeMap::from([
                (ResourceKind::CleanTranscripts, clean),
                (ResourceKind::UncleanTranscripts, unclean),
                (ResourceKind::AudioDownloads, audio),
                (ResourceKind::VideoDownloads, video),
            ])
        };

        Self {
            free: Plan {
                tier: PlanTier::Free,
                name: "Free".to_string(),
                price: 0.0,
                limits: limits(Finite(5), Finite(3), Finite(2), Finite(1)),
                features: vec![
                    "5 clean transcripts per month".to_string(),
                    "3 unclean transcripts per month".to_string(),
                    "2 audio downloads per month".to_string(),
                    "1 video download per month".to_string(),
                ],
                popular: false,
            },
            pro: Plan {
                tier: PlanTier::Pro,
                name: "Pro".to_string(),
                price: 9.99,
                limits: limits(Finite(100), Finite(50), Finite(50), Finite(20)),
                features: vec![
                    "100 clean transcripts per month".to_string(),
                    "50 unclean transcripts per month".to_string(),
                    "50 audio downloads per month".to_string(),
                    "20 video downloads per month".to_string(),
                    "Batch processing".to_string(),
                    "Priority support".to_string(),
                ],
                popular: true,
            },
            premium: Plan {
                tier: PlanTier::Premium,
                name: "Premium".to_string(),
                price: 19.99,
                limits: limits(Unlimited, Unlimited, Unlimited, Unlimited),
                features: vec![
                    "Unlimited clean transcripts".to_string(),
                    "Unlimited unclean transcripts".to_string(),
                    "Unlimited audio downloads".to_string(),
                    "Unlimited video downloads".to_string(),
                    "Batch processing".to_string(),
                    "Priority support".to_string(),
                ],
                popular: false,
            },
        }
    }

    /// Build a catalog from a list of plans, enforcing one plan per tier
    /// with a limit for every resource kind.
    pub fn from_plans(plans: Vec<Plan>) -> Result<Self> {
        let mut by_tier: BTreeMap<PlanTier, Plan> = BTreeMap::new();

        for plan in plans {
            for kind in ResourceKind::ALL {
                if !plan.limits.contains_key(&kind) {
                    return Err(PlanError::InvalidCatalog(format!(
                        "plan '{}' has no limit for {}",
                        plan.tier, kind
                    )));
                }
            }
            if plan.price < 0.0 || !plan.price.is_finite() {
                return Err(PlanError::InvalidCatalog(format!(
                    "plan '{}' has invalid price {}",
                    plan.tier, plan.price
                )));
            }
            let tier = plan.tier;
            if by_tier.insert(tier, plan).is_some() {
                return Err(PlanError::InvalidCatalog(format!(
                    "tier '{}' is defined more than once",
                    tier
                )));
            }
        }

        let mut take = |tier: PlanTier| {
            by_tier
                .remove(&tier)
                .ok_or_else(|| PlanError::InvalidCatalog(format!("tier '{}' is missing", tier)))
        };

        Ok(Self {
            free: take(PlanTier::Free)?,
            pro: take(PlanTier::Pro)?,
            premium: take(PlanTier::Premium)?,
        })
    }

    /// Parse a catalog from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(content)?;
        Self::from_plans(file.plans)
    }

    /// Load a catalog from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_yaml_str(&content)?;
        info!(path = %path.display(), "loaded plan catalog");
        Ok(catalog)
    }

    /// Load from `path` if given, otherwise use the built-in catalog.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    /// Plans ordered from free to premium.
    pub fn plans(&self) -> [&Plan; 3] {
        [&self.free, &self.pro, &self.premium]
    }

    /// Plan for a known tier.
    pub fn plan(&self, tier: PlanTier) -> &Plan {
        match tier {
            PlanTier::Free => &self.free,
            PlanTier::Pro => &self.pro,
            PlanTier::Premium => &self.premium,
        }
    }

    /// Look up a plan by tier id.
    pub fn get(&self, tier_id: &str) -> Option<&Plan> {
        PlanTier::parse(tier_id).map(|tier| self.plan(tier))
    }

    /// Plan to use for styling and copy. Unknown ids fall back to free.
    pub fn plan_for_display(&self, tier_id: &str) -> &Plan {
        match self.get(tier_id) {
            Some(plan) => plan,
            None => {
                debug!(tier = tier_id, "unknown tier, displaying as free");
                &self.free
            }
        }
    }

    /// Plan to use for limit math. Unknown ids are an error, never free.
    pub fn plan_for_billing(&self, tier_id: &str) -> Result<&Plan> {
        self.get(tier_id).ok_or_else(|| {
            ycd_core::log_integrity_warning!("unknown_tier", tier = tier_id);
            PlanError::UnknownTier {
                tier: tier_id.to_string(),
            }
        })
    }

    /// Catalog limit for a tier id and resource kind.
    pub fn limit_for(&self, tier_id: &str, kind: ResourceKind) -> Result<Limit> {
        Ok(self.plan_for_billing(tier_id)?.limit(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_parse() {
        assert_eq!(PlanTier::parse("FREE"), Some(PlanTier::Free));
        assert_eq!(PlanTier::parse("basic"), Some(PlanTier::Pro));
        assert_eq!(PlanTier::parse(" premium "), Some(PlanTier::Premium));
        assert_eq!(PlanTier::parse("gold"), None);
    }

    #[test]
    fn test_tier_id_keeps_unknown_text() {
        let id: TierId = serde_json::from_str("\"Gold\"").unwrap();
        assert_eq!(id, TierId::Unknown("Gold".to_string()));
        assert!(!id.is_known());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"Gold\"");

        let id: TierId = serde_json::from_str("\"basic\"").unwrap();
        assert_eq!(id.tier(), Some(PlanTier::Pro));
    }

    #[test]
    fn test_builtin_catalog() {
        let catalog = PlanCatalog::builtin();
        assert_eq!(catalog.plans().len(), 3);
        assert_eq!(
            catalog.plan(PlanTier::Free).limit(ResourceKind::CleanTranscripts),
            Limit::Finite(5)
        );
        assert!(catalog.plan(PlanTier::Premium).is_unlimited());
        assert!(catalog.plan(PlanTier::Pro).popular);
    }

    #[test]
    fn test_display_lookup_falls_back_to_free() {
        let catalog = PlanCatalog::builtin();
        assert_eq!(catalog.plan_for_display("pro").tier, PlanTier::Pro);
        assert_eq!(catalog.plan_for_display("enterprise").tier, PlanTier::Free);
    }

    #[test]
    fn test_billing_lookup_refuses_unknown() {
        let catalog = PlanCatalog::builtin();
        assert!(catalog.plan_for_billing("premium").is_ok());
        let err = catalog.plan_for_billing("enterprise").unwrap_err();
        assert!(matches!(err, PlanError::UnknownTier { ref tier } if tier == "enterprise"));
        assert!(catalog
            .limit_for("enterprise", ResourceKind::AudioDownloads)
            .is_err());
    }

    #[test]
    fn test_price_label() {
        let catalog = PlanCatalog::builtin();
        assert_eq!(catalog.plan(PlanTier::Free).price_label(), "Free");
        assert_eq!(catalog.plan(PlanTier::Pro).price_label(), "$9.99/mo");
    }

    #[test]
    fn test_upgrade_target() {
        assert_eq!(PlanTier::Free.upgrade_target(), Some(PlanTier::Pro));
        assert_eq!(PlanTier::Premium.upgrade_target(), None);
    }

    #[test]
    fn test_from_plans_rejects_duplicates_and_gaps() {
        let builtin = PlanCatalog::builtin();
        let free = builtin.plan(PlanTier::Free).clone();
        let pro = builtin.plan(PlanTier::Pro).clone();

        let err = PlanCatalog::from_plans(vec![free.clone(), free.clone(), pro.clone()]).unwrap_err();
        assert!(err.to_string().contains("more than once"));

        let err = PlanCatalog::from_plans(vec![free.clone(), pro.clone()]).unwrap_err();
        assert!(err.to_string().contains("premium"));

        let mut partial = free;
        partial.limits.remove(&ResourceKind::VideoDownloads);
        let premium = builtin.plan(PlanTier::Premium).clone();
        let err = PlanCatalog::from_plans(vec![partial, pro, premium]).unwrap_err();
        assert!(err.to_string().contains("video_downloads"));
    }

    #[test]
    fn test_yaml_catalog() {
        let yaml = r#"
plans:
  - tier: free
    name: Starter
    price: 0
    limits: { clean_transcripts: 10, unclean_transcripts: 5, audio_downloads: 3, video_downloads: 1 }
  - tier: basic
    name: Basic
    price: 4.99
    limits: { clean_transcripts: 50, unclean_transcripts: 25, audio_downloads: 20, video_downloads: 10 }
    features: ["Batch processing"]
  - tier: premium
    name: Premium
    price: 14.99
    popular: true
    limits: { clean_transcripts: unlimited, unclean_transcripts: .inf, audio_downloads: ~, video_downloads: "unlimited" }
"#;
        let catalog = PlanCatalog::from_yaml_str(yaml).unwrap();
        assert_eq!(catalog.plan(PlanTier::Free).name, "Starter");
        assert_eq!(catalog.plan(PlanTier::Pro).features, vec!["Batch processing"]);
        assert!(catalog.plan(PlanTier::Premium).is_unlimited());
        assert!(catalog.plan(PlanTier::Premium).popular);
    }
}
