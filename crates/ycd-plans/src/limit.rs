//! Quota limits with a single "unlimited" representation.
//!
//! Upstream data spells "no cap" several ways: the string `"unlimited"`,
//! a float infinity (YAML `.inf`), or `null` (what a JavaScript producer emits
//! for `Infinity`). All of them deserialize to [`Limit::Unlimited`], so code
//! past the ingestion boundary never compares against a sentinel.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// A per-resource quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Limit {
    /// A hard cap on the number of uses
    Finite(u64),
    /// No cap
    Unlimited,
}

impl Limit {
    /// Returns true for [`Limit::Unlimited`].
    pub fn is_unlimited(&self) -> bool {
        matches!(self, Limit::Unlimited)
    }

    /// The cap, if there is one.
    pub fn finite(&self) -> Option<u64> {
        match self {
            Limit::Finite(n) => Some(*n),
            Limit::Unlimited => None,
        }
    }

    /// What is left of this limit after `used` units, saturating at zero.
    pub fn remaining_after(&self, used: u64) -> Limit {
        match self {
            Limit::Finite(n) => Limit::Finite(n.saturating_sub(used)),
            Limit::Unlimited => Limit::Unlimited,
        }
    }

    /// True when a finite limit has been reached or passed.
    pub fn is_exhausted_by(&self, used: u64) -> bool {
        match self {
            Limit::Finite(n) => used >= *n,
            Limit::Unlimited => false,
        }
    }

    /// Compact form for tables: the number, or `∞`.
    pub fn compact(&self) -> String {
        match self {
            Limit::Finite(n) => n.to_string(),
            Limit::Unlimited => "∞".to_string(),
        }
    }

    fn from_signed(value: i64) -> Limit {
        if value < 0 {
            tracing::debug!(value, "negative limit clamped to zero");
            Limit::Finite(0)
        } else {
            Limit::Finite(value as u64)
        }
    }

    fn from_float(value: f64) -> Option<Limit> {
        if value.is_nan() {
            None
        } else if value.is_infinite() {
            // Negative infinity has no sensible meaning as a quota either
            Some(if value > 0.0 {
                Limit::Unlimited
            } else {
                Limit::Finite(0)
            })
        } else if value < 0.0 {
            Some(Limit::Finite(0))
        } else {
            Some(Limit::Finite(value.round() as u64))
        }
    }

    fn from_text(value: &str) -> Option<Limit> {
        let trimmed = value.trim();
        match trimmed.to_lowercase().as_str() {
            "unlimited" | "infinity" | "inf" | "∞" => return Some(Limit::Unlimited),
            _ => {}
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return Some(Limit::from_signed(n));
        }
        trimmed.parse::<f64>().ok().and_then(Limit::from_float)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Finite(n) => write!(f, "{}", n),
            Limit::Unlimited => f.write_str("Unlimited"),
        }
    }
}

impl From<u64> for Limit {
    fn from(value: u64) -> Self {
        Limit::Finite(value)
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Limit::Finite(n) => serializer.serialize_u64(*n),
            Limit::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

struct LimitVisitor;

impl<'de> Visitor<'de> for LimitVisitor {
    type Value = Limit;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative number, \"unlimited\", or null")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Limit, E> {
        Ok(Limit::Finite(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Limit, E> {
        Ok(Limit::from_signed(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Limit, E> {
        Limit::from_float(v).ok_or_else(|| E::invalid_value(de::Unexpected::Float(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Limit, E> {
        Limit::from_text(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Limit, E> {
        Ok(Limit::Unlimited)
    }

    fn visit_none<E: de::Error>(self) -> Result<Limit, E> {
        Ok(Limit::Unlimited)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Limit, D::Error> {
        deserializer.deserialize_any(LimitVisitor)
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LimitVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_json(text: &str) -> Limit {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_sentinels_normalize_to_unlimited() {
        assert_eq!(parse_json("\"unlimited\""), Limit::Unlimited);
        assert_eq!(parse_json("\"Unlimited\""), Limit::Unlimited);
        assert_eq!(parse_json("\"Infinity\""), Limit::Unlimited);
        assert_eq!(parse_json("null"), Limit::Unlimited);

        let yaml: Limit = serde_yaml::from_str(".inf").unwrap();
        assert_eq!(yaml, Limit::Unlimited);
    }

    #[test]
    fn test_numeric_forms() {
        assert_eq!(parse_json("20"), Limit::Finite(20));
        assert_eq!(parse_json("20.0"), Limit::Finite(20));
        assert_eq!(parse_json("\"15\""), Limit::Finite(15));
        assert_eq!(parse_json("-4"), Limit::Finite(0));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(serde_json::from_str::<Limit>("\"lots\"").is_err());
        assert!(serde_json::from_str::<Limit>("[1]").is_err());
    }

    #[test]
    fn test_serialize_forms() {
        assert_eq!(serde_json::to_string(&Limit::Finite(5)).unwrap(), "5");
        assert_eq!(
            serde_json::to_string(&Limit::Unlimited).unwrap(),
            "\"unlimited\""
        );
    }

    #[test]
    fn test_remaining_after() {
        assert_eq!(Limit::Finite(20).remaining_after(18), Limit::Finite(2));
        assert_eq!(Limit::Finite(20).remaining_after(25), Limit::Finite(0));
        assert_eq!(Limit::Unlimited.remaining_after(1_000), Limit::Unlimited);
    }

    #[test]
    fn test_exhaustion_and_ordering() {
        assert!(Limit::Finite(3).is_exhausted_by(3));
        assert!(!Limit::Finite(3).is_exhausted_by(2));
        assert!(!Limit::Unlimited.is_exhausted_by(u64::MAX));
        assert!(Limit::Finite(u64::MAX) < Limit::Unlimited);
    }

    #[test]
    fn test_display() {
        assert_eq!(Limit::Finite(7).to_string(), "7");
        assert_eq!(Limit::Unlimited.to_string(), "Unlimited");
        assert_eq!(Limit::Unlimited.compact(), "∞");
    }
}
