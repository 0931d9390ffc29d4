//! Term identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Largest integer an f64 represents exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Identifier of a term within a taxonomy. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct TermId(u64);

/// Zero is not a term identifier (it is the parent id of root terms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("term identifiers must be positive, got {0}")]
pub struct InvalidTermId(pub u64);

impl TermId {
    /// Wrap a raw id, rejecting zero.
    pub fn new(raw: u64) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Coerce a query-string value into a term id.
    ///
    /// Accepts anything that reads as a finite, positive, whole number after
    /// trimming (`"05"`, `"1e1"`, `"+3"`). Everything else yields `None`.
    pub fn parse_lenient(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        let number: f64 = trimmed.parse().ok()?;
        if !number.is_finite() || number <= 0.0 || number.fract() != 0.0 {
            return None;
        }
        if number > MAX_EXACT_INTEGER {
            return None;
        }
        Self::new(number as u64)
    }
}

impl TryFrom<u64> for TermId {
    type Error = InvalidTermId;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(InvalidTermId(raw))
    }
}

impl From<TermId> for u64 {
    fn from(id: TermId) -> Self {
        id.0
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_rejected() {
        assert_eq!(TermId::new(0), None);
        assert_eq!(TermId::try_from(0), Err(InvalidTermId(0)));
        assert_eq!(TermId::new(7).map(TermId::get), Some(7));
    }

    #[test]
    fn test_parse_lenient_accepts_numeric_spellings() {
        assert_eq!(TermId::parse_lenient("5"), TermId::new(5));
        assert_eq!(TermId::parse_lenient(" 05 "), TermId::new(5));
        assert_eq!(TermId::parse_lenient("1e1"), TermId::new(10));
        assert_eq!(TermId::parse_lenient("+3"), TermId::new(3));
        assert_eq!(TermId::parse_lenient("4.0"), TermId::new(4));
    }

    #[test]
    fn test_parse_lenient_drops_invalid_values() {
        for raw in ["", "   ", "0", "-2", "2.5", "abc", "inf", "NaN", "1e400"] {
            assert_eq!(TermId::parse_lenient(raw), None, "{raw:?} should be dropped");
        }
    }

    #[test]
    fn test_serde_rejects_zero() {
        assert!(serde_json::from_str::<TermId>("0").is_err());
        let id: TermId = serde_json::from_str("12").unwrap();
        assert_eq!(id.get(), 12);
        assert_eq!(serde_json::to_string(&id).unwrap(), "12");
    }
}
