//! Raw participant input, one variant per evaluation method.

use crate::error::{Result, TallyError};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Raw form values submitted by a participant.
#[derive(Debug, Clone, PartialEq)]
pub enum BallotInput {
    /// Chosen score per object label. Missing objects take the default.
    Direct(BTreeMap<String, f64>),
    /// Object labels from most to least preferred.
    Ranking(Vec<String>),
    /// One designation per pair of objects.
    Pairwise(Vec<PairPreference>),
}

/// "`preferred` over `other`" for one pair of objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairPreference {
    pub preferred: String,
    pub other: String,
}

impl PairPreference {
    pub fn new(preferred: impl Into<String>, other: impl Into<String>) -> Self {
        Self {
            preferred: preferred.into(),
            other: other.into(),
        }
    }
}

impl FromStr for PairPreference {
    type Err = TallyError;

    /// Parses `"A>B"` as "A preferred over B".
    fn from_str(s: &str) -> Result<Self> {
        let (preferred, other) = s
            .split_once('>')
            .ok_or_else(|| TallyError::validation("preference", format!("expected A>B, got '{s}'")))?;
        let (preferred, other) = (preferred.trim(), other.trim());
        if preferred.is_empty() || other.is_empty() {
            return Err(TallyError::validation(
                "preference",
                format!("expected A>B, got '{s}'"),
            ));
        }
        Ok(Self::new(preferred, other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preference() {
        let pref: PairPreference = "Object 1 > Object 3".parse().unwrap();
        assert_eq!(pref, PairPreference::new("Object 1", "Object 3"));
    }

    #[test]
    fn test_parse_preference_rejects_garbage() {
        assert!("Object 1".parse::<PairPreference>().is_err());
        assert!(">B".parse::<PairPreference>().is_err());
    }
}
