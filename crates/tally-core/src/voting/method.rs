use serde::{Deserialize, Serialize};

/// How participants express their judgment, fixed when a session is created.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EvaluationMethod {
    /// Every object gets an independent score from 0 to 10.
    #[default]
    Direct,
    /// Objects are put in a total order.
    Ranking,
    /// One object is preferred in every pair of objects.
    Pairwise,
}

impl EvaluationMethod {
    /// Label shown to participants.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Direct => "Direct scoring (0-10)",
            Self::Ranking => "Ranking",
            Self::Pairwise => "Pairwise comparison",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(EvaluationMethod::from_str("Pairwise").unwrap(), EvaluationMethod::Pairwise);
        assert_eq!(EvaluationMethod::from_str("ranking").unwrap(), EvaluationMethod::Ranking);
        assert!(EvaluationMethod::from_str("borda").is_err());
    }

    #[test]
    fn test_display_matches_serde() {
        for method in EvaluationMethod::iter() {
            let json = serde_json::to_string(&method).unwrap();
            assert_eq!(json, format!("\"{method}\""));
        }
    }
}
