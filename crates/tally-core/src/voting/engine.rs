//! Normalization of raw ballot input into per-object scores.

use super::input::{BallotInput, PairPreference};
use super::method::EvaluationMethod;
use crate::error::{Result, TallyError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Lowest direct score.
pub const DIRECT_MIN: f64 = 0.0;
/// Highest direct score.
pub const DIRECT_MAX: f64 = 10.0;
/// Score assumed for an object the participant left untouched.
pub const DIRECT_DEFAULT: f64 = 5.0;

/// Granularity of direct scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreStep {
    #[default]
    Whole,
    Half,
}

impl ScoreStep {
    pub fn value(&self) -> f64 {
        match self {
            Self::Whole => 1.0,
            Self::Half => 0.5,
        }
    }
}

/// How a ranking position becomes a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankScoring {
    /// `object_count + 1 - position`: first place scores highest, like the
    /// other methods.
    #[default]
    Borda,
    /// The 1-based position itself. Lower is better, so aggregation (which
    /// prefers higher means) ranks these ballots backwards.
    Position,
}

/// Number of unordered pairs among `n` objects.
pub fn required_pairs(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

/// Every unordered pair of distinct objects, in declaration order.
pub fn all_pairs(objects: &[String]) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(required_pairs(objects.len()));
    for (i, first) in objects.iter().enumerate() {
        for second in &objects[i + 1..] {
            pairs.push((first.clone(), second.clone()));
        }
    }
    pairs
}

/// Turns raw ballot input into the scores stored on a ballot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VotingEngine {
    pub direct_step: ScoreStep,
    pub rank_scoring: RankScoring,
}

impl VotingEngine {
    pub fn new(direct_step: ScoreStep, rank_scoring: RankScoring) -> Self {
        Self {
            direct_step,
            rank_scoring,
        }
    }

    /// Normalizes `input` for a session with the given objects and method.
    ///
    /// # Errors
    ///
    /// - `Validation` if the input variant does not match `method`, or a
    ///   pairwise designation names an unknown object
    /// - `IncompleteBallot` if a pairwise ballot leaves any pair undecided
    pub fn normalize(
        &self,
        objects: &[String],
        method: EvaluationMethod,
        input: &BallotInput,
    ) -> Result<BTreeMap<String, f64>> {
        match (method, input) {
            (EvaluationMethod::Direct, BallotInput::Direct(values)) => {
                Ok(self.normalize_direct(objects, values))
            }
            (EvaluationMethod::Ranking, BallotInput::Ranking(order)) => {
                Ok(self.normalize_ranking(objects, order))
            }
            (EvaluationMethod::Pairwise, BallotInput::Pairwise(prefs)) => {
                normalize_pairwise(objects, prefs)
            }
            (expected, _) => Err(TallyError::validation(
                "ballot",
                format!("session expects {expected} input"),
            )),
        }
    }

    fn normalize_direct(
        &self,
        objects: &[String],
        values: &BTreeMap<String, f64>,
    ) -> BTreeMap<String, f64> {
        objects
            .iter()
            .map(|object| {
                let raw = values
                    .get(object)
                    .copied()
                    .filter(|v| v.is_finite())
                    .unwrap_or(DIRECT_DEFAULT);
                (object.clone(), self.snap(raw))
            })
            .collect()
    }

    fn snap(&self, raw: f64) -> f64 {
        let step = self.direct_step.value();
        ((raw / step).round() * step).clamp(DIRECT_MIN, DIRECT_MAX)
    }

    fn normalize_ranking(&self, objects: &[String], order: &[String]) -> BTreeMap<String, f64> {
        let mut ranked: Vec<&String> = Vec::with_capacity(objects.len());
        for label in order {
            if let Some(object) = objects.iter().find(|o| *o == label) {
                if !ranked.contains(&object) {
                    ranked.push(object);
                }
            }
        }
        for object in objects {
            if !ranked.contains(&object) {
                ranked.push(object);
            }
        }

        let n = objects.len();
        ranked
            .into_iter()
            .enumerate()
            .map(|(index, object)| {
                let position = index + 1;
                let score = match self.rank_scoring {
                    RankScoring::Borda => (n + 1 - position) as f64,
                    RankScoring::Position => position as f64,
                };
                (object.clone(), score)
            })
            .collect()
    }
}

/// Copeland-style win counts. Every pair must be decided.
fn normalize_pairwise(
    objects: &[String],
    prefs: &[PairPreference],
) -> Result<BTreeMap<String, f64>> {
    let index_of = |label: &str| objects.iter().position(|o| o == label);

    // Unordered pair (low, high) -> index of the preferred object.
    let mut decided: HashMap<(usize, usize), usize> = HashMap::new();
    for pref in prefs {
        let preferred = index_of(pref.preferred.as_str()).ok_or_else(|| {
            TallyError::validation("preference", format!("unknown object '{}'", pref.preferred))
        })?;
        let other = index_of(pref.other.as_str()).ok_or_else(|| {
            TallyError::validation("preference", format!("unknown object '{}'", pref.other))
        })?;
        if preferred == other {
            return Err(TallyError::validation(
                "preference",
                format!("'{}' cannot be compared with itself", pref.preferred),
            ));
        }
        decided.insert((preferred.min(other), preferred.max(other)), preferred);
    }

    let required = required_pairs(objects.len());
    if decided.len() < required {
        return Err(TallyError::IncompleteBallot {
            designated: decided.len(),
            required,
        });
    }

    let mut wins = vec![0usize; objects.len()];
    for winner in decided.values() {
        wins[*winner] += 1;
    }

    Ok(objects
        .iter()
        .zip(wins)
        .map(|(object, count)| (object.clone(), count as f64))
        .collect())
}
