//! Aggregation engine.
//!
//! Combines every ballot of a session into a mean score per object and a
//! ranking. Aggregation does not look at the session's method: a higher mean
//! is always better.

use crate::session::Session;
use serde::{Deserialize, Serialize};

/// Mean score of one object across all ballots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectScore {
    pub object: String,
    pub mean: f64,
}

/// Outcome of aggregating a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// Means in object declaration order
    pub per_object_mean: Vec<ObjectScore>,
    /// Objects by descending mean; ties keep declaration order
    pub ranking: Vec<String>,
    /// First object of `ranking`
    pub winner: Option<String>,
    pub ballot_count: usize,
    pub participant_count: usize,
}

impl AggregateResult {
    pub fn mean_of(&self, object: &str) -> Option<f64> {
        self.per_object_mean
            .iter()
            .find(|s| s.object == object)
            .map(|s| s.mean)
    }

    /// `(place, object, mean)` rows in ranking order, places starting at 1.
    pub fn standings(&self) -> impl Iterator<Item = (usize, &str, f64)> + '_ {
        self.ranking.iter().enumerate().map(|(index, object)| {
            (index + 1, object.as_str(), self.mean_of(object).unwrap_or(0.0))
        })
    }
}

/// Aggregates every ballot in `session`.
///
/// A session without ballots yields a mean of 0 for every object and a
/// ranking equal to the declaration order.
pub fn aggregate(session: &Session) -> AggregateResult {
    let ballot_count = session.ballots.len();

    let per_object_mean: Vec<ObjectScore> = session
        .objects
        .iter()
        .map(|object| {
            let total: f64 = session.ballots.values().map(|b| b.score(object)).sum();
            let mean = if ballot_count == 0 {
                0.0
            } else {
                total / ballot_count as f64
            };
            ObjectScore {
                object: object.clone(),
                mean,
            }
        })
        .collect();

    // sort_by is stable, so tied objects stay in declaration order.
    let mut order: Vec<&ObjectScore> = per_object_mean.iter().collect();
    order.sort_by(|a, b| b.mean.total_cmp(&a.mean));
    let ranking: Vec<String> = order.into_iter().map(|s| s.object.clone()).collect();

    tracing::debug!(
        code = %session.code,
        ballots = ballot_count,
        winner = ?ranking.first(),
        "aggregated session"
    );

    AggregateResult {
        winner: ranking.first().cloned(),
        ranking,
        per_object_mean,
        ballot_count,
        participant_count: session.participants.len(),
    }
}
