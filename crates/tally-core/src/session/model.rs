//! Session domain model.
//!
//! A `Session` is one evaluation exercise: a fixed list of objects, the
//! participants who joined under a shared code, and at most one ballot per
//! participant.

use super::code::SessionCode;
use crate::error::{Result, TallyError};
use crate::voting::EvaluationMethod;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Name used when the organizer leaves the name blank.
pub const DEFAULT_SESSION_NAME: &str = "Evaluation session";

/// Smallest number of objects a session can have.
pub const MIN_OBJECTS: usize = 2;

/// Largest number of objects a session can have.
pub const MAX_OBJECTS: usize = 100;

/// Capacity of a session materialized by a participant.
pub const MATERIALIZED_CAPACITY: u32 = 10;

/// Object count of a session materialized by a participant.
pub const MATERIALIZED_OBJECT_COUNT: usize = 4;

/// Lifecycle stage of a session.
///
/// Ordering follows the lifecycle, so `Inviting < Voting < Completed`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    /// Collecting participants.
    #[default]
    Inviting,
    /// The organizer has opened voting.
    Voting,
    /// Results have been requested.
    Completed,
}

/// Someone who joined a session under a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: String,
    pub name: String,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: format!("participant_{}", Uuid::new_v4().simple()),
            name: name.into(),
            joined_at: Utc::now(),
        }
    }
}

/// One participant's normalized scores, keyed by object label.
///
/// Higher scores are better for every method unless ranking ballots are
/// configured to keep raw positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ballot {
    pub participant_name: String,
    pub submitted_at: DateTime<Utc>,
    pub scores: BTreeMap<String, f64>,
}

impl Ballot {
    pub fn new(participant_name: impl Into<String>, scores: BTreeMap<String, f64>) -> Self {
        Self {
            participant_name: participant_name.into(),
            submitted_at: Utc::now(),
            scores,
        }
    }

    /// Score given to `object`, `0.0` when the ballot has none.
    pub fn score(&self, object: &str) -> f64 {
        self.scores.get(object).copied().unwrap_or(0.0)
    }
}

/// Organizer input for creating a session.
///
/// Numbers are signed so that out-of-range input can be coerced instead of
/// rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub name: String,
    pub capacity: i64,
    pub object_count: i64,
    pub method: EvaluationMethod,
}

impl Default for NewSession {
    fn default() -> Self {
        Self {
            name: String::new(),
            capacity: 5,
            object_count: MATERIALIZED_OBJECT_COUNT as i64,
            method: EvaluationMethod::Direct,
        }
    }
}

/// Represents one evaluation session.
///
/// This is the whole record replicated through the session store. Merges
/// compare `updated_at` only; no field-level reconciliation is attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub code: SessionCode,
    pub name: String,
    /// Target number of participants (never enforced)
    pub capacity: u32,
    /// Object labels in declaration order, fixed after creation
    pub objects: Vec<String>,
    pub method: EvaluationMethod,
    /// Participants in join order
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Ballots keyed by participant id
    #[serde(default)]
    pub ballots: BTreeMap<String, Ballot>,
    #[serde(default)]
    pub phase: Phase,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Builds a session in the `Inviting` phase, coercing the numeric inputs.
    pub fn create(code: SessionCode, spec: NewSession) -> Self {
        let name = match spec.name.trim() {
            "" => DEFAULT_SESSION_NAME.to_string(),
            trimmed => trimmed.to_string(),
        };
        let capacity = spec.capacity.clamp(1, i64::from(u32::MAX)) as u32;
        let object_count = spec.object_count.clamp(MIN_OBJECTS as i64, MAX_OBJECTS as i64) as usize;
        let now = Utc::now();

        Self {
            code,
            name,
            capacity,
            objects: object_labels(object_count),
            method: spec.method,
            participants: Vec::new(),
            ballots: BTreeMap::new(),
            phase: Phase::Inviting,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builds the default session a participant fabricates for a code it
    /// cannot resolve. It starts directly in `Voting`.
    pub fn materialize(code: SessionCode) -> Self {
        let mut session = Self::create(
            code,
            NewSession {
                name: String::new(),
                capacity: i64::from(MATERIALIZED_CAPACITY),
                object_count: MATERIALIZED_OBJECT_COUNT as i64,
                method: EvaluationMethod::Direct,
            },
        );
        session.phase = Phase::Voting;
        session
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn participant(&self, participant_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == participant_id)
    }

    /// Finds a participant by exact (case-sensitive) name.
    pub fn participant_named(&self, name: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.name == name)
    }

    /// Returns the participant with `name`, appending a new one if needed.
    ///
    /// The boolean is `true` when a participant was added.
    pub fn attach_participant(&mut self, name: &str) -> (Participant, bool) {
        if let Some(existing) = self.participant_named(name) {
            return (existing.clone(), false);
        }

        let participant = Participant::new(name);
        self.participants.push(participant.clone());
        self.touch();
        (participant, true)
    }

    pub fn has_ballot(&self, participant_id: &str) -> bool {
        self.ballots.contains_key(participant_id)
    }

    /// Stores a ballot, replacing any earlier one from the same participant.
    pub fn record_ballot(&mut self, participant_id: &str, ballot: Ballot) -> Result<()> {
        if self.participant(participant_id).is_none() {
            return Err(TallyError::not_found("Participant", participant_id));
        }
        self.ballots.insert(participant_id.to_string(), ballot);
        self.touch();
        Ok(())
    }

    /// Moves the session forward to `target`.
    ///
    /// Moving to the current phase is a no-op and returns `false`. Moving
    /// backwards is rejected.
    pub fn advance_to(&mut self, target: Phase) -> Result<bool> {
        if target < self.phase {
            return Err(TallyError::InvalidTransition {
                from: self.phase,
                to: target,
            });
        }
        if target == self.phase {
            return Ok(false);
        }
        self.phase = target;
        self.touch();
        Ok(true)
    }

    /// Bumps `updated_at`, keeping it strictly increasing within a context.
    pub fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }
}

fn object_labels(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("Object {i}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> SessionCode {
        SessionCode::parse("ABC123").unwrap()
    }

    #[test]
    fn test_create_builds_labeled_objects() {
        for count in 2..=12 {
            let session = Session::create(
                code(),
                NewSession {
                    object_count: count,
                    ..NewSession::default()
                },
            );
            assert_eq!(session.object_count(), count as usize);
            assert_eq!(session.phase, Phase::Inviting);
            assert_eq!(session.objects[0], "Object 1");
        }
    }

    #[test]
    fn test_create_coerces_numeric_input() {
        let session = Session::create(
            code(),
            NewSession {
                name: "   ".to_string(),
                capacity: -3,
                object_count: 0,
                method: EvaluationMethod::Pairwise,
            },
        );
        assert_eq!(session.name, DEFAULT_SESSION_NAME);
        assert_eq!(session.capacity, 1);
        assert_eq!(session.object_count(), MIN_OBJECTS);
        assert_eq!(session.method, EvaluationMethod::Pairwise);
    }

    #[test]
    fn test_create_caps_object_count() {
        let session = Session::create(
            code(),
            NewSession {
                object_count: 10_000,
                ..NewSession::default()
            },
        );
        assert_eq!(session.object_count(), MAX_OBJECTS);
    }

    #[test]
    fn test_materialize_defaults() {
        let session = Session::materialize(code());
        assert_eq!(session.capacity, MATERIALIZED_CAPACITY);
        assert_eq!(session.object_count(), MATERIALIZED_OBJECT_COUNT);
        assert_eq!(session.method, EvaluationMethod::Direct);
        assert_eq!(session.phase, Phase::Voting);
    }

    #[test]
    fn test_attach_participant_reuses_name() {
        let mut session = Session::create(code(), NewSession::default());
        let (first, added) = session.attach_participant("Ann");
        assert!(added);
        let (again, added) = session.attach_participant("Ann");
        assert!(!added);
        assert_eq!(first.id, again.id);

        let (other, _) = session.attach_participant("ann");
        assert_ne!(first.id, other.id);
        assert_eq!(session.participants.len(), 2);
    }

    #[test]
    fn test_record_ballot_requires_participant() {
        let mut session = Session::create(code(), NewSession::default());
        let err = session
            .record_ballot("ghost", Ballot::new("Ghost", BTreeMap::new()))
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(session.ballots.is_empty());
    }

    #[test]
    fn test_record_ballot_overwrites() {
        let mut session = Session::create(code(), NewSession::default());
        let (ann, _) = session.attach_participant("Ann");

        let first = BTreeMap::from([("Object 1".to_string(), 1.0)]);
        let second = BTreeMap::from([("Object 1".to_string(), 9.0)]);
        session.record_ballot(&ann.id, Ballot::new("Ann", first)).unwrap();
        session.record_ballot(&ann.id, Ballot::new("Ann", second)).unwrap();

        assert_eq!(session.ballots.len(), 1);
        assert_eq!(session.ballots[&ann.id].score("Object 1"), 9.0);
    }

    #[test]
    fn test_advance_is_one_way() {
        let mut session = Session::create(code(), NewSession::default());
        assert!(session.advance_to(Phase::Voting).unwrap());
        assert!(!session.advance_to(Phase::Voting).unwrap());
        assert!(session.advance_to(Phase::Completed).unwrap());

        let err = session.advance_to(Phase::Voting).unwrap_err();
        assert_eq!(
            err,
            TallyError::InvalidTransition {
                from: Phase::Completed,
                to: Phase::Voting
            }
        );
    }

    #[test]
    fn test_touch_is_strictly_increasing() {
        let mut session = Session::create(code(), NewSession::default());
        let mut previous = session.updated_at;
        for _ in 0..100 {
            session.touch();
            assert!(session.updated_at > previous);
            previous = session.updated_at;
        }
    }

    #[test]
    fn test_json_layout_is_camel_case() {
        let session = Session::create(code(), NewSession::default());
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["code"], "ABC123");
        assert_eq!(json["phase"], "inviting");
        assert_eq!(json["method"], "direct");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }
}
