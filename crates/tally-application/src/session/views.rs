//! Read-only projections of a session for rendering.

use serde::Serialize;
use tally_core::aggregation::{AggregateResult, aggregate};
use tally_core::session::{Participant, Phase, Session};

/// One roster row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantStatus {
    pub participant: Participant,
    pub has_ballot: bool,
}

/// Counters shown while a session is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub joined: usize,
    pub submitted: usize,
    pub capacity: u32,
    pub phase: Phase,
}

impl Progress {
    pub fn of(session: &Session) -> Self {
        Self {
            joined: session.participants.len(),
            submitted: session.ballots.len(),
            capacity: session.capacity,
            phase: session.phase,
        }
    }

    /// Whether every targeted participant has voted.
    pub fn is_complete(&self) -> bool {
        self.submitted >= self.capacity as usize
    }
}

/// Roster in join order.
pub fn roster(session: &Session) -> Vec<ParticipantStatus> {
    session
        .participants
        .iter()
        .map(|p| ParticipantStatus {
            participant: p.clone(),
            has_ballot: session.has_ballot(&p.id),
        })
        .collect()
}

/// The phase-appropriate view refreshed after each reconciliation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum SessionView {
    Inviting {
        roster: Vec<ParticipantStatus>,
    },
    Voting {
        progress: Progress,
        roster: Vec<ParticipantStatus>,
    },
    Completed {
        result: AggregateResult,
    },
}

impl SessionView {
    pub fn of(session: &Session) -> Self {
        match session.phase {
            Phase::Inviting => Self::Inviting {
                roster: roster(session),
            },
            Phase::Voting => Self::Voting {
                progress: Progress::of(session),
                roster: roster(session),
            },
            Phase::Completed => Self::Completed {
                result: aggregate(session),
            },
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Self::Inviting { .. } => Phase::Inviting,
            Self::Voting { .. } => Phase::Voting,
            Self::Completed { .. } => Phase::Completed,
        }
    }
}
