//! Result of a participant joining a session.

use super::model::{Participant, Session};

/// How a join was satisfied.
///
/// `Materialized` means the code did not resolve in any reachable store and
/// the joining context fabricated its own default session under that code.
/// Such a session may diverge from the organizer's copy.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    /// The code resolved to an existing session.
    Resolved {
        session: Session,
        participant: Participant,
    },
    /// A default session was created locally for the unknown code.
    Materialized {
        session: Session,
        participant: Participant,
    },
}

impl JoinOutcome {
    pub fn session(&self) -> &Session {
        match self {
            Self::Resolved { session, .. } | Self::Materialized { session, .. } => session,
        }
    }

    pub fn participant(&self) -> &Participant {
        match self {
            Self::Resolved { participant, .. } | Self::Materialized { participant, .. } => {
                participant
            }
        }
    }

    pub fn is_materialized(&self) -> bool {
        matches!(self, Self::Materialized { .. })
    }

    pub fn into_parts(self) -> (Session, Participant) {
        match self {
            Self::Resolved {
                session,
                participant,
            }
            | Self::Materialized {
                session,
                participant,
            } => (session, participant),
        }
    }
}
