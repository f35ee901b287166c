//! Evaluation use case.
//!
//! Entry point for every operation the view layer invokes: creating and
//! joining sessions, submitting ballots, moving through the lifecycle and
//! reading derived projections.

use crate::session::views::roster;
use crate::session::{ParticipantStatus, Progress, SessionUpdater, SessionView};
use std::sync::Arc;
use tally_core::aggregation::{AggregateResult, aggregate};
use tally_core::config::{SessionDefaults, TallyConfig};
use tally_core::invitation::Invitation;
use tally_core::session::{
    Ballot, JoinOutcome, NewSession, Participant, Phase, Session, SessionCode, SessionStore,
};
use tally_core::voting::{BallotInput, VotingEngine};
use tally_core::{Result, TallyError};
use tally_infrastructure::ReplicatedSessionStore;

/// Orchestrates the session lifecycle on top of a [`SessionStore`].
pub struct EvaluationUseCase {
    store: Arc<dyn SessionStore>,
    updater: SessionUpdater,
    engine: VotingEngine,
    defaults: SessionDefaults,
    /// Invitation the current context was opened with, if any
    ambient: Option<Invitation>,
}

impl EvaluationUseCase {
    pub fn new(store: Arc<dyn SessionStore>, engine: VotingEngine) -> Self {
        Self {
            updater: SessionUpdater::new(Arc::clone(&store)),
            store,
            engine,
            defaults: SessionDefaults::default(),
            ambient: None,
        }
    }

    /// Opens the configured substrates and hydrates the store.
    pub async fn open(config: &TallyConfig) -> Result<Self> {
        let store = ReplicatedSessionStore::open(&config.storage).await?;
        Ok(Self::new(Arc::new(store), config.voting.engine()).with_defaults(config.defaults.clone()))
    }

    pub fn with_defaults(mut self, defaults: SessionDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Records the invitation this context was opened from. Its code is used
    /// when `join_session` receives a blank code, and an embedded session
    /// record is used when the store cannot resolve the code.
    pub fn with_ambient_invitation(mut self, invitation: Invitation) -> Self {
        self.ambient = Some(invitation);
        self
    }

    pub fn store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.store)
    }

    pub fn defaults(&self) -> &SessionDefaults {
        &self.defaults
    }

    // ============================================================================
    // Lifecycle
    // ============================================================================

    /// Creates and persists a session in the `Inviting` phase.
    ///
    /// Numeric inputs are coerced, never rejected. The generated code is not
    /// checked against existing sessions.
    pub async fn create_session(&self, spec: NewSession) -> Session {
        let session = Session::create(SessionCode::random(), spec);
        self.store.put(session.clone()).await;

        tracing::info!(
            code = %session.code,
            objects = session.object_count(),
            capacity = session.capacity,
            method = %session.method,
            "created session"
        );
        session
    }

    /// Joins `code` as `name`.
    ///
    /// A blank code falls back to the ambient invitation. A code the store
    /// cannot resolve is served from the ambient invitation's embedded
    /// record when one matches, and otherwise materialized as a default
    /// session in the `Voting` phase.
    pub async fn join_session(&self, code: &str, name: &str) -> Result<JoinOutcome> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TallyError::validation("name", "participant name is required"));
        }
        let code = self.resolve_code(code)?;

        if let Some(mut session) = self.store.get(&code).await {
            let participant = self.attach(&mut session, name).await;
            return Ok(JoinOutcome::Resolved {
                session,
                participant,
            });
        }

        if let Some(mut session) = self.embedded_session(&code) {
            tracing::info!(%code, "resolved session from invitation link");
            let (participant, _) = session.attach_participant(name);
            self.store.put(session.clone()).await;
            return Ok(JoinOutcome::Resolved {
                session,
                participant,
            });
        }

        tracing::warn!(%code, "session not found, materializing a default session");
        let mut session = Session::materialize(code);
        let (participant, _) = session.attach_participant(name);
        self.store.put(session.clone()).await;

        Ok(JoinOutcome::Materialized {
            session,
            participant,
        })
    }

    fn resolve_code(&self, code: &str) -> Result<SessionCode> {
        if !code.trim().is_empty() {
            return SessionCode::parse(code);
        }
        match &self.ambient {
            Some(invitation) => Ok(invitation.code.clone()),
            None => Err(TallyError::validation("code", "session code is required")),
        }
    }

    fn embedded_session(&self, code: &SessionCode) -> Option<Session> {
        self.ambient
            .as_ref()
            .and_then(|invitation| invitation.embedded.clone())
            .filter(|session| &session.code == code)
    }

    async fn attach(&self, session: &mut Session, name: &str) -> Participant {
        let (participant, added) = session.attach_participant(name);
        if added {
            tracing::info!(code = %session.code, participant = %participant.id, "participant joined");
            self.store.put(session.clone()).await;
        } else {
            tracing::debug!(code = %session.code, participant = %participant.id, "participant resumed");
        }
        participant
    }

    /// Normalizes `input` with the session's method and stores the ballot,
    /// replacing any earlier one from the same participant.
    pub async fn submit_ballot(
        &self,
        code: &SessionCode,
        participant_id: &str,
        input: &BallotInput,
    ) -> Result<Ballot> {
        let engine = self.engine;
        let (_, ballot) = self
            .updater
            .update(code, |session| {
                let participant = session
                    .participant(participant_id)
                    .cloned()
                    .ok_or_else(|| TallyError::not_found("Participant", participant_id))?;
                let scores = engine.normalize(&session.objects, session.method, input)?;
                let ballot = Ballot::new(participant.name, scores);
                session.record_ballot(participant_id, ballot.clone())?;
                Ok((ballot, true))
            })
            .await?;

        tracing::info!(code = %code, participant = participant_id, "ballot submitted");
        Ok(ballot)
    }

    /// Moves the session to `Voting`. Calling it again while voting only
    /// returns the current progress.
    pub async fn start_voting(&self, code: &SessionCode) -> Result<Progress> {
        let (session, changed) = self
            .updater
            .update(code, |session| {
                let changed = session.advance_to(Phase::Voting)?;
                Ok((changed, changed))
            })
            .await?;

        if changed {
            tracing::info!(code = %code, "voting started");
        }
        Ok(Progress::of(&session))
    }

    /// Completes the session, whatever its phase, and aggregates it.
    pub async fn show_results(&self, code: &SessionCode) -> Result<AggregateResult> {
        let (session, changed) = self
            .updater
            .update(code, |session| {
                let changed = session.advance_to(Phase::Completed)?;
                Ok((changed, changed))
            })
            .await?;

        if changed {
            tracing::info!(code = %code, ballots = session.ballots.len(), "session completed");
        }
        Ok(aggregate(&session))
    }

    // ============================================================================
    // Projections
    // ============================================================================

    pub async fn session(&self, code: &SessionCode) -> Result<Session> {
        self.updater.load(code).await
    }

    /// Aggregates the current ballots without changing the phase.
    pub async fn compute_results(&self, code: &SessionCode) -> Result<AggregateResult> {
        Ok(aggregate(&self.session(code).await?))
    }

    /// Participants in join order with their ballot status.
    pub async fn list_participants(&self, code: &SessionCode) -> Result<Vec<ParticipantStatus>> {
        Ok(roster(&self.session(code).await?))
    }

    pub async fn progress(&self, code: &SessionCode) -> Result<Progress> {
        Ok(Progress::of(&self.session(code).await?))
    }

    pub async fn view(&self, code: &SessionCode) -> Result<SessionView> {
        Ok(SessionView::of(&self.session(code).await?))
    }

    /// Builds the invitation for an existing session. `embed` produces the
    /// legacy link that carries the whole record.
    pub async fn invitation(
        &self,
        code: &SessionCode,
        base_url: &str,
        embed: bool,
    ) -> Result<Invitation> {
        let session = self.session(code).await?;
        if embed {
            Invitation::with_embedded(base_url, session)
        } else {
            Invitation::new(base_url, session.code)
        }
    }
}
