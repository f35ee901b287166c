//! Session updater helper for the read-modify-write pattern.

use std::sync::Arc;
use tally_core::session::{Session, SessionCode, SessionStore};
use tally_core::{Result, TallyError};

/// Encapsulates the "find → update → save" pattern:
///
/// 1. Load the session from the store's local cache
/// 2. Apply the update
/// 3. Write the whole record back
///
/// There is no compare-and-swap: another context writing the same session
/// between two reconciliation passes loses its changes or wins over these.
pub struct SessionUpdater {
    store: Arc<dyn SessionStore>,
}

impl SessionUpdater {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Loads the session or fails with `NotFound`.
    pub async fn load(&self, code: &SessionCode) -> Result<Session> {
        self.store
            .get(code)
            .await
            .ok_or_else(|| TallyError::not_found("Session", code.as_str()))
    }

    /// Applies `updater` and saves the session when it reports a change.
    ///
    /// The closure returns its own output plus whether the session changed;
    /// unchanged sessions are not written. Mutating helpers on [`Session`]
    /// bump `updated_at` themselves.
    pub async fn update<F, T>(&self, code: &SessionCode, updater: F) -> Result<(Session, T)>
    where
        F: FnOnce(&mut Session) -> Result<(T, bool)>,
    {
        let mut session = self.load(code).await?;
        let (output, changed) = updater(&mut session)?;

        if changed {
            tracing::debug!(code = %code, phase = %session.phase, "[SessionUpdater] saving session");
            self.store.put(session.clone()).await;
        }

        Ok((session, output))
    }
}
