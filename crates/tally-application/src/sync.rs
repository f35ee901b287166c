//! Periodic reconciliation of the session store.
//!
//! A [`SyncDaemon`] runs while a session is in view: every tick it merges
//! the reachable substrates into the local cache and hands the refreshed
//! [`SessionView`] to the caller. The returned [`SyncHandle`] stops the task
//! when cancelled or dropped.

use crate::session::SessionView;
use std::sync::Arc;
use std::time::Duration;
use tally_core::session::{SessionCode, SessionStore};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

const TARGET: &str = "session_sync";

pub struct SyncDaemon {
    store: Arc<dyn SessionStore>,
    interval: Duration,
}

impl SyncDaemon {
    pub fn new(store: Arc<dyn SessionStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Spawns the reconciliation task for `code`.
    ///
    /// `on_refresh` runs after every pass in which the session could be
    /// found. The first pass happens immediately.
    pub fn start<F>(self, code: SessionCode, mut on_refresh: F) -> SyncHandle
    where
        F: FnMut(SessionView) + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.child_token();
        let store = self.store;
        let period = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(target: TARGET, %code, interval_ms = period.as_millis() as u64, "sync started");

            loop {
                tokio::select! {
                    _ = child.cancelled() => break,
                    _ = ticker.tick() => {
                        let report = store.reconcile().await;
                        if report.changed() {
                            tracing::debug!(
                                target: TARGET,
                                %code,
                                adopted = report.adopted.len(),
                                "adopted remote records"
                            );
                        }

                        match store.get(&code).await {
                            Some(session) => on_refresh(SessionView::of(&session)),
                            None => tracing::debug!(target: TARGET, %code, "session not in view yet"),
                        }
                    }
                }
            }

            tracing::info!(target: TARGET, %code, "sync stopped");
        });

        SyncHandle {
            token,
            task: Some(task),
        }
    }
}

/// Owner of a running [`SyncDaemon`] task.
pub struct SyncHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Requests shutdown. The current pass, if any, is allowed to finish.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancels the task and waits for it to exit.
    pub async fn join(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(target: TARGET, error = %e, "sync task failed");
            }
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::session::{
        KeyValueSubstrate, NewSession, Phase, SESSIONS_BLOB_KEY, Session,
    };
    use tally_infrastructure::{MemorySubstrate, ReplicatedSessionStore};
    use tokio::sync::mpsc;

    fn store_over(substrate: &Arc<MemorySubstrate>) -> Arc<ReplicatedSessionStore> {
        Arc::new(ReplicatedSessionStore::new(
            vec![Arc::clone(substrate) as Arc<dyn KeyValueSubstrate>],
            SESSIONS_BLOB_KEY,
        ))
    }

    #[tokio::test]
    async fn test_refresh_reports_remote_changes() {
        let shared = Arc::new(MemorySubstrate::new());
        let organizer = store_over(&shared);
        let participant = store_over(&shared);

        let mut session = Session::create(SessionCode::parse("SYNC01").unwrap(), NewSession::default());
        organizer.put(session.clone()).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = SyncDaemon::new(organizer.clone(), Duration::from_millis(20))
            .start(session.code.clone(), move |view| {
                let _ = tx.send(view);
            });

        match rx.recv().await.unwrap() {
            SessionView::Inviting { roster } => assert!(roster.is_empty()),
            other => panic!("unexpected view {:?}", other),
        }

        participant.load().await;
        session.attach_participant("Ann");
        participant.put(session.clone()).await;

        let mut saw_ann = false;
        for _ in 0..50 {
            if let Some(SessionView::Inviting { roster }) = rx.recv().await {
                if roster.len() == 1 {
                    saw_ann = true;
                    break;
                }
            }
        }
        assert!(saw_ann);

        handle.join().await;
    }

    #[tokio::test]
    async fn test_cancel_stops_refreshing() {
        let shared = Arc::new(MemorySubstrate::new());
        let store = store_over(&shared);
        let mut session = Session::create(SessionCode::parse("SYNC02").unwrap(), NewSession::default());
        session.advance_to(Phase::Voting).unwrap();
        store.put(session.clone()).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = SyncDaemon::new(store, Duration::from_millis(10)).start(session.code, move |view| {
            let _ = tx.send(view);
        });

        assert_eq!(rx.recv().await.map(|v| v.phase()), Some(Phase::Voting));
        handle.cancel();
        assert!(handle.is_cancelled());
        handle.join().await;

        while rx.try_recv().is_ok() {}
        // The task owned the sender, so the channel closes once it exits.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let store = store_over(&Arc::new(MemorySubstrate::new()));
        let (tx, mut rx) = mpsc::unbounded_channel::<SessionView>();
        let handle = SyncDaemon::new(store, Duration::from_millis(10))
            .start(SessionCode::parse("SYNC03").unwrap(), move |view| {
                let _ = tx.send(view);
            });

        drop(handle);
        assert!(rx.recv().await.is_none());
    }
}
