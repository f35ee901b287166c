//! Session store trait.
//!
//! Defines the interface the lifecycle and the sync daemon use to read and
//! write sessions, independent of which substrates are reachable.

use super::code::SessionCode;
use super::merge::{MergeReport, SessionMap};
use super::model::Session;
use async_trait::async_trait;

/// A replicated, eventually-consistent mapping from code to session.
///
/// # Implementation Notes
///
/// - `put` and `merge` write through to every reachable substrate before
///   returning. Substrate failures are logged and swallowed; the in-memory
///   copy stays authoritative for the rest of the process.
/// - `merge` replaces whole records, never individual fields.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Looks up a session by code.
    async fn get(&self, code: &SessionCode) -> Option<Session>;

    /// Inserts or overwrites the session stored under its code.
    async fn put(&self, session: Session);

    /// Merges a snapshot from another replica.
    async fn merge(&self, remote: SessionMap) -> MergeReport;

    /// Returns a copy of every session currently known locally.
    async fn snapshot(&self) -> SessionMap;

    /// Pulls every reachable substrate and merges what it holds.
    ///
    /// Stores without external substrates have nothing to pull.
    async fn reconcile(&self) -> MergeReport {
        MergeReport::default()
    }
}
