//! Whole-record merge of session maps.
//!
//! Two replicas are reconciled one record at a time: a remote record is
//! adopted when the local map has no entry for its code, or when it was
//! written more recently than the local entry. Fields are never combined, so
//! concurrent edits to the same session within one reconciliation interval
//! lose all but one writer's changes.

use super::code::SessionCode;
use super::model::Session;
use std::collections::BTreeMap;

/// The replicated mapping from code to session.
pub type SessionMap = BTreeMap<SessionCode, Session>;

/// What a merge pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Codes whose local record was replaced or added from the remote side
    pub adopted: Vec<SessionCode>,
    /// Number of remote records ignored because the local copy was as new or newer
    pub kept_local: usize,
}

impl MergeReport {
    pub fn changed(&self) -> bool {
        !self.adopted.is_empty()
    }

    /// Folds another pass into this report.
    pub fn absorb(&mut self, other: MergeReport) {
        for code in other.adopted {
            if !self.adopted.contains(&code) {
                self.adopted.push(code);
            }
        }
        self.kept_local += other.kept_local;
    }
}

/// Merges `remote` into `local` with last-writer-wins per record.
///
/// Ties on `updated_at` keep the local record, which makes merging the same
/// snapshot twice a no-op.
pub fn merge_into(local: &mut SessionMap, remote: SessionMap) -> MergeReport {
    let mut report = MergeReport::default();

    for (code, incoming) in remote {
        let adopt = match local.get(&code) {
            None => true,
            Some(existing) => incoming.updated_at > existing.updated_at,
        };

        if adopt {
            report.adopted.push(code.clone());
            local.insert(code, incoming);
        } else {
            report.kept_local += 1;
        }
    }

    report
}
