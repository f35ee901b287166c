//! Replicated session store.
//!
//! The store keeps an in-memory map that is authoritative for the running
//! context and mirrors it, as one JSON blob, into every configured
//! substrate. Substrate failures are logged and swallowed: a write that no
//! substrate accepted still lives in the cache until the process exits.
//!
//! Writes never replace a substrate's blob outright. Each write re-reads
//! the blob under the substrate's lock and merges the cache into it record
//! by record, so sessions written by other contexts survive. Substrate I/O
//! runs on the blocking pool.

use crate::paths::TallyPaths;
use crate::substrate::{FileSubstrate, MemorySubstrate};
use async_trait::async_trait;
use std::sync::Arc;
use tally_core::config::StorageConfig;
use tally_core::session::{
    KeyValueSubstrate, MergeReport, Session, SessionCode, SessionMap, SessionStore,
    SubstrateError, decode_blob, encode_blob, merge_into,
};
use tally_core::{Result, TallyError};
use tokio::sync::RwLock;

type Substrates = Arc<[Arc<dyn KeyValueSubstrate>]>;

/// A [`SessionStore`] backed by an in-memory cache and N substrates.
pub struct ReplicatedSessionStore {
    cache: RwLock<SessionMap>,
    substrates: Substrates,
    blob_key: Arc<str>,
}

impl ReplicatedSessionStore {
    /// Creates an empty store over `substrates`. Call [`load`](Self::load)
    /// to hydrate the cache.
    pub fn new(substrates: Vec<Arc<dyn KeyValueSubstrate>>, blob_key: impl Into<String>) -> Self {
        let blob_key: String = blob_key.into();
        Self {
            cache: RwLock::new(SessionMap::new()),
            substrates: substrates.into(),
            blob_key: blob_key.into(),
        }
    }

    /// Builds the substrate list described by `config`: the process-wide
    /// memory substrate first, then one file substrate per origin.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let mut substrates: Vec<Arc<dyn KeyValueSubstrate>> = Vec::new();
        substrates.push(MemorySubstrate::process_wide());

        if config.origins.is_empty() {
            let dir = TallyPaths::default_origin_dir()
                .map_err(|e| TallyError::config(e.to_string()))?;
            substrates.push(Arc::new(FileSubstrate::new(dir)));
        } else {
            for origin in &config.origins {
                substrates.push(Arc::new(FileSubstrate::new(origin.clone())));
            }
        }

        Ok(Self::new(substrates, config.blob_key.clone()))
    }

    /// [`from_config`](Self::from_config) followed by [`load`](Self::load).
    pub async fn open(config: &StorageConfig) -> Result<Self> {
        let store = Self::from_config(config)?;
        store.load().await;
        Ok(store)
    }

    pub fn substrate_names(&self) -> Vec<&str> {
        self.substrates.iter().map(|s| s.name()).collect()
    }

    /// Hydrates the cache from every substrate without writing back.
    pub async fn load(&self) -> MergeReport {
        let remote = self.pull().await;
        let mut cache = self.cache.write().await;
        let report = merge_into(&mut cache, remote);
        tracing::debug!(
            sessions = cache.len(),
            adopted = report.adopted.len(),
            "session store loaded"
        );
        report
    }

    async fn pull(&self) -> SessionMap {
        let substrates = Arc::clone(&self.substrates);
        let key = Arc::clone(&self.blob_key);
        match tokio::task::spawn_blocking(move || pull_blocking(&substrates, &key)).await {
            Ok(map) => map,
            Err(e) => {
                tracing::error!(error = %e, "substrate read task failed");
                SessionMap::new()
            }
        }
    }

    async fn push(&self, map: SessionMap) {
        let substrates = Arc::clone(&self.substrates);
        let key = Arc::clone(&self.blob_key);
        if let Err(e) =
            tokio::task::spawn_blocking(move || push_blocking(&substrates, &key, &map)).await
        {
            tracing::error!(error = %e, "substrate write task failed");
        }
    }
}

/// Reads and merges the blob of every substrate.
///
/// Unreadable or undecodable blobs count as empty.
fn pull_blocking(substrates: &[Arc<dyn KeyValueSubstrate>], key: &str) -> SessionMap {
    let mut merged = SessionMap::new();

    for substrate in substrates {
        let blob = match substrate.get_item(key) {
            Ok(Some(blob)) => blob,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(substrate = substrate.name(), error = %e, "substrate read failed");
                continue;
            }
        };

        match decode_blob(&blob) {
            Ok(map) => {
                merge_into(&mut merged, map);
            }
            Err(e) => {
                tracing::warn!(
                    substrate = substrate.name(),
                    error = %e,
                    "ignoring undecodable session blob"
                );
            }
        }
    }

    merged
}

/// Merges `map` into every substrate's blob, best-effort.
///
/// Records are compared per code with the usual last-writer-wins rule, ties
/// keeping what the substrate already holds.
fn push_blocking(substrates: &[Arc<dyn KeyValueSubstrate>], key: &str, map: &SessionMap) {
    for substrate in substrates {
        let result = substrate.update_item(key, &mut |current| {
            let mut stored = match current.as_deref().map(decode_blob) {
                Some(Ok(stored)) => stored,
                Some(Err(e)) => {
                    tracing::warn!(
                        substrate = substrate.name(),
                        error = %e,
                        "replacing undecodable session blob"
                    );
                    SessionMap::new()
                }
                None => SessionMap::new(),
            };
            merge_into(&mut stored, map.clone());
            encode_blob(&stored).map_err(|e| SubstrateError::Unavailable(e.to_string()))
        });

        if let Err(e) = result {
            tracing::warn!(substrate = substrate.name(), error = %e, "substrate write failed");
        }
    }
}

#[async_trait]
impl SessionStore for ReplicatedSessionStore {
    async fn get(&self, code: &SessionCode) -> Option<Session> {
        self.cache.read().await.get(code).cloned()
    }

    async fn put(&self, session: Session) {
        let mut cache = self.cache.write().await;
        tracing::debug!(code = %session.code, phase = %session.phase, "put session");
        cache.insert(session.code.clone(), session.clone());
        self.push(SessionMap::from([(session.code.clone(), session)])).await;
    }

    async fn merge(&self, remote: SessionMap) -> MergeReport {
        let mut cache = self.cache.write().await;
        let report = merge_into(&mut cache, remote);
        self.push(cache.clone()).await;
        report
    }

    async fn snapshot(&self) -> SessionMap {
        self.cache.read().await.clone()
    }

    async fn reconcile(&self) -> MergeReport {
        let remote = self.pull().await;
        let mut cache = self.cache.write().await;
        let report = merge_into(&mut cache, remote);
        self.push(cache.clone()).await;
        tracing::debug!(
            adopted = report.adopted.len(),
            kept_local = report.kept_local,
            "reconciled session store"
        );
        report
    }
}
