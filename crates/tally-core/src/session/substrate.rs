//! Key-value persistence substrates and the persisted blob layout.
//!
//! Every substrate holds the whole session map as one JSON blob stored
//! under [`SESSIONS_BLOB_KEY`].

use super::merge::SessionMap;
use crate::error::Result;
use thiserror::Error;

/// Key under which the session map blob is stored.
pub const SESSIONS_BLOB_KEY: &str = "expertSessions";

/// Errors raised by a single substrate.
#[derive(Debug, Error)]
pub enum SubstrateError {
    /// I/O error while reading or writing the backing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file could not be locked.
    #[error("lock error: {0}")]
    Lock(String),

    /// The substrate refused the write (quota, read-only, detached).
    #[error("substrate unavailable: {0}")]
    Unavailable(String),
}

/// An origin-scoped string key-value store.
///
/// Implementations are synchronous: calls are expected to be small, local
/// and best-effort.
pub trait KeyValueSubstrate: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Reads the value stored under `key`, `None` if absent.
    fn get_item(&self, key: &str) -> std::result::Result<Option<String>, SubstrateError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> std::result::Result<(), SubstrateError>;

    /// Reads the value under `key`, passes it to `f` and stores the result.
    ///
    /// Implementations that can hold a lock across the read and the write
    /// should override this; the default is a plain read followed by a write.
    fn update_item(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> std::result::Result<String, SubstrateError>,
    ) -> std::result::Result<(), SubstrateError> {
        let current = self.get_item(key)?;
        let next = f(current)?;
        self.set_item(key, &next)
    }
}

/// Serializes the session map into the persisted blob.
pub fn encode_blob(sessions: &SessionMap) -> Result<String> {
    Ok(serde_json::to_string(sessions)?)
}

/// Parses a persisted blob. Blank blobs decode to an empty map.
pub fn decode_blob(blob: &str) -> Result<SessionMap> {
    if blob.trim().is_empty() {
        return Ok(SessionMap::new());
    }
    Ok(serde_json::from_str(blob)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{NewSession, Session, SessionCode};

    #[test]
    fn test_blob_is_keyed_by_code() {
        let session = Session::create(SessionCode::parse("QWE123").unwrap(), NewSession::default());
        let map = SessionMap::from([(session.code.clone(), session.clone())]);

        let blob = encode_blob(&map).unwrap();
        let value: serde_json::Value = serde_json::from_str(&blob).unwrap();
        assert_eq!(value["QWE123"]["name"], session.name);

        assert_eq!(decode_blob(&blob).unwrap(), map);
    }

    #[test]
    fn test_blank_blob_is_empty_map() {
        assert!(decode_blob("  ").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_blob_is_serialization_error() {
        let err = decode_blob("{not json").unwrap_err();
        assert!(matches!(err, crate::TallyError::Serialization { .. }));
    }
}
