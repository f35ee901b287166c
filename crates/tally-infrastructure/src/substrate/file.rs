//! Directory-backed substrate.
//!
//! Each key is one file, `<dir>/<key>.json`, replaced atomically on every
//! write. Several processes pointing at the same directory share entries,
//! which makes a directory the equivalent of a browser origin.

use crate::storage::{AtomicFile, AtomicFileError};
use std::path::{Path, PathBuf};
use tally_core::session::{KeyValueSubstrate, SubstrateError};

#[derive(Debug, Clone)]
pub struct FileSubstrate {
    name: String,
    dir: PathBuf,
}

impl FileSubstrate {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            name: format!("file:{}", dir.display()),
            dir,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, key: &str) -> Result<AtomicFile, SubstrateError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(SubstrateError::Unavailable(format!("invalid key '{}'", key)));
        }
        Ok(AtomicFile::new(self.dir.join(format!("{}.json", key))))
    }
}

impl From<AtomicFileError> for SubstrateError {
    fn from(err: AtomicFileError) -> Self {
        match err {
            AtomicFileError::Io(e) => SubstrateError::Io(e),
            AtomicFileError::Lock(msg) => SubstrateError::Lock(msg),
            other => SubstrateError::Unavailable(other.to_string()),
        }
    }
}

impl KeyValueSubstrate for FileSubstrate {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_item(&self, key: &str) -> Result<Option<String>, SubstrateError> {
        Ok(self.file_for(key)?.read()?)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SubstrateError> {
        Ok(self.file_for(key)?.write(value)?)
    }

    /// Holds the key's lock file across the read and the write, so writers
    /// in other processes cannot interleave.
    fn update_item(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String, SubstrateError>,
    ) -> Result<(), SubstrateError> {
        self.file_for(key)?.update(|current| f(current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_key_reads_none() {
        let temp_dir = TempDir::new().unwrap();
        let substrate = FileSubstrate::new(temp_dir.path());
        assert_eq!(substrate.get_item("expertSessions").unwrap(), None);
    }

    #[test]
    fn test_write_creates_origin_dir() {
        let temp_dir = TempDir::new().unwrap();
        let origin = temp_dir.path().join("origins").join("a");
        let substrate = FileSubstrate::new(&origin);

        substrate.set_item("expertSessions", "{}").unwrap();

        assert!(origin.join("expertSessions.json").exists());
        assert_eq!(substrate.get_item("expertSessions").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_two_handles_share_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        let writer = FileSubstrate::new(temp_dir.path());
        let reader = FileSubstrate::new(temp_dir.path());

        writer.set_item("k", "v").unwrap();
        assert_eq!(reader.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_update_item_appends_across_handles() {
        let temp_dir = TempDir::new().unwrap();
        let first = FileSubstrate::new(temp_dir.path());
        let second = FileSubstrate::new(temp_dir.path());

        first.set_item("log", "a").unwrap();
        second
            .update_item("log", &mut |current| Ok(format!("{}b", current.unwrap_or_default())))
            .unwrap();
        first
            .update_item("log", &mut |current| Ok(format!("{}c", current.unwrap_or_default())))
            .unwrap();

        assert_eq!(first.get_item("log").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_failed_update_leaves_value() {
        let temp_dir = TempDir::new().unwrap();
        let substrate = FileSubstrate::new(temp_dir.path());
        substrate.set_item("k", "v").unwrap();

        let result = substrate.update_item("k", &mut |_| {
            Err(SubstrateError::Unavailable("refused".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(substrate.get_item("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_path_like_keys_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let substrate = FileSubstrate::new(temp_dir.path());
        assert!(matches!(
            substrate.set_item("../escape", "x"),
            Err(SubstrateError::Unavailable(_))
        ));
    }
}
