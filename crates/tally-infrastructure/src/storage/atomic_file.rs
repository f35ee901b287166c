//! Atomic file operations.
//!
//! Writes go to a temporary sibling, are fsynced, then renamed over the
//! target while an exclusive lock file is held. Readers never observe a
//! half-written file.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during atomic file operations.
#[derive(Debug, Error)]
pub enum AtomicFileError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML deserialization error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    /// File locking error.
    #[error("Lock error: {0}")]
    Lock(String),
}

/// A handle to a text file that is always replaced as a whole.
#[derive(Debug, Clone)]
pub struct AtomicFile {
    path: PathBuf,
}

impl AtomicFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file. Missing or blank files read as `None`.
    pub fn read(&self) -> Result<Option<String>, AtomicFileError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(content))
    }

    /// Replaces the file contents atomically under an exclusive lock.
    pub fn write(&self, contents: &str) -> Result<(), AtomicFileError> {
        let _lock = FileLock::acquire(&self.path)?;
        self.write_unlocked(contents)
    }

    fn write_unlocked(&self, contents: &str) -> Result<(), AtomicFileError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(contents.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Reads, transforms and writes back the file while holding the lock.
    pub fn update<F, E>(&self, f: F) -> Result<(), E>
    where
        F: FnOnce(Option<String>) -> Result<String, E>,
        E: From<AtomicFileError>,
    {
        let _lock = FileLock::acquire(&self.path)?;
        let current = self.read()?;
        let next = f(current)?;
        Ok(self.write_unlocked(&next)?)
    }

    fn temp_path(&self) -> Result<PathBuf, AtomicFileError> {
        let invalid = |msg: &str| {
            AtomicFileError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, msg.to_string()))
        };
        let parent = self
            .path
            .parent()
            .ok_or_else(|| invalid("Path has no parent directory"))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| invalid("Path has no file name"))?;

        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// A typed TOML file on top of [`AtomicFile`].
pub struct AtomicTomlFile<T> {
    file: AtomicFile,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicFile::new(path),
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Loads and deserializes the file, `None` if it is missing or blank.
    pub fn load(&self) -> Result<Option<T>, AtomicFileError> {
        match self.file.read()? {
            Some(content) => Ok(Some(toml::from_str(&content)?)),
            None => Ok(None),
        }
    }

    /// Serializes `data` and writes it atomically.
    pub fn save(&self, data: &T) -> Result<(), AtomicFileError> {
        let content = toml::to_string_pretty(data)?;
        self.file.write(&content)
    }
}

/// An exclusive lock on `<path>.lock`, released when dropped.
///
/// The lock file itself is left in place: every locker must contend on the
/// same inode.
struct FileLock {
    #[cfg_attr(not(unix), allow(dead_code))]
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, AtomicFileError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| AtomicFileError::Lock(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(FileLock { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use fs2::FileExt;
            let _ = self.file.unlock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicFile::new(temp_dir.path().join("nested").join("blob.json"));

        assert!(file.read().unwrap().is_none());
        file.write("{\"a\":1}").unwrap();
        assert_eq!(file.read().unwrap().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_no_temp_file_after_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("blob.json");
        AtomicFile::new(path.clone()).write("x").unwrap();

        assert!(path.exists());
        assert!(!temp_dir.path().join(".blob.json.tmp").exists());
    }

    #[test]
    fn test_lock_file_outlives_the_guard() {
        let temp_dir = TempDir::new().unwrap();
        let lock_path = temp_dir.path().join("blob.lock");
        let file = AtomicFile::new(temp_dir.path().join("blob.json"));

        file.write("x").unwrap();
        assert!(lock_path.exists());

        // A second writer reuses the same lock file and is not blocked.
        file.write("y").unwrap();
        assert!(lock_path.exists());
        assert_eq!(file.read().unwrap().as_deref(), Some("y"));
    }

    #[test]
    fn test_concurrent_updates_are_serialized() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("counter.txt");

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let file = AtomicFile::new(path.clone());
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        file.update(|current| {
                            let n: u32 = current.map(|c| c.trim().parse().unwrap_or(0)).unwrap_or(0);
                            Ok::<_, AtomicFileError>((n + 1).to_string())
                        })
                        .unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(AtomicFile::new(path).read().unwrap().as_deref(), Some("100"));
    }

    #[test]
    fn test_update_sees_previous_contents() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicFile::new(temp_dir.path().join("counter.txt"));

        for _ in 0..3 {
            file.update(|current| {
                let n: u32 = current.map(|c| c.trim().parse().unwrap_or(0)).unwrap_or(0);
                Ok::<_, AtomicFileError>((n + 1).to_string())
            })
            .unwrap();
        }
        assert_eq!(file.read().unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_toml_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<Sample>::new(temp_dir.path().join("sample.toml"));

        assert!(file.load().unwrap().is_none());
        let sample = Sample {
            name: "tally".to_string(),
            count: 3,
        };
        file.save(&sample).unwrap();
        assert_eq!(file.load().unwrap(), Some(sample));
    }
}
