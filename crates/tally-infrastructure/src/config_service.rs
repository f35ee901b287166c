//! Configuration service.
//!
//! Loads [`TallyConfig`] from `config.toml` (by default
//! `~/.config/tally/config.toml`) and caches it.

use crate::paths::TallyPaths;
use crate::storage::{AtomicFileError, AtomicTomlFile};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tally_core::config::TallyConfig;
use tally_core::{Result, TallyError};

/// Loads and caches the configuration file.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    config: Arc<RwLock<Option<TallyConfig>>>,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Uses the platform config location.
    pub fn at_default_location() -> Result<Self> {
        let path = TallyPaths::config_file().map_err(|e| TallyError::config(e.to_string()))?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the configuration, reading the file on first access.
    ///
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn get_config(&self) -> Result<TallyConfig> {
        if let Ok(cached) = self.config.read() {
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let loaded = self.load()?;
        if let Ok(mut cache) = self.config.write() {
            *cache = Some(loaded.clone());
        }
        Ok(loaded)
    }

    pub fn invalidate_cache(&self) {
        if let Ok(mut cache) = self.config.write() {
            *cache = None;
        }
    }

    fn load(&self) -> Result<TallyConfig> {
        let file = AtomicTomlFile::<TallyConfig>::new(self.path.clone());
        match file.load() {
            Ok(Some(config)) => {
                tracing::debug!(path = %self.path.display(), "loaded configuration");
                Ok(config)
            }
            Ok(None) => {
                tracing::debug!(path = %self.path.display(), "no configuration file, using defaults");
                Ok(TallyConfig::default())
            }
            Err(e) => Err(config_error(&self.path, e)),
        }
    }

    /// Writes `config` atomically and refreshes the cache.
    pub fn save(&self, config: &TallyConfig) -> Result<()> {
        AtomicTomlFile::<TallyConfig>::new(self.path.clone())
            .save(config)
            .map_err(|e| config_error(&self.path, e))?;

        if let Ok(mut cache) = self.config.write() {
            *cache = Some(config.clone());
        }
        tracing::info!(path = %self.path.display(), "saved configuration");
        Ok(())
    }
}

fn config_error(path: &Path, err: AtomicFileError) -> TallyError {
    TallyError::config(format!("{}: {}", path.display(), err))
}
