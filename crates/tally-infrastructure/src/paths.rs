//! Unified path management for tally configuration and session data.
//!
//! ```text
//! ~/.config/tally/             # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/tally/        # Data directory
//! └── origins/
//!     └── default/             # Default origin substrate
//!         └── expertSessions.json
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

const APP_DIR: &str = "tally";

/// Platform-specific locations used by tally.
pub struct TallyPaths;

impl TallyPaths {
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Directory of the origin used when the configuration names none.
    pub fn default_origin_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("origins").join("default"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_nested_under_app_dir() {
        if let (Ok(config), Ok(origin)) = (TallyPaths::config_file(), TallyPaths::default_origin_dir()) {
            assert!(config.ends_with("tally/config.toml"));
            assert!(origin.ends_with("tally/origins/default"));
        }
    }
}
