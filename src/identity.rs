//! Stable per-installation diagnostic ID.
//!
//! The ID is generated once and persisted as JSON so every run of the same
//! installation reports under the same identity.

use crate::ConfigError;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

const FILE_NAME: &str = "diagnostic_id.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticId {
    id: String,
    created_at: DateTime<Utc>,
}

impl DiagnosticId {
    pub fn generate() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
        }
    }

    /// `<config dir>/<app_name>/diagnostic_id.json`, if the platform has a
    /// config directory.
    pub fn default_path(app_name: &str) -> Option<PathBuf> {
        ProjectDirs::from("", "", app_name).map(|dirs| dirs.config_dir().join(FILE_NAME))
    }

    /// Reads the ID stored at `path`, or generates one and writes it there.
    /// A file that does not hold a valid ID is replaced.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<DiagnosticId>(&raw) {
                Ok(existing) if !existing.id.is_empty() => return Ok(existing),
                _ => debug!(path = %path.display(), "Replacing invalid diagnostic id file"),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        }

        let fresh = Self::generate();
        fresh.save(path)?;
        debug!(path = %path.display(), id = %fresh.id, "Generated diagnostic id");
        Ok(fresh)
    }

    fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let raw = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, raw).map_err(io_err)
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl std::fmt::Display for DiagnosticId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_and_reuses_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(FILE_NAME);

        let first = DiagnosticId::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert!(Uuid::parse_str(first.as_str()).is_ok());

        let second = DiagnosticId::load_or_create(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_replaces_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FILE_NAME);
        std::fs::write(&path, "garbage").unwrap();

        let id = DiagnosticId::load_or_create(&path).unwrap();

        let reloaded = DiagnosticId::load_or_create(&path).unwrap();
        assert_eq!(id, reloaded);
    }

    #[test]
    fn test_unreadable_file_is_not_overwritten() {
        let dir = TempDir::new().unwrap();
        // A directory at the id path cannot be read as a file.
        let path = dir.path().join(FILE_NAME);
        std::fs::create_dir(&path).unwrap();

        let err = DiagnosticId::load_or_create(&path).unwrap_err();

        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(path.is_dir());
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(DiagnosticId::generate(), DiagnosticId::generate());
    }

    #[test]
    fn test_default_path_ends_with_file_name() {
        if let Some(path) = DiagnosticId::default_path("rudder-telemetry-test") {
            assert!(path.ends_with(FILE_NAME));
        }
    }

    #[test]
    fn test_feeds_client_config() {
        let dir = TempDir::new().unwrap();
        let id = DiagnosticId::load_or_create(dir.path().join(FILE_NAME)).unwrap();

        let config = crate::ClientConfig::new("key", "https://d", id.as_str());
        assert!(config.validate().is_ok());
        assert_eq!(config.diagnostic_id, id.to_string());
    }
}
