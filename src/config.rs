//! Client configuration and its validation.

use crate::{ConfigError, Properties};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Credential handed to the analytics transport.
    pub write_key: String,
    /// Collection endpoint the transport delivers to.
    pub dataplane_url: String,
    /// Stable identity stamped on every event as the acting user.
    pub diagnostic_id: String,
    #[serde(default)]
    pub default_properties: Properties,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl ClientConfig {
    pub fn new(
        write_key: impl Into<String>,
        dataplane_url: impl Into<String>,
        diagnostic_id: impl Into<String>,
    ) -> Self {
        Self {
            write_key: write_key.into(),
            dataplane_url: dataplane_url.into(),
            diagnostic_id: diagnostic_id.into(),
            default_properties: Properties::new(),
            enabled: true,
        }
    }

    pub fn with_default_property(mut self, key: impl ToString, value: impl Into<Value>) -> Self {
        self.default_properties = self.default_properties.with(key, value);
        self
    }

    pub fn with_default_properties(mut self, properties: Properties) -> Self {
        self.default_properties.apply_defaults(&properties);
        self
    }

    /// Adds `platform` and `telemetry_version` to the default properties.
    pub fn with_runtime_defaults(self) -> Self {
        self.with_default_property("platform", std::env::consts::OS)
            .with_default_property("telemetry_version", env!("CARGO_PKG_VERSION"))
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Reads a config from a JSON file. The result is not validated.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Checks required fields in order: write key, dataplane URL, diagnostic ID.
    /// The first empty one is reported.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.write_key.is_empty() {
            return Err(ConfigError::MissingField("write_key"));
        }

        if self.dataplane_url.is_empty() {
            return Err(ConfigError::MissingField("dataplane_url"));
        }

        if self.diagnostic_id.is_empty() {
            return Err(ConfigError::MissingField("diagnostic_id"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn valid() -> ClientConfig {
        ClientConfig::new("key", "https://dataplane.example.com", "diag-1")
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid().validate().is_ok());
        assert!(valid().with_default_property("a", 1).validate().is_ok());
    }

    #[test]
    fn test_missing_write_key() {
        let config = ClientConfig {
            write_key: String::new(),
            ..valid()
        };
        assert_eq!(config.validate().unwrap_err().field(), Some("write_key"));
    }

    #[test]
    fn test_missing_dataplane_url() {
        let config = ClientConfig {
            dataplane_url: String::new(),
            ..valid()
        };
        assert_eq!(config.validate().unwrap_err().field(), Some("dataplane_url"));
    }

    #[test]
    fn test_missing_diagnostic_id() {
        let config = ClientConfig {
            diagnostic_id: String::new(),
            ..valid()
        };
        assert_eq!(config.validate().unwrap_err().field(), Some("diagnostic_id"));
    }

    #[test]
    fn test_first_missing_field_wins() {
        let config = ClientConfig::default();
        assert_eq!(config.validate().unwrap_err().field(), Some("write_key"));

        let config = ClientConfig {
            write_key: "key".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().field(), Some("dataplane_url"));
    }

    #[test]
    fn test_runtime_defaults() {
        let config = valid().with_runtime_defaults();
        assert_eq!(
            config.default_properties.get("platform"),
            Some(&json!(std::env::consts::OS))
        );
        assert!(config.default_properties.get("telemetry_version").is_some());
    }

    #[test]
    fn test_from_json_file_applies_serde_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("telemetry.json");
        std::fs::write(
            &path,
            r#"{"write_key":"k","dataplane_url":"https://d","diagnostic_id":"id"}"#,
        )
        .unwrap();

        let config = ClientConfig::from_json_file(&path).unwrap();
        assert!(config.enabled);
        assert!(config.default_properties.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_file_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            ClientConfig::from_json_file(&missing),
            Err(ConfigError::Io { .. })
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{not json").unwrap();
        assert!(matches!(
            ClientConfig::from_json_file(&broken),
            Err(ConfigError::Parse { .. })
        ));
    }
}
