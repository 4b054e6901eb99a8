use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} should not be empty")]
    MissingField(&'static str),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Name of the missing field, if this is a validation failure.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ConfigError::MissingField(field) => Some(field),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry: config validation failed: {0}")]
    Config(#[from] ConfigError),

    #[error("telemetry: failed to create transport: {0}")]
    Connect(#[source] anyhow::Error),

    #[error("telemetry: failed to track event: {0}")]
    Track(#[source] anyhow::Error),

    #[error("telemetry: failed to close client: {0}")]
    Close(#[source] anyhow::Error),

    #[error("telemetry: client is closed")]
    Closed,
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
