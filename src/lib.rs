//! Minimal telemetry emission facade.
//!
//! A [`TelemetryClient`] validates its [`ClientConfig`], stamps every event
//! with the configured diagnostic ID and default properties, and hands the
//! result to a [`Transport`] that owns delivery.
//!
//! ```rust,no_run
//! use rudder_telemetry::{ClientConfig, Properties, TelemetryClient};
//!
//! # fn main() -> Result<(), rudder_telemetry::TelemetryError> {
//! let config = ClientConfig::new("write-key", "https://dataplane.example.com", "install-id")
//!     .with_runtime_defaults();
//! let mut client = TelemetryClient::new(config)?;
//!
//! client.track("Session Started", Properties::new().with("source", "cli"))?;
//! client.close()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod identity;
pub mod properties;
#[cfg(any(test, feature = "posthog"))]
mod queue;
pub mod telemetry;
pub mod transport;

pub use config::ClientConfig;
pub use error::{ConfigError, TelemetryError, TelemetryResult};
pub use identity::DiagnosticId;
pub use properties::Properties;
pub use telemetry::TelemetryClient;
#[cfg(feature = "posthog")]
pub use transport::PostHogTransport;
pub use transport::{TrackRecord, Transport};
#[cfg(any(test, feature = "test-util"))]
pub use transport::{MemorySink, MemoryTransport};
