use crate::transport::{TrackRecord, Transport};
use crate::{ClientConfig, Properties, TelemetryError, TelemetryResult};
use chrono::Utc;
use tracing::{debug, trace, warn};

/// Emits events to an analytics transport on behalf of one configured identity.
///
/// Every event carries the configured default properties. On a key collision
/// the default replaces the value passed to [`track`](Self::track).
pub struct TelemetryClient {
    config: ClientConfig,
    transport: Option<Box<dyn Transport>>,
    closed: bool,
}

impl TelemetryClient {
    /// Validates `config` and builds a PostHog-backed client.
    #[cfg(feature = "posthog")]
    pub fn new(config: ClientConfig) -> TelemetryResult<Self> {
        Self::with_transport(config, crate::transport::PostHogTransport::connect)
    }

    /// Validates `config`, then builds the transport from its write key and
    /// dataplane URL. `connect` is not called when validation fails.
    pub fn with_transport<T, F>(config: ClientConfig, connect: F) -> TelemetryResult<Self>
    where
        T: Transport + 'static,
        F: FnOnce(&str, &str) -> anyhow::Result<T>,
    {
        config.validate()?;

        let transport: Option<Box<dyn Transport>> = if config.enabled {
            let transport = connect(&config.write_key, &config.dataplane_url)
                .map_err(TelemetryError::Connect)?;
            Some(Box::new(transport))
        } else {
            None
        };

        debug!(
            endpoint = %config.dataplane_url,
            diagnostic_id = %config.diagnostic_id,
            defaults = config.default_properties.len(),
            enabled = config.enabled,
            "Telemetry client created"
        );

        Ok(Self {
            config,
            transport,
            closed: false,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Merges the default properties into `properties` and enqueues the event.
    ///
    /// Fails with [`TelemetryError::Closed`] after [`close`](Self::close) and
    /// with [`TelemetryError::Track`] when the transport rejects the record.
    pub fn track(
        &self,
        event_name: &str,
        properties: impl Into<Option<Properties>>,
    ) -> TelemetryResult<()> {
        if self.closed {
            return Err(TelemetryError::Closed);
        }

        let Some(transport) = &self.transport else {
            return Ok(());
        };

        let mut properties = properties.into().unwrap_or_default();
        properties.apply_defaults(&self.config.default_properties);

        trace!(event = event_name, properties = properties.len(), "Enqueueing event");

        transport
            .enqueue(TrackRecord {
                event: event_name.to_string(),
                user_id: self.config.diagnostic_id.clone(),
                properties: properties.into_map(),
                timestamp: Utc::now(),
            })
            .map_err(TelemetryError::Track)
    }

    /// Closes the transport. Calling it again is a no-op.
    ///
    /// The transport is released even when closing it fails.
    pub fn close(&mut self) -> TelemetryResult<()> {
        self.closed = true;

        let Some(mut transport) = self.transport.take() else {
            return Ok(());
        };

        debug!("Closing telemetry client");
        transport.close().map_err(TelemetryError::Close)
    }
}

impl Drop for TelemetryClient {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "Failed to close telemetry client on drop");
        }
    }
}
