//! The analytics collaborator boundary.
//!
//! A [`Transport`] owns queuing, batching and delivery of [`TrackRecord`]s to
//! the collection endpoint. [`TelemetryClient`](crate::TelemetryClient) only
//! hands records over and closes the transport on shutdown.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// One emitted event as handed to the transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRecord {
    pub event: String,
    pub user_id: String,
    pub properties: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

pub trait Transport: Send + Sync {
    fn enqueue(&self, record: TrackRecord) -> anyhow::Result<()>;

    /// Flushes whatever the transport buffers and releases it.
    fn close(&mut self) -> anyhow::Result<()>;
}

#[cfg(feature = "posthog")]
pub use self::posthog::PostHogTransport;

#[cfg(any(test, feature = "test-util"))]
pub use self::memory::{MemorySink, MemoryTransport};

#[cfg(feature = "posthog")]
mod posthog {
    use super::*;
    use crate::queue::{DeliveryQueue, DEFAULT_QUEUE_CAPACITY};
    use posthog_rs::{client, ClientOptionsBuilder, Event};

    /// Transport backed by a PostHog client. The write key is the project API
    /// key and the dataplane URL is the capture endpoint.
    ///
    /// Events are captured on a background thread; `enqueue` only converts the
    /// record and queues it.
    pub struct PostHogTransport {
        queue: DeliveryQueue<Event>,
    }

    impl PostHogTransport {
        pub fn connect(write_key: &str, endpoint: &str) -> anyhow::Result<Self> {
            Self::with_capacity(write_key, endpoint, DEFAULT_QUEUE_CAPACITY)
        }

        /// Like [`connect`](Self::connect) with at most `capacity` events
        /// waiting for delivery.
        pub fn with_capacity(
            write_key: &str,
            endpoint: &str,
            capacity: usize,
        ) -> anyhow::Result<Self> {
            let options = ClientOptionsBuilder::default()
                .api_key(write_key.to_string())
                .api_endpoint(endpoint.to_string())
                .build()
                .map_err(|e| anyhow!("invalid posthog options: {e}"))?;
            let posthog = client(options);

            let queue = DeliveryQueue::spawn("posthog-delivery", capacity, move |event| {
                posthog
                    .capture(event)
                    .map_err(|e| anyhow!("posthog capture failed: {e}"))
            })?;

            Ok(Self { queue })
        }
    }

    fn to_event(record: TrackRecord) -> anyhow::Result<Event> {
        let mut event = Event::new(record.event, record.user_id);
        event
            .set_timestamp(record.timestamp)
            .map_err(|e| anyhow!("invalid event timestamp: {e}"))?;
        for (key, value) in record.properties {
            event
                .insert_prop(key, value)
                .map_err(|e| anyhow!("failed to serialize property: {e}"))?;
        }
        Ok(event)
    }

    impl Transport for PostHogTransport {
        fn enqueue(&self, record: TrackRecord) -> anyhow::Result<()> {
            self.queue.push(to_event(record)?)
        }

        fn close(&mut self) -> anyhow::Result<()> {
            self.queue.shutdown()
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
mod memory {
    use super::*;
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    #[derive(Debug, Default)]
    struct SinkState {
        records: Vec<TrackRecord>,
        enqueue_attempts: usize,
        close_calls: usize,
        fail_enqueue: Option<String>,
        fail_close: Option<String>,
    }

    /// Shared view into what [`MemoryTransport`]s received.
    ///
    /// Cloning the sink yields another handle to the same state, so a test can
    /// keep one while the client owns the transport.
    #[derive(Debug, Clone, Default)]
    pub struct MemorySink {
        state: Arc<Mutex<SinkState>>,
    }

    impl MemorySink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn transport(&self) -> MemoryTransport {
            MemoryTransport {
                sink: self.clone(),
                closed: false,
            }
        }

        pub fn records(&self) -> Vec<TrackRecord> {
            self.lock().records.clone()
        }

        pub fn enqueue_attempts(&self) -> usize {
            self.lock().enqueue_attempts
        }

        pub fn close_calls(&self) -> usize {
            self.lock().close_calls
        }

        /// Makes every following enqueue fail with `message`.
        pub fn fail_enqueue(&self, message: impl Into<String>) {
            self.lock().fail_enqueue = Some(message.into());
        }

        /// Makes every following close fail with `message`.
        pub fn fail_close(&self, message: impl Into<String>) {
            self.lock().fail_close = Some(message.into());
        }

        fn lock(&self) -> MutexGuard<'_, SinkState> {
            self.state.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// In-memory transport for tests.
    #[derive(Debug)]
    pub struct MemoryTransport {
        sink: MemorySink,
        closed: bool,
    }

    impl Transport for MemoryTransport {
        fn enqueue(&self, record: TrackRecord) -> anyhow::Result<()> {
            let mut state = self.sink.lock();
            state.enqueue_attempts += 1;

            if self.closed {
                return Err(anyhow!("transport closed"));
            }
            if let Some(message) = &state.fail_enqueue {
                return Err(anyhow!(message.clone()));
            }

            state.records.push(record);
            Ok(())
        }

        fn close(&mut self) -> anyhow::Result<()> {
            let mut state = self.sink.lock();
            state.close_calls += 1;
            self.closed = true;

            match &state.fail_close {
                Some(message) => Err(anyhow!(message.clone())),
                None => Ok(()),
            }
        }
    }
}
