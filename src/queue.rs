//! Bounded hand-off from callers to a background delivery thread.
//!
//! Pushing never blocks: a full queue rejects the item. Shutting down closes
//! the queue, lets the worker deliver everything still buffered, and joins it.

use anyhow::anyhow;
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

pub(crate) struct DeliveryQueue<T> {
    tx: Option<SyncSender<T>>,
    worker: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> DeliveryQueue<T> {
    /// Spawns the worker. `deliver` runs on the worker thread once per item;
    /// its failures are logged and the item is dropped.
    pub(crate) fn spawn<F>(name: &str, capacity: usize, mut deliver: F) -> anyhow::Result<Self>
    where
        F: FnMut(T) -> anyhow::Result<()> + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel::<T>(capacity);

        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                for item in rx {
                    if let Err(e) = deliver(item) {
                        warn!(error = %e, "Failed to deliver telemetry event");
                    }
                }
                debug!("Delivery queue drained");
            })
            .map_err(|e| anyhow!("failed to spawn delivery worker: {e}"))?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    pub(crate) fn push(&self, item: T) -> anyhow::Result<()> {
        let tx = self.tx.as_ref().ok_or_else(|| anyhow!("transport closed"))?;

        tx.try_send(item).map_err(|e| match e {
            TrySendError::Full(_) => anyhow!("queue full"),
            TrySendError::Disconnected(_) => anyhow!("delivery worker stopped"),
        })
    }

    /// Closes the queue and waits until every buffered item was handed to
    /// `deliver`. Later calls are no-ops.
    pub(crate) fn shutdown(&mut self) -> anyhow::Result<()> {
        self.tx.take();

        match self.worker.take() {
            Some(worker) => worker
                .join()
                .map_err(|_| anyhow!("delivery worker panicked")),
            None => Ok(()),
        }
    }
}

// Dropping without shutdown detaches the worker; it still drains the queue.
impl<T> Drop for DeliveryQueue<T> {
    fn drop(&mut self) {
        self.tx.take();
    }
}
