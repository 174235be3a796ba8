// ── Reactive consumers ──
//
// Async alternatives to handler callbacks: a snapshot stream over the
// state `watch` channel and an event stream over the store's broadcast
// channel.

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio_stream::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tracing::warn;

use crate::store::{Snapshot, StoreEvent};

/// A subscription to store snapshots.
///
/// Provides point-in-time access and change notification via `changed()`
/// or by converting into a `Stream`.
pub struct StateStream {
    current: Snapshot,
    receiver: watch::Receiver<Snapshot>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation (or at the last `changed()`).
    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    /// The latest snapshot, which may be newer than `current()`.
    pub fn latest(&self) -> Snapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next mutation. Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream`, starting with the current snapshot.
    pub fn into_stream(self) -> WatchStream<Snapshot> {
        WatchStream::new(self.receiver)
    }
}

/// Every event emitted by a store after the stream was created.
pub struct EventStream {
    receiver: broadcast::Receiver<StoreEvent>,
}

impl EventStream {
    pub(crate) fn new(receiver: broadcast::Receiver<StoreEvent>) -> Self {
        Self { receiver }
    }

    /// Next event, or `None` once the store is gone.
    ///
    /// A consumer that falls behind the buffer skips the missed events.
    pub async fn recv(&mut self) -> Option<StoreEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event stream lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next event without waiting.
    pub fn try_recv(&mut self) -> Option<StoreEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "event stream lagged");
                }
                Err(_) => return None,
            }
        }
    }

    /// Convert into a `Stream`, dropping lag notifications.
    pub fn into_stream(self) -> impl Stream<Item = StoreEvent> + Send + Unpin {
        BroadcastStream::new(self.receiver).filter_map(Result::ok)
    }
}
