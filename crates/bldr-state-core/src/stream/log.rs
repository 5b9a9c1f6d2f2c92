// ── Build log stream ──
//
// Latest-value cell for live build-log content. Lifecycle is
// Empty -> Streaming -> Complete; once complete, pushes are dropped.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use strum::Display;
use tokio::sync::watch;
use tracing::{debug, trace};

use super::SnapshotStream;
use super::observer::{Handler, Observers, SubscriptionId};

/// Lifecycle of a `LogStream`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogState {
    Empty,
    Streaming,
    Complete,
}

/// The value delivered to subscribers: every line seen so far plus the state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogSnapshot {
    pub lines: Arc<[String]>,
    pub state: LogState,
}

impl LogSnapshot {
    fn empty() -> Self {
        Self {
            lines: Arc::from(Vec::<String>::new()),
            state: LogState::Empty,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == LogState::Complete
    }
}

struct Inner {
    latest: watch::Sender<LogSnapshot>,
    observers: Observers<LogSnapshot>,
}

/// A shared handle to one build's log output.
///
/// Cloning the handle shares the stream. Subscribers are called
/// synchronously, in subscription order, on every accepted push. A push
/// made from inside a subscriber is delivered once the current snapshot
/// has reached every subscriber.
#[derive(Clone)]
pub struct LogStream {
    inner: Arc<Inner>,
}

impl LogStream {
    pub fn new() -> Self {
        let (latest, _) = watch::channel(LogSnapshot::empty());
        Self {
            inner: Arc::new(Inner {
                latest,
                observers: Observers::new(),
            }),
        }
    }

    /// Replace the content with `lines`.
    ///
    /// Returns `false` (and delivers nothing) once the stream is complete.
    pub fn push<I, S>(&self, lines: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        self.emit(move |snap| {
            snap.lines = Arc::from(lines);
            snap.state = LogState::Streaming;
        })
    }

    /// Extend the content with a chunk and emit the cumulative snapshot.
    pub fn append<I, S>(&self, lines: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chunk: Vec<String> = lines.into_iter().map(Into::into).collect();
        self.emit(move |snap| {
            let mut all = snap.lines.to_vec();
            all.extend(chunk);
            snap.lines = Arc::from(all);
            snap.state = LogState::Streaming;
        })
    }

    /// Close the stream. Subscribers receive the final snapshot once and
    /// are then released. Returns `false` if it was already complete.
    ///
    /// Called from inside a subscriber, the final snapshot is delivered
    /// after the one being dispatched.
    pub fn mark_complete(&self) -> bool {
        let mut lines = None;
        self.inner.latest.send_if_modified(|snap| {
            if snap.is_complete() {
                return false;
            }
            snap.state = LogState::Complete;
            lines = Some(snap.lines.len());
            self.inner.observers.enqueue_last(snap.clone());
            true
        });

        let Some(lines) = lines else {
            debug!("log stream already complete");
            return false;
        };
        let delivered = self.inner.observers.drain();
        debug!(lines, delivered, "log stream complete");
        true
    }

    /// Register `handler`. It is called right away with the latest snapshot,
    /// then on every push until unsubscribed or the stream completes.
    pub fn subscribe(
        &self,
        handler: impl Fn(&LogSnapshot) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let handler: Handler<LogSnapshot> = Arc::new(handler);
        let id = self.inner.observers.subscribe(Arc::clone(&handler));
        let snap = self.latest();
        if snap.is_complete() {
            self.inner.observers.unsubscribe(id);
        }
        handler(&snap);
        id
    }

    /// Stop deliveries to `id`. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.observers.unsubscribe(id)
    }

    pub fn latest(&self) -> LogSnapshot {
        self.inner.latest.borrow().clone()
    }

    pub fn state(&self) -> LogState {
        self.inner.latest.borrow().state
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.observers.len()
    }

    /// Async view of the same stream.
    pub fn watch(&self) -> SnapshotStream<LogSnapshot> {
        SnapshotStream::new(self.inner.latest.subscribe())
    }

    /// True if both handles refer to the same underlying stream.
    pub fn same_stream(&self, other: &LogStream) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn emit(&self, update: impl FnOnce(&mut LogSnapshot)) -> bool {
        let mut lines = None;
        self.inner.latest.send_if_modified(|snap| {
            if snap.is_complete() {
                return false;
            }
            update(snap);
            lines = Some(snap.lines.len());
            self.inner.observers.enqueue(snap.clone());
            true
        });

        match lines {
            Some(lines) => {
                let delivered = self.inner.observers.drain();
                trace!(lines, delivered, "log snapshot pushed");
                true
            }
            None => {
                debug!("push after completion ignored");
                false
            }
        }
    }
}

impl Default for LogStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Streams compare by content: two handles are equal when their latest
/// snapshots are, whether or not they share the underlying cell.
impl PartialEq for LogStream {
    fn eq(&self, other: &Self) -> bool {
        self.same_stream(other) || self.latest() == other.latest()
    }
}

impl fmt::Debug for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snap = self.latest();
        f.debug_struct("LogStream")
            .field("state", &snap.state)
            .field("lines", &snap.lines.len())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl Serialize for LogStream {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.latest().lines.iter())
    }
}
