// ── Ordered synchronous observers ──
//
// Handlers are invoked in subscription order. Values are queued and
// delivered run-to-completion: a value raised from inside a handler waits
// until every handler has seen the current one. The handler list is
// cloned out of the lock before dispatch, so a handler may subscribe,
// unsubscribe, or raise another value without deadlocking.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Callback registered with a `LogStream` or `Store`.
pub type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Opaque handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Entries<T> {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler<T>)>,
}

struct Pending<T> {
    value: T,
    // Release every handler once this value is delivered.
    last: bool,
}

struct Dispatch<T> {
    running: bool,
    queue: VecDeque<Pending<T>>,
}

pub(crate) struct Observers<T> {
    entries: Mutex<Entries<T>>,
    dispatch: Mutex<Dispatch<T>>,
}

impl<T> Observers<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(Entries {
                next_id: 0,
                handlers: Vec::new(),
            }),
            dispatch: Mutex::new(Dispatch {
                running: false,
                queue: VecDeque::new(),
            }),
        }
    }

    pub(crate) fn subscribe(&self, handler: Handler<T>) -> SubscriptionId {
        let mut entries = self.entries();
        let id = SubscriptionId(entries.next_id);
        entries.next_id += 1;
        entries.handlers.push((id, handler));
        id
    }

    /// Returns `true` if the subscription existed.
    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries();
        let before = entries.handlers.len();
        entries.handlers.retain(|(sid, _)| *sid != id);
        entries.handlers.len() != before
    }

    /// Queue `value` without delivering it. Callers that hold their own
    /// write lock enqueue under it, so queue order matches write order.
    pub(crate) fn enqueue(&self, value: T) {
        self.dispatch().queue.push_back(Pending { value, last: false });
    }

    /// Queue a final `value`: once delivered, every handler is dropped.
    pub(crate) fn enqueue_last(&self, value: T) {
        self.dispatch().queue.push_back(Pending { value, last: true });
    }

    /// Deliver queued values in order until the queue is empty.
    ///
    /// Returns the number of handler calls made. A call made while another
    /// drain is running returns 0 at once; the running drain delivers the
    /// value after the current one.
    pub(crate) fn drain(&self) -> usize {
        {
            let mut dispatch = self.dispatch();
            if dispatch.running {
                return 0;
            }
            dispatch.running = true;
        }
        let _running = Running(self);

        let mut delivered = 0;
        loop {
            let next = {
                let mut dispatch = self.dispatch();
                let next = dispatch.queue.pop_front();
                if next.is_none() {
                    dispatch.running = false;
                }
                next
            };
            let Some(Pending { value, last }) = next else {
                break;
            };

            let handlers: Vec<Handler<T>> = self
                .entries()
                .handlers
                .iter()
                .map(|(_, h)| Arc::clone(h))
                .collect();
            for handler in &handlers {
                handler(&value);
            }
            delivered += handlers.len();
            if last {
                self.entries().handlers.clear();
            }
        }
        tracing::trace!(delivered, "observers notified");
        delivered
    }

    pub(crate) fn len(&self) -> usize {
        self.entries().handlers.len()
    }

    // A panicking handler must not wedge the stream for everyone else.
    fn entries(&self) -> MutexGuard<'_, Entries<T>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self) -> MutexGuard<'_, Dispatch<T>> {
        self.dispatch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// Frees the dispatcher if a handler unwinds mid-drain.
struct Running<'a, T>(&'a Observers<T>);

impl<T> Drop for Running<'_, T> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.dispatch().running = false;
        }
    }
}
