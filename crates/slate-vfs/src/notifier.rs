//! Synchronous change notification.
//!
//! Every mutation hands its event to [`ChangeNotifier::notify`], which invokes each subscriber
//! before returning. One thread dispatches at a time; a mutation on another thread waits for the
//! in-flight dispatch to finish and then delivers its own event. A subscriber may itself mutate
//! the VFS: the resulting event is queued and delivered once the current event has reached every
//! subscriber, so all subscribers observe events in the same global order.
//!
//! Subscribers are isolated from each other: a panicking callback is caught, logged and skipped.

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};

use crate::change::{VfsEvent, VfsEventKind};

pub type WatchCallback = Arc<dyn Fn(&VfsEvent) + Send + Sync + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// A subscriber panicked while handling an event.
#[derive(Debug, Clone, thiserror::Error)]
#[error("watch subscriber {id:?} panicked while handling `{event}`: {message}")]
pub struct SubscriberFault {
    pub id: SubscriptionId,
    pub event: VfsEventKind,
    pub message: String,
}

#[derive(Default)]
struct NotifierInner {
    subscribers: Mutex<Vec<(SubscriptionId, WatchCallback)>>,
    pending: Mutex<VecDeque<VfsEvent>>,
    /// Thread currently delivering events, if any.
    dispatcher: Mutex<Option<ThreadId>>,
    dispatcher_idle: Condvar,
    next_id: AtomicU64,
}

#[track_caller]
pub(crate) fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(err) => {
            let loc = std::panic::Location::caller();
            tracing::error!(
                target: "slate.vfs",
                file = loc.file(),
                line = loc.line(),
                error = %err,
                "mutex poisoned; continuing with recovered guard"
            );
            err.into_inner()
        }
    }
}

/// Registry of change subscribers.
///
/// Cloning is cheap and yields a handle to the same registry.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    inner: Arc<NotifierInner>,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&VfsEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let callback: WatchCallback = Arc::new(callback);
        lock_recovering(&self.inner.subscribers).push((id, callback));
        Subscription {
            id,
            notifier: Arc::downgrade(&self.inner),
        }
    }

    /// Removes a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        remove_subscriber(&self.inner, id)
    }

    pub fn subscriber_count(&self) -> usize {
        lock_recovering(&self.inner.subscribers).len()
    }

    /// Delivers `event` to every current subscriber.
    ///
    /// When called from a subscriber while an event is being delivered, `event` is queued behind
    /// it and the outer call delivers it before returning. Calls from other threads block until
    /// the current dispatch is over.
    pub fn notify(&self, event: VfsEvent) {
        let me = thread::current().id();
        {
            let mut dispatcher = lock_recovering(&self.inner.dispatcher);
            if *dispatcher == Some(me) {
                lock_recovering(&self.inner.pending).push_back(event);
                return;
            }
            while dispatcher.is_some() {
                dispatcher = self
                    .inner
                    .dispatcher_idle
                    .wait(dispatcher)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            *dispatcher = Some(me);
        }

        let _turn = DispatchTurn { inner: &self.inner };
        lock_recovering(&self.inner.pending).push_back(event);
        self.drain();
    }

    fn drain(&self) {
        loop {
            let next = lock_recovering(&self.inner.pending).pop_front();
            let Some(event) = next else {
                return;
            };
            let subscribers = lock_recovering(&self.inner.subscribers).clone();
            for (id, callback) in subscribers {
                if let Err(fault) = dispatch_one(id, &callback, &event) {
                    tracing::error!(target: "slate.vfs", %fault, "watch subscriber failed");
                }
            }
        }
    }
}

/// Releases the dispatcher slot and wakes waiting threads.
struct DispatchTurn<'a> {
    inner: &'a NotifierInner,
}

impl Drop for DispatchTurn<'_> {
    fn drop(&mut self) {
        *lock_recovering(&self.inner.dispatcher) = None;
        self.inner.dispatcher_idle.notify_all();
    }
}

fn dispatch_one(
    id: SubscriptionId,
    callback: &WatchCallback,
    event: &VfsEvent,
) -> Result<(), SubscriberFault> {
    panic::catch_unwind(AssertUnwindSafe(|| callback(event))).map_err(|payload| SubscriberFault {
        id,
        event: event.kind(),
        message: panic_message(payload.as_ref()),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

fn remove_subscriber(inner: &NotifierInner, id: SubscriptionId) -> bool {
    let mut subscribers = lock_recovering(&inner.subscribers);
    let before = subscribers.len();
    subscribers.retain(|(existing, _)| *existing != id);
    subscribers.len() != before
}

/// Handle returned by `watch`. Dropping it keeps the subscription alive.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    notifier: Weak<NotifierInner>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Removes the subscription. Returns `false` if it was already removed or the VFS is gone.
    pub fn unsubscribe(self) -> bool {
        match self.notifier.upgrade() {
            Some(inner) => remove_subscriber(&inner, self.id),
            None => false,
        }
    }
}
