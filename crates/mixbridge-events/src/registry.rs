use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::event::{
    BinaryMessage, Connected, Event, EventKind, Loaded, RawMessage, StringMessage,
};

/// A registered event handler.
pub type Handler = Arc<dyn Fn(&Event) + Send + Sync>;

struct Entry {
    id: u64,
    handler: Handler,
}

#[derive(Default)]
struct Inner {
    handlers: Mutex<HashMap<EventKind, Vec<Entry>>>,
    next_id: AtomicU64,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, HashMap<EventKind, Vec<Entry>>> {
        self.handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn remove(&self, kind: EventKind, id: u64) -> bool {
        let mut handlers = self.lock();
        let Some(list) = handlers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|entry| entry.id != id);
        before != list.len()
    }
}

/// Per-kind ordered handler lists.
///
/// Clones share the same lists. Dispatch works on a snapshot taken when the
/// event fires, so handlers may subscribe or unsubscribe from inside a
/// handler.
#[derive(Clone, Default)]
pub struct SubscriptionRegistry {
    inner: Arc<Inner>,
}

/// Outcome of one [`SubscriptionRegistry::fire_event`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers that returned normally.
    pub delivered: usize,
    /// Handlers that panicked.
    pub failed: usize,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for `kind`.
    pub fn add_subscription<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.add_handler(kind, Arc::new(handler))
    }

    /// Append an already shared handler. Adding the same `Arc` twice creates
    /// two independent entries.
    pub fn add_handler(&self, kind: EventKind, handler: Handler) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .lock()
            .entry(kind)
            .or_default()
            .push(Entry { id, handler });
        tracing::trace!(%kind, subscription = id, "handler subscribed");

        Subscription {
            kind,
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    pub fn on_loaded<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Loaded) + Send + Sync + 'static,
    {
        self.add_subscription(EventKind::Loaded, move |event| {
            if let Event::Loaded(loaded) = event {
                handler(loaded);
            }
        })
    }

    pub fn on_connected<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Connected) + Send + Sync + 'static,
    {
        self.add_subscription(EventKind::Connected, move |event| {
            if let Event::Connected(connected) = event {
                handler(connected);
            }
        })
    }

    pub fn on_string_message<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&StringMessage) + Send + Sync + 'static,
    {
        self.add_subscription(EventKind::StringMessageReceived, move |event| {
            if let Event::StringMessageReceived(message) = event {
                handler(message);
            }
        })
    }

    pub fn on_binary_message<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&BinaryMessage) + Send + Sync + 'static,
    {
        self.add_subscription(EventKind::BinaryMessageReceived, move |event| {
            if let Event::BinaryMessageReceived(message) = event {
                handler(message);
            }
        })
    }

    pub fn on_raw_message<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&RawMessage) + Send + Sync + 'static,
    {
        self.add_subscription(EventKind::RawMessageReceived, move |event| {
            if let Event::RawMessageReceived(message) = event {
                handler(message);
            }
        })
    }

    /// Handlers currently registered for `kind`, in dispatch order.
    pub fn get_subscriptions(&self, kind: EventKind) -> Vec<Handler> {
        self.inner
            .lock()
            .get(&kind)
            .map(|list| list.iter().map(|entry| entry.handler.clone()).collect())
            .unwrap_or_default()
    }

    pub fn subscription_count(&self, kind: EventKind) -> usize {
        self.inner.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Drop every handler for `kind`.
    pub fn clear(&self, kind: EventKind) {
        self.inner.lock().remove(&kind);
    }

    pub fn clear_all(&self) {
        self.inner.lock().clear();
    }

    /// Invoke every handler registered for the event's kind, in order.
    ///
    /// A handler panic is caught and logged; the remaining handlers still
    /// run and nothing propagates to the caller.
    pub fn fire_event(&self, event: &Event) -> DispatchReport {
        let kind = event.kind();
        let snapshot: Vec<(u64, Handler)> = self
            .inner
            .lock()
            .get(&kind)
            .map(|list| {
                list.iter()
                    .map(|entry| (entry.id, entry.handler.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let mut report = DispatchReport::default();
        for (id, handler) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(()) => report.delivered += 1,
                Err(panic) => {
                    report.failed += 1;
                    tracing::error!(
                        %kind,
                        subscription = id,
                        error = panic_message(panic.as_ref()),
                        "event handler panicked"
                    );
                }
            }
        }

        tracing::trace!(
            %kind,
            delivered = report.delivered,
            failed = report.failed,
            "event dispatched"
        );
        report
    }
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.inner.lock();
        let mut dbg = f.debug_map();
        for kind in EventKind::ALL {
            if let Some(list) = handlers.get(&kind) {
                dbg.entry(&kind, &list.len());
            }
        }
        dbg.finish()
    }
}

/// Handle returned by registration.
///
/// Dropping the handle leaves the handler registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug, Clone)]
pub struct Subscription {
    kind: EventKind,
    id: u64,
    registry: Weak<Inner>,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Remove the handler this handle was issued for. Other entries holding
    /// the same handler are left alone. Returns false if it was already gone.
    pub fn unsubscribe(&self) -> bool {
        let Some(inner) = self.registry.upgrade() else {
            return false;
        };
        let removed = inner.remove(self.kind, self.id);
        if removed {
            tracing::trace!(kind = %self.kind, subscription = self.id, "handler unsubscribed");
        }
        removed
    }
}

impl fmt::Debug for Inner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inner").finish_non_exhaustive()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
