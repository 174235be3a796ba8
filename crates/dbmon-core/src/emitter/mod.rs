// ── Typed publish/subscribe ──
//
// Handlers register against an event *kind*; `emit` dispatches an event to
// every handler registered for its kind. Handlers are invoked after the
// registry lock is released, so a handler may subscribe or unsubscribe
// from inside its own callback.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::trace;

/// An event that can be routed by kind.
pub trait Event: Clone + Send + Sync + 'static {
    type Kind: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

/// Callback invoked for each matching event.
pub type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Token returned by `Emitter::on`, used to detach the handler again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Minimal named-channel publish/subscribe primitive.
pub trait Emitter<E: Event>: Send + Sync {
    /// Register `handler` for events of `kind`.
    fn on(&self, kind: E::Kind, handler: Handler<E>) -> SubscriptionId;

    /// Detach a handler. Returns `false` if it was not registered.
    fn off(&self, kind: E::Kind, id: SubscriptionId) -> bool;

    /// Deliver `event` to every handler registered for its kind.
    fn emit(&self, event: &E);
}

/// Default in-process emitter.
pub struct ChannelEmitter<E: Event> {
    handlers: DashMap<E::Kind, Vec<(SubscriptionId, Handler<E>)>>,
    next_id: AtomicU64,
}

impl<E: Event> ChannelEmitter<E> {
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of handlers currently registered for `kind`.
    pub fn handler_count(&self, kind: E::Kind) -> usize {
        self.handlers.get(&kind).map_or(0, |h| h.len())
    }
}

impl<E: Event> Default for ChannelEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for ChannelEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelEmitter")
            .field("kinds", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

impl<E: Event> Emitter<E> for ChannelEmitter<E> {
    fn on(&self, kind: E::Kind, handler: Handler<E>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers.entry(kind).or_default().push((id, handler));
        trace!(%kind, %id, "handler registered");
        id
    }

    fn off(&self, kind: E::Kind, id: SubscriptionId) -> bool {
        let Some(mut handlers) = self.handlers.get_mut(&kind) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(sub, _)| *sub != id);
        before != handlers.len()
    }

    fn emit(&self, event: &E) {
        let kind = event.kind();
        let targets: Vec<Handler<E>> = match self.handlers.get(&kind) {
            Some(handlers) => handlers.iter().map(|(_, h)| Arc::clone(h)).collect(),
            None => return,
        };
        trace!(%kind, handlers = targets.len(), "dispatch");
        for handler in targets {
            handler(event);
        }
    }
}
