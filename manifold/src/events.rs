//! Observable event capability for sockets.
//!
//! The socket wrapper composes an [`EventHub`] rather than inheriting an
//! emitter: two named event kinds, `message` and `error`, each with its own
//! listener list. Emission is synchronous and runs on the caller's stack,
//! which is why the dispatch engine carries a re-entrancy guard — a message
//! listener is free to call `send` on the same socket.

use bytes::Bytes;
use manifold_core::error::ManifoldError;
use manifold_core::queue::PartSnapshot;
use manifold_core::readiness::Readiness;
use std::cell::RefCell;
use std::fmt;

/// Payload of the `error` event: the originating failure plus diagnostic
/// context captured at failure time.
#[derive(Debug)]
pub struct ErrorEvent {
    /// The failure raised by the handle's send/recv
    pub error: ManifoldError,
    /// Readiness flags observed when the failure occurred
    pub readiness: Readiness,
    /// Snapshot of the pending outgoing queue (lengths and MORE flags)
    pub backlog: Vec<PartSnapshot>,
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (readiness: {}, backlog: [", self.error, self.readiness)?;
        for (i, part) in self.backlog.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{part}")?;
        }
        write!(f, "])")
    }
}

/// Listener list for one event kind.
///
/// `emit` runs every listener that was subscribed when emission started.
/// Listeners may subscribe further listeners during emission; those are
/// retained for subsequent emissions, not invoked for the current one.
pub struct Listeners<E: ?Sized> {
    slots: RefCell<Vec<Box<dyn FnMut(&E)>>>,
}

impl<E: ?Sized> Default for Listeners<E> {
    fn default() -> Self {
        Self {
            slots: RefCell::new(Vec::new()),
        }
    }
}

impl<E: ?Sized> Listeners<E> {
    /// Create an empty listener list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn subscribe(&self, listener: impl FnMut(&E) + 'static) {
        self.slots.borrow_mut().push(Box::new(listener));
    }

    /// Invoke every registered listener with `event`.
    ///
    /// Returns `true` when at least one listener consumed the event. The
    /// listener list is detached while listeners run, so listeners can
    /// subscribe (to this or other kinds) without re-borrowing issues.
    pub fn emit(&self, event: &E) -> bool {
        let mut current = std::mem::take(&mut *self.slots.borrow_mut());
        if current.is_empty() {
            return false;
        }
        for listener in &mut current {
            listener(event);
        }
        // Splice back in front of anything subscribed during emission.
        let mut slots = self.slots.borrow_mut();
        let added = std::mem::take(&mut *slots);
        *slots = current;
        slots.extend(added);
        true
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.borrow().len()
    }

    /// True when nothing is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.borrow().is_empty()
    }
}

/// The socket's named event kinds.
#[derive(Default)]
pub struct EventHub {
    /// One complete inbound multi-part message per emission
    pub message: Listeners<[Bytes]>,
    /// Failure surfaced from the dispatch engine
    pub error: Listeners<ErrorEvent>,
}

impl EventHub {
    /// Create a hub with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
