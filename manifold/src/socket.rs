//! The socket wrapper: public-facing entity composing a handle, a readiness
//! watcher, the outgoing queue, and the event hub.
//!
//! A `Socket` is a cheap handle over single-owner state (`Rc<RefCell<_>>`);
//! the model is single-threaded cooperative, so the only synchronization is
//! the dispatch engine's re-entrancy guard. The handle and watcher are
//! exclusively owned by one wrapper and never shared.

use crate::dispatch;
use crate::events::{ErrorEvent, EventHub};
use bytes::Bytes;
use manifold_core::context::Context;
use manifold_core::error::{ManifoldError, Result};
use manifold_core::handle::{HandleDriver, SocketHandle};
use manifold_core::options::{OptionKind, OptionValue, SocketOption};
use manifold_core::queue::OutgoingQueue;
use manifold_core::readiness::Readiness;
use manifold_core::socket_type::SocketType;
use manifold_core::watcher::ReadinessWatcher;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

pub(crate) struct Inner {
    pub(crate) socket_type: SocketType,
    pub(crate) handle: Box<dyn SocketHandle>,
    pub(crate) watcher: Box<dyn ReadinessWatcher>,
    pub(crate) outgoing: OutgoingQueue,
    /// True only while a dispatch activation is executing
    pub(crate) in_dispatch: bool,
    pub(crate) closed: bool,
}

impl Inner {
    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(ManifoldError::SocketClosed)
        } else {
            Ok(())
        }
    }
}

/// Generate the get/set pair for each integer-valued option in the table.
///
/// Keeps the option table as the single source of truth: every accessor
/// resolves its name through the table at call time.
macro_rules! int_option_accessors {
    ($(($get:ident, $set:ident, $name:literal)),* $(,)?) => {
        $(
            #[doc = concat!("Get the `", $name, "` option.")]
            pub fn $get(&self) -> Result<i64> {
                self.option($name)?.expect_int($name)
            }

            #[doc = concat!("Set the `", $name, "` option.")]
            pub fn $set(&self, value: i64) -> Result<()> {
                self.set_option($name, OptionValue::Int(value))
            }
        )*
    };
}

/// An evented messaging socket.
///
/// Outbound messages are queued by [`send`](Socket::send) and drained by the
/// dispatch engine; complete inbound multi-part messages arrive through the
/// `message` event. Failures inside the engine arrive through the `error`
/// event, enriched with the readiness flags and a queue snapshot at failure
/// time.
pub struct Socket {
    pub(crate) inner: Rc<RefCell<Inner>>,
    pub(crate) events: Rc<EventHub>,
}

impl std::fmt::Debug for Socket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket")
            .field("socket_type", &self.inner.borrow().socket_type)
            .finish_non_exhaustive()
    }
}

impl Clone for Socket {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            events: Rc::clone(&self.events),
        }
    }
}

impl Socket {
    /// Assemble a wrapper around a caller-supplied handle and watcher.
    ///
    /// The watcher is started immediately: it must be active before any
    /// bind/connect, because connection establishment can itself produce
    /// readiness events.
    pub fn from_parts(
        socket_type: SocketType,
        handle: Box<dyn SocketHandle>,
        mut watcher: Box<dyn ReadinessWatcher>,
    ) -> Self {
        watcher.start();
        Self {
            inner: Rc::new(RefCell::new(Inner {
                socket_type,
                handle,
                watcher,
                outgoing: OutgoingQueue::new(),
                in_dispatch: false,
                closed: false,
            })),
            events: Rc::new(EventHub::new()),
        }
    }

    /// Open a socket of the given type through a driver.
    pub fn with_driver(
        context: &Context,
        driver: &dyn HandleDriver,
        socket_type: SocketType,
    ) -> Result<Self> {
        let (handle, watcher) = driver.open(context, socket_type)?;
        Ok(Self::from_parts(socket_type, handle, watcher))
    }

    /// The transport pattern this socket was created with.
    pub fn socket_type(&self) -> SocketType {
        self.inner.borrow().socket_type
    }

    // ---- events --------------------------------------------------------

    /// Register a listener for complete inbound multi-part messages.
    pub fn on_message(&self, listener: impl FnMut(&[Bytes]) + 'static) {
        self.events.message.subscribe(listener);
    }

    /// Register a listener for dispatch-engine failures.
    pub fn on_error(&self, listener: impl FnMut(&ErrorEvent) + 'static) {
        self.events.error.subscribe(listener);
    }

    /// Stream adapter: receive inbound messages over a channel instead of a
    /// callback.
    pub fn messages(&self) -> flume::Receiver<Vec<Bytes>> {
        let (tx, rx) = flume::unbounded();
        self.on_message(move |parts| {
            // Ignore errors once the receiver is dropped.
            let _ = tx.send(parts.to_vec());
        });
        rx
    }

    pub(crate) fn emit_message(&self, parts: &[Bytes]) {
        self.events.message.emit(parts);
    }

    pub(crate) fn emit_error(&self, event: &ErrorEvent) -> bool {
        self.events.error.emit(event)
    }

    // ---- sending -------------------------------------------------------

    /// Queue a multi-part message and attempt to flush it immediately.
    ///
    /// Accepts one or more parts; anything convertible to [`Bytes`] works,
    /// text included (encoded as UTF-8). The whole group is appended
    /// atomically at the queue tail with the MORE flag on every part but the
    /// last, then one dispatch activation runs synchronously so sends are
    /// attempted eagerly rather than waiting for the next readiness
    /// notification.
    ///
    /// The queue itself is unbounded; callers can watch
    /// [`pending_sends`](Socket::pending_sends) to manage backlog growth.
    pub fn send<I, B>(&self, parts: I) -> Result<()>
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        {
            let mut inner = self.inner.borrow_mut();
            inner.ensure_open()?;
            inner.outgoing.push_group(parts.into_iter().map(Into::into));
        }
        dispatch::run(self)
    }

    /// Number of queued, not-yet-transmitted parts.
    pub fn pending_sends(&self) -> usize {
        self.inner.borrow().outgoing.len()
    }

    /// Entry point for the embedding scheduler's readiness callback.
    ///
    /// Runs one dispatch activation, unless the watcher is currently
    /// stopped (a stopped watcher must not produce dispatches).
    pub fn notify_readiness(&self) -> Result<()> {
        {
            let inner = self.inner.borrow();
            if inner.closed || !inner.watcher.is_active() {
                return Ok(());
            }
        }
        dispatch::run(self)
    }

    // ---- lifecycle -----------------------------------------------------

    /// Bind to an endpoint, reporting the outcome through `completion`.
    ///
    /// The watcher is stopped for the duration of the operation and
    /// restarted on every path, including failure, so a failed bind never
    /// leaves the socket deaf to readiness.
    pub fn bind(&self, endpoint: &str, completion: impl FnOnce(Result<()>)) {
        completion(self.bind_sync(endpoint));
    }

    /// Bind to an endpoint.
    pub fn bind_sync(&self, endpoint: &str) -> Result<()> {
        self.with_paused_watcher(|handle| handle.bind(endpoint))
    }

    /// Connect to an endpoint.
    pub fn connect(&self, endpoint: &str) -> Result<()> {
        self.with_paused_watcher(|handle| handle.connect(endpoint))
    }

    /// Close the socket.
    ///
    /// Stops and releases the watcher strictly before closing the handle
    /// (reverse order of creation), so no dispatch can run against a closed
    /// handle. Messages still in the outgoing queue are discarded; there is
    /// no flush-pending mode. Any further operation fails with
    /// [`ManifoldError::SocketClosed`].
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.ensure_open()?;
        trace!(socket_type = %inner.socket_type, "closing socket");
        inner.closed = true;
        inner.watcher.stop();
        inner.outgoing.clear();
        inner.handle.close()
    }

    fn with_paused_watcher(
        &self,
        op: impl FnOnce(&mut dyn SocketHandle) -> Result<()>,
    ) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        inner.ensure_open()?;
        inner.watcher.stop();
        let result = op(inner.handle.as_mut());
        // Restart on all paths, failure included, before propagating.
        inner.watcher.start();
        result
    }

    // ---- options -------------------------------------------------------

    /// Assign a socket option by table name.
    ///
    /// String values are encoded as UTF-8 bytes first. The pseudo-options
    /// `subscribe`/`unsubscribe` route to the handle's filter-update
    /// primitive instead of the literal option store.
    pub fn set_option(&self, name: &str, value: impl Into<OptionValue>) -> Result<()> {
        let spec = SocketOption::from_name(name)?;
        if !spec.access.writable() {
            return Err(ManifoldError::OptionReadOnly(spec.name));
        }
        let value = value.into();
        let mut inner = self.inner.borrow_mut();
        inner.ensure_open()?;
        match spec.option {
            SocketOption::Subscribe => {
                let filter = value.expect_bytes(spec.name)?;
                inner.handle.subscribe(&filter)
            }
            SocketOption::Unsubscribe => {
                let filter = value.expect_bytes(spec.name)?;
                inner.handle.unsubscribe(&filter)
            }
            option => {
                // Enforce the table's value kind before the handle sees it.
                match spec.kind {
                    OptionKind::Int => {
                        value.expect_int(spec.name)?;
                    }
                    OptionKind::Bytes => {
                        value.expect_bytes(spec.name)?;
                    }
                }
                inner.handle.set_option(option, value)
            }
        }
    }

    /// Read a socket option by table name.
    ///
    /// The read-only views `rcvmore` and `events` are answered from the
    /// handle's multipart and readiness state rather than the option store.
    pub fn option(&self, name: &str) -> Result<OptionValue> {
        let spec = SocketOption::from_name(name)?;
        if !spec.access.readable() {
            return Err(ManifoldError::OptionReadOnly(spec.name));
        }
        let inner = self.inner.borrow();
        inner.ensure_open()?;
        match spec.option {
            SocketOption::ReceiveMore => Ok(OptionValue::Int(i64::from(inner.handle.has_more()))),
            SocketOption::Events => Ok(OptionValue::Int(i64::from(
                inner.handle.readiness().bits(),
            ))),
            option => inner.handle.option(option),
        }
    }

    /// Install a subscription filter (SUB/XSUB patterns).
    pub fn subscribe(&self, filter: impl Into<Bytes>) -> Result<()> {
        self.set_option("subscribe", filter.into())
    }

    /// Remove a subscription filter.
    pub fn unsubscribe(&self, filter: impl Into<Bytes>) -> Result<()> {
        self.set_option("unsubscribe", filter.into())
    }

    /// Get the socket identity.
    pub fn identity(&self) -> Result<Bytes> {
        self.option("identity")?.expect_bytes("identity")
    }

    /// Set the socket identity. Text is encoded as UTF-8 bytes.
    pub fn set_identity(&self, value: impl Into<OptionValue>) -> Result<()> {
        self.set_option("identity", value)
    }

    /// True when the part most recently received is followed by more parts.
    pub fn receive_more(&self) -> Result<bool> {
        Ok(self.option("rcvmore")?.expect_int("rcvmore")? != 0)
    }

    /// Current readiness bitmask of the handle.
    pub fn readiness(&self) -> Result<Readiness> {
        let bits = self.option("events")?.expect_int("events")?;
        Ok(Readiness::from_bits(bits as u32))
    }

    int_option_accessors! {
        (high_water_mark, set_high_water_mark, "hwm"),
        (swap, set_swap, "swap"),
        (affinity, set_affinity, "affinity"),
        (rate, set_rate, "rate"),
        (recovery_interval, set_recovery_interval, "recovery_ivl"),
        (multicast_loop, set_multicast_loop, "mcast_loop"),
        (send_buffer, set_send_buffer, "sndbuf"),
        (receive_buffer, set_receive_buffer, "rcvbuf"),
        (linger, set_linger, "linger"),
    }
}
