//! The dispatch engine.
//!
//! A single activation converts the handle's readiness plus the queue state
//! into a bounded burst of receives and sends: complete inbound multi-part
//! messages are assembled and emitted one event each, and queued outbound
//! parts are flushed in FIFO order. Activations are triggered both
//! synchronously (from `send`) and asynchronously (from the readiness
//! watcher); a boolean guard serializes them.
//!
//! The guard is not there for thread safety — the model is single-threaded
//! cooperative. It exists because emission runs listeners on this stack, and
//! a `message` listener calling `send` would otherwise recurse into a fresh
//! activation, growing the stack without bound and starving the write side.
//! The re-entered `send` only appends to the queue; the activation already
//! in progress picks the new parts up on its next loop iteration.
//!
//! Readiness is level-triggered and only says "at least one operation will
//! not block", so the engine drains in bursts rather than one operation per
//! notification: a transport can report readiness changes faster than
//! individual event dispatch keeps up, and a partial multi-part read is not
//! a valid application-visible message. Writability is re-read after every
//! send because a single send can flip it; overrunning the handle's buffer
//! would only manufacture spurious errors.

use crate::events::ErrorEvent;
use crate::socket::{Inner, Socket};
use bytes::Bytes;
use manifold_core::error::{ManifoldError, Result};
use manifold_core::readiness::{Readiness, SendFlags};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

/// Parts of one inbound message; most messages are a handful of parts.
type Parts = SmallVec<[Bytes; 4]>;

/// Clears the re-entrancy guard on every exit path, panicking listeners
/// included. The guard must never outlive its activation: an engine left
/// permanently locked would silently drop all traffic.
struct ActivationGuard {
    inner: Rc<RefCell<Inner>>,
}

impl Drop for ActivationGuard {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.in_dispatch = false;
        }
    }
}

/// Run one dispatch activation.
///
/// Returns `Ok(())` when the burst completed or the failure was delivered to
/// an `error` listener. Returns the failure itself when no listener consumed
/// it: once error reporting is broken there is no safe fallback, so the
/// failure propagates to the embedding caller.
pub(crate) fn run(socket: &Socket) -> Result<()> {
    {
        let mut inner = socket.inner.borrow_mut();
        if inner.in_dispatch {
            trace!("dispatch: activation already in progress");
            return Ok(());
        }
        inner.in_dispatch = true;
    }
    let _guard = ActivationGuard {
        inner: Rc::clone(&socket.inner),
    };

    loop {
        // Assess what is actionable. With nothing queued, a writable socket
        // has no outbound work, so the writable bit is masked out of the
        // local copy.
        let ready = {
            let inner = socket.inner.borrow();
            if inner.closed {
                return Ok(());
            }
            let mut ready = inner.handle.readiness();
            if inner.outgoing.is_empty() {
                ready = ready.remove(Readiness::WRITABLE);
            }
            ready
        };
        if ready.is_empty() {
            return Ok(());
        }
        trace!(%ready, "dispatch: burst");

        if ready.contains(Readiness::READABLE) {
            match receive_message(socket) {
                Ok(parts) => {
                    socket.emit_message(&parts);
                    // A listener may have closed the socket, or the handle
                    // may have died under us; stop the burst rather than
                    // operate on a dead handle.
                    let usable = {
                        let inner = socket.inner.borrow();
                        !inner.closed && inner.handle.is_open()
                    };
                    if !usable {
                        trace!("dispatch: handle no longer usable, aborting burst");
                        return Ok(());
                    }
                }
                Err(error) => return report_failure(socket, error),
            }
        }

        if ready.contains(Readiness::WRITABLE) {
            if let Some(error) = flush_outgoing(socket) {
                return report_failure(socket, error);
            }
        }
    }
}

/// Perform one complete multi-part receive: collect parts while the handle
/// reports more to come. A partial message is never exposed.
fn receive_message(socket: &Socket) -> Result<Parts> {
    let mut inner = socket.inner.borrow_mut();
    let mut parts = Parts::new();
    loop {
        let part = inner.handle.recv()?;
        parts.push(part);
        if !inner.handle.has_more() {
            trace!(parts = parts.len(), "dispatch: received message");
            return Ok(parts);
        }
    }
}

/// Pop-and-send queued parts while writability holds, re-reading readiness
/// after every send. Returns the failure, if any; the failed part is not
/// re-queued.
fn flush_outgoing(socket: &Socket) -> Option<ManifoldError> {
    let mut inner = socket.inner.borrow_mut();
    let mut sent = 0usize;
    loop {
        if !inner.handle.readiness().contains(Readiness::WRITABLE) {
            break;
        }
        let Some(part) = inner.outgoing.pop_front() else {
            break;
        };
        let flags = SendFlags::for_part(part.more);
        if let Err(error) = inner.handle.send(part.payload, flags) {
            return Some(error);
        }
        sent += 1;
    }
    if sent > 0 {
        trace!(sent, backlog = inner.outgoing.len(), "dispatch: flushed");
    }
    None
}

/// Convert a send/recv failure into an `error` event carrying the readiness
/// flags and queue snapshot observed at failure time.
fn report_failure(socket: &Socket, error: ManifoldError) -> Result<()> {
    let (readiness, backlog) = {
        let inner = socket.inner.borrow();
        (inner.handle.readiness(), inner.outgoing.snapshot())
    };
    let event = ErrorEvent {
        error,
        readiness,
        backlog,
    };
    debug!(%event, "dispatch: failure");
    if socket.emit_error(&event) {
        Ok(())
    } else {
        Err(event.error)
    }
}
