//! In-process loopback transport.
//!
//! A pair transport implementing [`SocketHandle`] over in-process channels,
//! without network or syscall overhead. A binder registers a `loopback://`
//! endpoint in a global registry; one or more connectors attach to it and
//! share a pair of part channels with the binder. This is the transport the
//! tests and demos run the dispatch engine against; it is not a wire-protocol
//! specification.
//!
//! Multi-part messages travel as individual parts carrying a MORE marker.
//! The receiving side stages parts until a message completes, applies
//! subscription filters at message granularity, and only then reports
//! readable readiness — so `recv` never exposes a partial message.

use crate::context::Context;
use crate::error::{ManifoldError, Result};
use crate::handle::{HandleDriver, SocketHandle};
use crate::options::{OptionValue, SocketOption};
use crate::readiness::{Readiness, SendFlags};
use crate::socket_type::SocketType;
use crate::watcher::{IdleWatcher, ReadinessWatcher};
use bytes::Bytes;
use flume::{Receiver, Sender};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io;
use tracing::trace;

const PREFIX: &str = "loopback://";

/// Default outgoing high-water mark (parts) before writability drops.
const DEFAULT_HWM: i64 = 1000;

/// One part on the loopback wire.
#[derive(Debug, Clone)]
struct WirePart {
    payload: Bytes,
    more: bool,
}

/// Channel endpoints registered for a bound loopback endpoint.
#[derive(Clone)]
struct Binding {
    binder_type: SocketType,
    to_binder: Sender<WirePart>,
    from_binder: Receiver<WirePart>,
}

/// Global registry of bound loopback endpoints.
static REGISTRY: Lazy<Mutex<HashMap<String, Binding>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn endpoint_name(endpoint: &str) -> Result<&str> {
    let name = endpoint.strip_prefix(PREFIX).ok_or_else(|| {
        ManifoldError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("loopback endpoint must start with '{PREFIX}', got: '{endpoint}'"),
        ))
    })?;
    if name.is_empty() {
        return Err(ManifoldError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            "loopback endpoint name cannot be empty",
        )));
    }
    Ok(name)
}

struct Inner {
    socket_type: SocketType,
    bound_as: Option<String>,
    tx: Option<Sender<WirePart>>,
    rx: Option<Receiver<WirePart>>,
    /// Parts of complete, filter-passed messages, ready for recv
    staged: VecDeque<WirePart>,
    /// Parts of the inbound message currently being assembled
    partial: Vec<WirePart>,
    /// MORE flag of the part most recently handed out by recv
    last_more: bool,
    /// Subscription prefixes (subscriber patterns only)
    filters: Vec<Bytes>,
    /// Plain option store backing get/set
    store: HashMap<SocketOption, OptionValue>,
    open: bool,
}

impl Inner {
    fn hwm(&self) -> i64 {
        match self.store.get(&SocketOption::Hwm) {
            Some(OptionValue::Int(v)) => *v,
            _ => DEFAULT_HWM,
        }
    }

    /// Move parts from the channel into the staging area, completing
    /// messages and applying subscription filters at message boundaries.
    fn pump(&mut self) {
        let Some(rx) = self.rx.clone() else { return };
        while let Ok(part) = rx.try_recv() {
            let completes = !part.more;
            self.partial.push(part);
            if completes {
                let message = std::mem::take(&mut self.partial);
                if self.delivers(&message) {
                    self.staged.extend(message);
                } else {
                    trace!(
                        socket_type = %self.socket_type,
                        "loopback: dropped message not matching any filter"
                    );
                }
            }
        }
    }

    /// Whether a complete message passes the subscription filters.
    fn delivers(&self, message: &[WirePart]) -> bool {
        if !self.socket_type.is_subscriber() {
            return true;
        }
        let Some(first) = message.first() else {
            return false;
        };
        self.filters.iter().any(|prefix| {
            prefix.is_empty()
                || (first.payload.len() >= prefix.len()
                    && first.payload[..prefix.len()] == prefix[..])
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(ManifoldError::SocketClosed)
        }
    }
}

/// In-process pair handle.
///
/// State lives behind a `RefCell` because readiness inspection has to pull
/// arrived parts out of the channel, and the handle trait exposes readiness
/// through `&self`.
pub struct LoopbackHandle {
    inner: RefCell<Inner>,
}

impl LoopbackHandle {
    /// Create an unconnected handle of the given type.
    #[must_use]
    pub fn new(socket_type: SocketType) -> Self {
        Self {
            inner: RefCell::new(Inner {
                socket_type,
                bound_as: None,
                tx: None,
                rx: None,
                staged: VecDeque::new(),
                partial: Vec::new(),
                last_more: false,
                filters: Vec::new(),
                store: HashMap::new(),
                open: true,
            }),
        }
    }

    /// Socket type this handle was created with.
    pub fn socket_type(&self) -> SocketType {
        self.inner.borrow().socket_type
    }
}

impl SocketHandle for LoopbackHandle {
    fn send(&mut self, part: Bytes, flags: SendFlags) -> Result<()> {
        let inner = self.inner.get_mut();
        inner.ensure_open()?;
        let tx = inner.tx.as_ref().ok_or_else(|| {
            ManifoldError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "loopback handle is not connected",
            ))
        })?;

        let hwm = inner.hwm();
        if hwm > 0 && tx.len() >= hwm as usize {
            return Err(ManifoldError::Io(io::Error::new(
                io::ErrorKind::WouldBlock,
                "loopback send queue is full",
            )));
        }

        let sent = tx.send(WirePart {
            payload: part,
            more: flags.has_more(),
        });
        if sent.is_err() {
            inner.open = false;
            return Err(ManifoldError::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "loopback peer is gone",
            )));
        }
        Ok(())
    }

    fn recv(&mut self) -> Result<Bytes> {
        let inner = self.inner.get_mut();
        inner.ensure_open()?;
        inner.pump();
        let part = inner.staged.pop_front().ok_or_else(|| {
            ManifoldError::Io(io::Error::new(
                io::ErrorKind::WouldBlock,
                "no complete message staged",
            ))
        })?;
        inner.last_more = part.more;
        Ok(part.payload)
    }

    fn has_more(&self) -> bool {
        self.inner.borrow().last_more
    }

    fn readiness(&self) -> Readiness {
        let mut inner = self.inner.borrow_mut();
        if !inner.open {
            return Readiness::EMPTY;
        }
        inner.pump();

        let mut ready = Readiness::EMPTY;
        if !inner.staged.is_empty() {
            ready |= Readiness::READABLE;
        }
        if let Some(tx) = inner.tx.as_ref() {
            let hwm = inner.hwm();
            if !tx.is_disconnected() && (hwm <= 0 || tx.len() < hwm as usize) {
                ready |= Readiness::WRITABLE;
            }
        }
        ready
    }

    fn is_open(&self) -> bool {
        let inner = self.inner.borrow();
        if !inner.open {
            return false;
        }
        // A disconnected peer makes the handle unusable once nothing more
        // can be drained from it.
        match (&inner.tx, &inner.rx) {
            (Some(tx), Some(rx)) => {
                !(tx.is_disconnected() && rx.is_disconnected() && rx.is_empty())
            }
            _ => true,
        }
    }

    fn bind(&mut self, endpoint: &str) -> Result<()> {
        let inner = self.inner.get_mut();
        inner.ensure_open()?;
        let name = endpoint_name(endpoint)?;

        let (to_binder_tx, to_binder_rx) = flume::unbounded();
        let (from_binder_tx, from_binder_rx) = flume::unbounded();

        let mut registry = REGISTRY.lock();
        if registry.contains_key(name) {
            return Err(ManifoldError::Io(io::Error::new(
                io::ErrorKind::AddrInUse,
                format!("loopback endpoint '{name}' is already bound"),
            )));
        }
        registry.insert(
            name.to_string(),
            Binding {
                binder_type: inner.socket_type,
                to_binder: to_binder_tx,
                from_binder: from_binder_rx,
            },
        );
        drop(registry);

        inner.bound_as = Some(name.to_string());
        inner.tx = Some(from_binder_tx);
        inner.rx = Some(to_binder_rx);
        trace!(endpoint = name, "loopback: bound");
        Ok(())
    }

    fn connect(&mut self, endpoint: &str) -> Result<()> {
        let inner = self.inner.get_mut();
        inner.ensure_open()?;
        let name = endpoint_name(endpoint)?;

        let binding = REGISTRY.lock().get(name).cloned().ok_or_else(|| {
            ManifoldError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("loopback endpoint '{name}' is not bound"),
            ))
        })?;

        if !inner.socket_type.is_compatible(binding.binder_type) {
            return Err(ManifoldError::transport(format!(
                "{} socket cannot connect to a {} binder",
                inner.socket_type, binding.binder_type
            )));
        }

        inner.tx = Some(binding.to_binder);
        inner.rx = Some(binding.from_binder);
        trace!(endpoint = name, "loopback: connected");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let inner = self.inner.get_mut();
        if let Some(name) = inner.bound_as.take() {
            REGISTRY.lock().remove(&name);
        }
        inner.tx = None;
        inner.rx = None;
        inner.staged.clear();
        inner.partial.clear();
        inner.open = false;
        Ok(())
    }

    fn set_option(&mut self, option: SocketOption, value: OptionValue) -> Result<()> {
        let inner = self.inner.get_mut();
        inner.ensure_open()?;
        inner.store.insert(option, value);
        Ok(())
    }

    fn option(&self, option: SocketOption) -> Result<OptionValue> {
        let inner = self.inner.borrow();
        inner.ensure_open()?;
        if let Some(value) = inner.store.get(&option) {
            return Ok(value.clone());
        }
        // Unset options read back as their defaults.
        Ok(match option {
            SocketOption::Hwm => OptionValue::Int(DEFAULT_HWM),
            SocketOption::Identity => OptionValue::Bytes(Bytes::new()),
            _ => OptionValue::Int(0),
        })
    }

    fn subscribe(&mut self, filter: &[u8]) -> Result<()> {
        let inner = self.inner.get_mut();
        inner.ensure_open()?;
        let prefix = Bytes::copy_from_slice(filter);
        if !inner.filters.contains(&prefix) {
            inner.filters.push(prefix);
        }
        Ok(())
    }

    fn unsubscribe(&mut self, filter: &[u8]) -> Result<()> {
        let inner = self.inner.get_mut();
        inner.ensure_open()?;
        inner.filters.retain(|prefix| prefix != filter);
        Ok(())
    }
}

/// Driver opening loopback handles paired with an [`IdleWatcher`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LoopbackDriver;

impl HandleDriver for LoopbackDriver {
    fn open(
        &self,
        _context: &Context,
        socket_type: SocketType,
    ) -> Result<(Box<dyn SocketHandle>, Box<dyn ReadinessWatcher>)> {
        Ok((
            Box::new(LoopbackHandle::new(socket_type)),
            Box::new(IdleWatcher::new()),
        ))
    }
}
