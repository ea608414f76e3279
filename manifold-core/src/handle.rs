//! The socket handle trait: the interface boundary to the underlying
//! transport.
//!
//! A handle is a non-blocking, readiness-reporting messaging socket. The
//! dispatch engine never blocks on it: [`SocketHandle::readiness`] is the
//! sole signal that a `send` or `recv` will make progress right now. The
//! transport behind a handle (framing, wire format, connection management)
//! is deliberately unspecified here; the in-tree [`loopback`](crate::loopback)
//! transport is one implementation, external transports supply their own.

use crate::context::Context;
use crate::error::Result;
use crate::options::{OptionValue, SocketOption};
use crate::readiness::{Readiness, SendFlags};
use crate::socket_type::SocketType;
use crate::watcher::ReadinessWatcher;
use bytes::Bytes;

/// Non-blocking messaging socket primitive.
///
/// All operations must return without blocking. `send`/`recv` may be called
/// only when the corresponding readiness bit is observed; a handle is free
/// to fail them otherwise.
pub trait SocketHandle {
    /// Send one message part. `flags` carries the MORE marker when further
    /// parts of the same message follow.
    fn send(&mut self, part: Bytes, flags: SendFlags) -> Result<()>;

    /// Receive one message part.
    fn recv(&mut self) -> Result<Bytes>;

    /// True when the part most recently returned by [`recv`](Self::recv)
    /// is followed by more parts of the same message.
    fn has_more(&self) -> bool;

    /// Current readiness bitmask.
    fn readiness(&self) -> Readiness;

    /// True while the underlying connection is usable. Once this turns
    /// false the dispatch engine aborts mid-burst instead of continuing to
    /// operate on a dead handle.
    fn is_open(&self) -> bool;

    /// Bind to an endpoint and start accepting peers.
    fn bind(&mut self, endpoint: &str) -> Result<()>;

    /// Connect to a bound endpoint.
    fn connect(&mut self, endpoint: &str) -> Result<()>;

    /// Release the underlying resources. Further operations fail.
    fn close(&mut self) -> Result<()>;

    /// Assign a socket option.
    fn set_option(&mut self, option: SocketOption, value: OptionValue) -> Result<()>;

    /// Read a socket option back.
    fn option(&self, option: SocketOption) -> Result<OptionValue>;

    /// Install a subscription filter (SUB/XSUB patterns).
    fn subscribe(&mut self, filter: &[u8]) -> Result<()>;

    /// Remove a subscription filter.
    fn unsubscribe(&mut self, filter: &[u8]) -> Result<()>;
}

/// Factory for handle/watcher pairs.
///
/// Socket construction routes through a driver so the transport stays
/// pluggable: the in-tree loopback driver serves tests and demos, external
/// transports implement their own.
pub trait HandleDriver {
    /// Open a handle of the given type, together with the readiness watcher
    /// observing it.
    fn open(
        &self,
        context: &Context,
        socket_type: SocketType,
    ) -> Result<(Box<dyn SocketHandle>, Box<dyn ReadinessWatcher>)>;
}
