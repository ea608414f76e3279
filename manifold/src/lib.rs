//! # Manifold
//!
//! An event-driven API over non-blocking, readiness-notified messaging
//! sockets with multi-part messages and pluggable transport patterns
//! (pub/sub, req/rep, push/pull, dealer/router, pair).
//!
//! ## Architecture
//!
//! - **`manifold-core`**: readiness bitmask, handle/watcher traits, socket
//!   types, option table, outgoing queue, context, loopback transport
//! - **`manifold`**: the socket wrapper, dispatch engine, and event hub
//!   (this crate)
//!
//! The heart of the crate is the dispatch engine: a re-entrancy-guarded
//! loop that turns each readiness notification (or explicit `send`) into a
//! bounded burst of receives and sends, assembling complete multi-part
//! inbound messages and draining the outgoing queue in FIFO order.
//!
//! ## Quick Start
//!
//! ```rust
//! use manifold::create_socket;
//!
//! # fn example() -> manifold::Result<()> {
//! let server = create_socket("rep", &[])?;
//! server.bind_sync("loopback://service")?;
//! server.on_message(|parts| {
//!     println!("request with {} parts", parts.len());
//! });
//!
//! let client = create_socket("req", &[])?;
//! client.connect("loopback://service")?;
//! client.send(["ping"])?;
//!
//! // The embedding scheduler forwards readiness notifications:
//! server.notify_readiness()?;
//! # Ok(())
//! # }
//! ```
//!
//! Sockets never block: the handle's readiness mask is the only signal that
//! an operation will make progress, and control returns to the caller at
//! the end of every burst.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dev_tracing;
pub mod events;
mod dispatch;
mod socket;

pub use events::{ErrorEvent, EventHub, Listeners};
pub use socket::Socket;

// Re-export the core vocabulary so most users only need this crate.
pub use bytes::Bytes;
pub use manifold_core::context::Context;
pub use manifold_core::error::{ManifoldError, Result};
pub use manifold_core::handle::{HandleDriver, SocketHandle};
pub use manifold_core::loopback::{LoopbackDriver, LoopbackHandle};
pub use manifold_core::options::{OptionValue, SocketOption, OPTION_TABLE};
pub use manifold_core::queue::PartSnapshot;
pub use manifold_core::readiness::{Readiness, SendFlags};
pub use manifold_core::socket_type::SocketType;
pub use manifold_core::watcher::{IdleWatcher, ReadinessWatcher};

/// Create a socket from a type name, applying initial options.
///
/// `type_name` must be one of the closed socket-type enumeration (`"pub"`,
/// `"sub"`, `"req"`, `"rep"`, `"push"`, `"pull"`, `"dealer"`, `"router"`,
/// `"pair"`, `"xpub"`, `"xsub"`, plus the aliases `"xreq"`/`"xrep"`);
/// anything else fails with a configuration error. Options are applied
/// entry by entry through the table-backed accessors, so an unknown option
/// name fails fast as well.
///
/// The socket is opened against the process-wide [`Context`] and the
/// in-tree loopback driver. Use [`Socket::with_driver`] to plug in an
/// external transport.
///
/// # Example
///
/// ```rust
/// use manifold::{create_socket, OptionValue};
///
/// # fn example() -> manifold::Result<()> {
/// let socket = create_socket("sub", &[("identity", OptionValue::from("abc"))])?;
/// assert_eq!(socket.identity()?, manifold::Bytes::from_static(b"abc"));
/// # Ok(())
/// # }
/// ```
pub fn create_socket(type_name: &str, options: &[(&str, OptionValue)]) -> Result<Socket> {
    let socket_type = SocketType::from_name(type_name)?;
    let context = Context::global();
    let socket = Socket::with_driver(&context, &LoopbackDriver, socket_type)?;
    for (name, value) in options {
        socket.set_option(name, value.clone())?;
    }
    Ok(socket)
}
