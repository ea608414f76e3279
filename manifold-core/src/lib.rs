//! Manifold Core
//!
//! Runtime-agnostic building blocks for the manifold evented socket layer:
//! - Readiness bitmask and send flags (`readiness`)
//! - Socket handle and driver traits (`handle`)
//! - Readiness watcher lifecycle (`watcher`)
//! - Socket type enumeration (`socket_type`)
//! - Declarative socket option table (`options`)
//! - Outgoing part queue (`queue`)
//! - Process-wide context (`context`)
//! - In-process loopback transport (`loopback`)
//! - Error types (`error`)

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod context;
pub mod error;
pub mod handle;
pub mod loopback;
pub mod options;
pub mod queue;
pub mod readiness;
pub mod socket_type;
pub mod watcher;

// Small prelude for downstream crates. Keep it minimal to avoid API lock-in.
pub mod prelude {
    pub use crate::context::Context;
    pub use crate::error::{ManifoldError, Result};
    pub use crate::handle::{HandleDriver, SocketHandle};
    pub use crate::loopback::{LoopbackDriver, LoopbackHandle};
    pub use crate::options::{OptionValue, SocketOption, OPTION_TABLE};
    pub use crate::queue::{OutgoingQueue, PartSnapshot, QueuedPart};
    pub use crate::readiness::{Readiness, SendFlags};
    pub use crate::socket_type::SocketType;
    pub use crate::watcher::{IdleWatcher, ReadinessWatcher};
}
