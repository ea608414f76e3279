//! Socket option table.
//!
//! A single declarative table maps human-readable option names to numeric
//! option identifiers, the expected value kind, and the allowed access
//! direction. The socket wrapper's statically-enumerated accessors consult
//! this table; there is no runtime reflection.
//!
//! Two entries are pseudo-options: `subscribe` and `unsubscribe` route to
//! the handle's filter-update primitive instead of the literal option store.
//! `rcvmore` and `events` are read-only views over the handle's multipart
//! and readiness state.

use crate::error::{ManifoldError, Result};
use bytes::Bytes;
use std::fmt;

/// Numeric socket option identifiers (libzmq convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SocketOption {
    /// High water mark for the outgoing pipe
    Hwm = 1,
    /// Disk offload size for overflowing messages
    Swap = 3,
    /// IO-thread affinity bitmask
    Affinity = 4,
    /// Socket identity used for routing
    Identity = 5,
    /// Subscription filter (pseudo-option, write-only)
    Subscribe = 6,
    /// Subscription filter removal (pseudo-option, write-only)
    Unsubscribe = 7,
    /// Multicast data rate
    Rate = 8,
    /// Multicast recovery interval
    RecoveryIvl = 9,
    /// Multicast loopback
    McastLoop = 10,
    /// Kernel send buffer size
    SendBuffer = 11,
    /// Kernel receive buffer size
    RecvBuffer = 12,
    /// More message parts follow (read-only)
    ReceiveMore = 13,
    /// Current readiness bitmask (read-only)
    Events = 15,
    /// Linger period on close
    Linger = 17,
}

/// Expected value kind for an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Signed integer value
    Int,
    /// Byte-sequence value (strings are UTF-8 encoded first)
    Bytes,
}

/// Allowed access direction for an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Get only
    Read,
    /// Set only
    Write,
    /// Get and set
    ReadWrite,
}

impl Access {
    /// True when the option can be read back.
    pub const fn readable(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    /// True when the option can be assigned.
    pub const fn writable(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// One row of the option table.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    /// Human-readable option name
    pub name: &'static str,
    /// Numeric identifier passed to the handle
    pub option: SocketOption,
    /// Expected value kind
    pub kind: OptionKind,
    /// Allowed access direction
    pub access: Access,
}

/// The option table: the single source of truth for name resolution.
pub const OPTION_TABLE: &[OptionSpec] = &[
    OptionSpec { name: "hwm", option: SocketOption::Hwm, kind: OptionKind::Int, access: Access::ReadWrite },
    OptionSpec { name: "swap", option: SocketOption::Swap, kind: OptionKind::Int, access: Access::ReadWrite },
    OptionSpec { name: "affinity", option: SocketOption::Affinity, kind: OptionKind::Int, access: Access::ReadWrite },
    OptionSpec { name: "identity", option: SocketOption::Identity, kind: OptionKind::Bytes, access: Access::ReadWrite },
    OptionSpec { name: "subscribe", option: SocketOption::Subscribe, kind: OptionKind::Bytes, access: Access::Write },
    OptionSpec { name: "unsubscribe", option: SocketOption::Unsubscribe, kind: OptionKind::Bytes, access: Access::Write },
    OptionSpec { name: "rate", option: SocketOption::Rate, kind: OptionKind::Int, access: Access::ReadWrite },
    OptionSpec { name: "recovery_ivl", option: SocketOption::RecoveryIvl, kind: OptionKind::Int, access: Access::ReadWrite },
    OptionSpec { name: "mcast_loop", option: SocketOption::McastLoop, kind: OptionKind::Int, access: Access::ReadWrite },
    OptionSpec { name: "sndbuf", option: SocketOption::SendBuffer, kind: OptionKind::Int, access: Access::ReadWrite },
    OptionSpec { name: "rcvbuf", option: SocketOption::RecvBuffer, kind: OptionKind::Int, access: Access::ReadWrite },
    OptionSpec { name: "rcvmore", option: SocketOption::ReceiveMore, kind: OptionKind::Int, access: Access::Read },
    OptionSpec { name: "events", option: SocketOption::Events, kind: OptionKind::Int, access: Access::Read },
    OptionSpec { name: "linger", option: SocketOption::Linger, kind: OptionKind::Int, access: Access::ReadWrite },
];

impl SocketOption {
    /// Resolve an option name against the table.
    pub fn from_name(name: &str) -> Result<&'static OptionSpec> {
        OPTION_TABLE
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| ManifoldError::UnknownOption(name.to_string()))
    }

    /// Look up the table row for this option.
    pub fn spec(self) -> &'static OptionSpec {
        // Every enum member has exactly one table row.
        OPTION_TABLE
            .iter()
            .find(|spec| spec.option == self)
            .unwrap_or(&OPTION_TABLE[0])
    }

    /// Human-readable name of this option.
    pub fn name(self) -> &'static str {
        self.spec().name
    }
}

/// A socket option value.
///
/// String arguments are encoded as UTF-8 bytes before they reach a handle,
/// so handles only ever see [`OptionValue::Int`] or [`OptionValue::Bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Signed integer value
    Int(i64),
    /// Raw bytes value
    Bytes(Bytes),
}

impl OptionValue {
    /// Extract an integer, failing with a configuration error otherwise.
    pub fn expect_int(&self, option: &'static str) -> Result<i64> {
        match self {
            Self::Int(v) => Ok(*v),
            Self::Bytes(_) => Err(ManifoldError::InvalidOptionValue {
                option,
                expected: "integer",
            }),
        }
    }

    /// Extract bytes, failing with a configuration error otherwise.
    pub fn expect_bytes(&self, option: &'static str) -> Result<Bytes> {
        match self {
            Self::Bytes(v) => Ok(v.clone()),
            Self::Int(_) => Err(ManifoldError::InvalidOptionValue {
                option,
                expected: "bytes",
            }),
        }
    }
}

impl From<i64> for OptionValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<Bytes> for OptionValue {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

impl From<&str> for OptionValue {
    fn from(v: &str) -> Self {
        Self::Bytes(Bytes::copy_from_slice(v.as_bytes()))
    }
}

impl From<String> for OptionValue {
    fn from(v: String) -> Self {
        Self::Bytes(Bytes::from(v.into_bytes()))
    }
}

impl From<Vec<u8>> for OptionValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(v))
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Bytes(v) => write!(f, "{} bytes", v.len()),
        }
    }
}
