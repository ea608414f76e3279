//! Readiness bitmask and send flags.
//!
//! A handle reports which directions can currently make progress without
//! blocking via a [`Readiness`] bitmask. The bit values match the poll
//! convention (POLLIN = 1, POLLOUT = 2) so external transports can pass an
//! OS-level mask through unchanged.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Bitmask describing which socket directions will not block right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Readiness(u32);

impl Readiness {
    /// Neither direction can make progress.
    pub const EMPTY: Self = Self(0);

    /// At least one complete inbound message part can be received.
    pub const READABLE: Self = Self(1);

    /// At least one outbound part can be sent.
    pub const WRITABLE: Self = Self(2);

    /// Build a readiness mask from its raw bit representation.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & 0b11)
    }

    /// Raw bit representation (POLLIN = 1, POLLOUT = 2).
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check whether all bits of `other` are set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the bits of `other`.
    #[must_use]
    pub const fn insert(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Clear the bits of `other`.
    #[must_use]
    pub const fn remove(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// True when no direction is ready.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Readiness {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.insert(rhs)
    }
}

impl BitOrAssign for Readiness {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.insert(rhs);
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (
            self.contains(Self::READABLE),
            self.contains(Self::WRITABLE),
        ) {
            (true, true) => write!(f, "readable|writable"),
            (true, false) => write!(f, "readable"),
            (false, true) => write!(f, "writable"),
            (false, false) => write!(f, "idle"),
        }
    }
}

/// Per-part flags passed to [`SocketHandle::send`](crate::handle::SocketHandle::send).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendFlags(u32);

impl SendFlags {
    /// No flags: this part completes its message.
    pub const NONE: Self = Self(0);

    /// More parts of the same message follow.
    pub const MORE: Self = Self(1);

    /// Flags for a part depending on whether more parts follow it.
    #[must_use]
    pub const fn for_part(more: bool) -> Self {
        if more {
            Self::MORE
        } else {
            Self::NONE
        }
    }

    /// True when the MORE flag is set.
    #[must_use]
    pub const fn has_more(self) -> bool {
        self.0 & Self::MORE.0 != 0
    }
}
