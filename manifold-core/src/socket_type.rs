//! Socket type enumeration.
//!
//! The closed set of transport patterns a socket can be created with. The
//! numeric values follow the libzmq convention so external transports can map
//! them directly onto their own type identifiers.

use crate::error::{ManifoldError, Result};
use std::fmt;

/// Transport patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SocketType {
    /// Exclusive bidirectional communication between two peers
    Pair = 0,

    /// Publish messages to subscribers
    Pub = 1,

    /// Subscribe to published messages, filtered by prefix
    Sub = 2,

    /// Synchronous request-reply client
    Req = 3,

    /// Synchronous request-reply server
    Rep = 4,

    /// Asynchronous request-reply client (extended REQ)
    Dealer = 5,

    /// Identity-routing server (extended REP)
    Router = 6,

    /// Receive messages from pushers
    Pull = 7,

    /// Distribute messages to pullers
    Push = 8,

    /// Extended publisher with subscription visibility
    XPub = 9,

    /// Extended subscriber with dynamic subscriptions
    XSub = 10,
}

impl SocketType {
    /// All members of the enumeration, in numeric order.
    pub const ALL: [Self; 11] = [
        Self::Pair,
        Self::Pub,
        Self::Sub,
        Self::Req,
        Self::Rep,
        Self::Dealer,
        Self::Router,
        Self::Pull,
        Self::Push,
        Self::XPub,
        Self::XSub,
    ];

    /// Resolve a human-readable type name.
    ///
    /// Accepts the lowercase name of each pattern plus the historical
    /// aliases `xreq` (DEALER) and `xrep` (ROUTER). Unknown names fail with
    /// a configuration error.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "pair" => Ok(Self::Pair),
            "pub" => Ok(Self::Pub),
            "sub" => Ok(Self::Sub),
            "req" => Ok(Self::Req),
            "rep" => Ok(Self::Rep),
            "dealer" | "xreq" => Ok(Self::Dealer),
            "router" | "xrep" => Ok(Self::Router),
            "pull" => Ok(Self::Pull),
            "push" => Ok(Self::Push),
            "xpub" => Ok(Self::XPub),
            "xsub" => Ok(Self::XSub),
            other => Err(ManifoldError::UnknownSocketType(other.to_string())),
        }
    }

    /// Get the socket type as a lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pair => "pair",
            Self::Pub => "pub",
            Self::Sub => "sub",
            Self::Req => "req",
            Self::Rep => "rep",
            Self::Dealer => "dealer",
            Self::Router => "router",
            Self::Pull => "pull",
            Self::Push => "push",
            Self::XPub => "xpub",
            Self::XSub => "xsub",
        }
    }

    /// Check if this socket type is compatible with the given peer type.
    pub fn is_compatible(&self, peer: SocketType) -> bool {
        matches!(
            (self, peer),
            (Self::Pair, Self::Pair)
                | (Self::Pub, Self::Sub)
                | (Self::Sub, Self::Pub)
                | (Self::Req, Self::Rep)
                | (Self::Rep, Self::Req)
                | (Self::Req, Self::Router)
                | (Self::Router, Self::Req)
                | (Self::Dealer, Self::Rep)
                | (Self::Rep, Self::Dealer)
                | (Self::Dealer, Self::Router)
                | (Self::Router, Self::Dealer)
                | (Self::Dealer, Self::Dealer)
                | (Self::Push, Self::Pull)
                | (Self::Pull, Self::Push)
                | (Self::Pub, Self::XSub)
                | (Self::XPub, Self::Sub)
                | (Self::XPub, Self::XSub)
                | (Self::XSub, Self::XPub)
                | (Self::XSub, Self::Pub)
                | (Self::Sub, Self::XPub)
        )
    }

    /// True for the subscriber-side patterns that honour prefix filters.
    pub const fn is_subscriber(&self) -> bool {
        matches!(self, Self::Sub | Self::XSub)
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
