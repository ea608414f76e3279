//! Error types for manifold operations.

use std::io;
use thiserror::Error;

/// Main error type for manifold operations
#[derive(Error, Debug)]
pub enum ManifoldError {
    /// IO error reported by a handle implementation
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Socket type name is not part of the closed enumeration
    #[error("Unknown socket type: {0:?}")]
    UnknownSocketType(String),

    /// Option name is not part of the option table
    #[error("Unknown socket option: {0:?}")]
    UnknownOption(String),

    /// Attempt to set a get-only option
    #[error("Socket option {0:?} is read-only")]
    OptionReadOnly(&'static str),

    /// Option value has the wrong kind for the named option
    #[error("Invalid value for option {option:?}: expected {expected}")]
    InvalidOptionValue {
        option: &'static str,
        expected: &'static str,
    },

    /// Operation attempted after close()
    #[error("Socket closed")]
    SocketClosed,

    /// Generic transport failure from the underlying handle
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type alias for manifold operations
pub type Result<T> = std::result::Result<T, ManifoldError>;

impl ManifoldError {
    /// Create a transport error with a message
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Check if this error means the underlying connection is unusable
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::SocketClosed => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::NotConnected
            ),
            _ => false,
        }
    }

    /// Check if this error is a configuration error (bad name fed in by the
    /// caller, as opposed to a transport failure).
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownSocketType(_)
                | Self::UnknownOption(_)
                | Self::OptionReadOnly(_)
                | Self::InvalidOptionValue { .. }
        )
    }
}
