//! Readiness watcher lifecycle.
//!
//! A watcher observes the descriptor behind a socket handle and arranges for
//! the embedding scheduler to call back whenever readiness may have changed.
//! This crate only specifies the lifecycle half of that contract: `start`,
//! `stop`, and whether notifications are currently wanted. Delivery is the
//! scheduler's job (it invokes `Socket::notify_readiness`), which keeps the
//! core free of any event-loop dependency.

/// Lifecycle of a readiness watcher.
///
/// A stopped watcher must not produce callbacks; the socket wrapper stops
/// the watcher around bind/connect and before closing the handle so the
/// dispatch engine never runs against a handle in transition.
pub trait ReadinessWatcher {
    /// Begin watching. Idempotent.
    fn start(&mut self);

    /// Stop watching. Idempotent. No callbacks may be delivered afterwards
    /// until `start` is called again.
    fn stop(&mut self);

    /// True while the watcher is started.
    fn is_active(&self) -> bool;
}

/// Flag-only watcher for transports whose notifications are driven by the
/// caller rather than an OS primitive (loopback, test harnesses).
#[derive(Debug, Default)]
pub struct IdleWatcher {
    active: bool,
}

impl IdleWatcher {
    /// Create a stopped watcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadinessWatcher for IdleWatcher {
    fn start(&mut self) {
        self.active = true;
    }

    fn stop(&mut self) {
        self.active = false;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
