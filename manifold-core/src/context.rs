//! Process-wide context.
//!
//! The context is the one shared, reference-counted resource in the system.
//! It is created lazily on first use, is read-only afterwards, and is only
//! consulted at socket construction time. Tests construct sockets against a
//! fresh `Context` instead of the global one.

use once_cell::sync::Lazy;
use std::env;
use std::sync::Arc;
use tracing::warn;

/// Environment variable overriding the IO-thread count, read once at first
/// context creation.
pub const IO_THREADS_VAR: &str = "MANIFOLD_IO_THREADS";

/// Default IO-thread count when no valid override is present.
pub const DEFAULT_IO_THREADS: usize = 1;

static GLOBAL: Lazy<Arc<Context>> = Lazy::new(|| Arc::new(Context::from_env()));

/// Process-wide socket construction context.
#[derive(Debug, Clone)]
pub struct Context {
    io_threads: usize,
}

impl Context {
    /// Create a context with an explicit IO-thread count.
    ///
    /// A non-positive count falls back to [`DEFAULT_IO_THREADS`] with a
    /// warning, matching the environment-override behaviour.
    #[must_use]
    pub fn new(io_threads: usize) -> Self {
        if io_threads == 0 {
            warn!(
                "invalid io-thread count 0, falling back to {}",
                DEFAULT_IO_THREADS
            );
            return Self {
                io_threads: DEFAULT_IO_THREADS,
            };
        }
        Self { io_threads }
    }

    /// Create a context from the environment.
    ///
    /// Reads [`IO_THREADS_VAR`]; unset, unparsable, or non-positive values
    /// fall back to [`DEFAULT_IO_THREADS`] (with a warning for the invalid
    /// cases).
    #[must_use]
    pub fn from_env() -> Self {
        let io_threads = match env::var(IO_THREADS_VAR) {
            Err(env::VarError::NotPresent) => DEFAULT_IO_THREADS,
            Err(env::VarError::NotUnicode(_)) => {
                warn!(
                    "{} is not valid unicode, falling back to {} io thread(s)",
                    IO_THREADS_VAR, DEFAULT_IO_THREADS
                );
                DEFAULT_IO_THREADS
            }
            Ok(raw) => match raw.trim().parse::<i64>() {
                Ok(n) if n > 0 => n as usize,
                _ => {
                    warn!(
                        "invalid {}={:?}, falling back to {} io thread(s)",
                        IO_THREADS_VAR, raw, DEFAULT_IO_THREADS
                    );
                    DEFAULT_IO_THREADS
                }
            },
        };
        Self { io_threads }
    }

    /// The lazily-created process-wide context.
    ///
    /// The environment override is read exactly once, on first call.
    #[must_use]
    pub fn global() -> Arc<Context> {
        Arc::clone(&GLOBAL)
    }

    /// Configured IO-thread count.
    #[must_use]
    pub const fn io_threads(&self) -> usize {
        self.io_threads
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(DEFAULT_IO_THREADS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_count() {
        assert_eq!(Context::new(4).io_threads(), 4);
    }

    #[test]
    fn test_zero_falls_back_to_default() {
        assert_eq!(Context::new(0).io_threads(), DEFAULT_IO_THREADS);
    }

    #[test]
    fn test_env_override() {
        // Serialize against other env-touching tests by using a dedicated
        // scope per case; from_env reads the variable fresh each call.
        env::set_var(IO_THREADS_VAR, "3");
        assert_eq!(Context::from_env().io_threads(), 3);

        env::set_var(IO_THREADS_VAR, "-2");
        assert_eq!(Context::from_env().io_threads(), DEFAULT_IO_THREADS);

        env::set_var(IO_THREADS_VAR, "many");
        assert_eq!(Context::from_env().io_threads(), DEFAULT_IO_THREADS);

        env::remove_var(IO_THREADS_VAR);
        assert_eq!(Context::from_env().io_threads(), DEFAULT_IO_THREADS);
    }

    #[test]
    fn test_global_is_shared() {
        let a = Context::global();
        let b = Context::global();
        assert_eq!(a.io_threads(), b.io_threads());
    }
}
