//! Logging collaborator.
//!
//! The client never writes diagnostics directly; it hands messages to a [`Logger`].
//! The default implementation forwards to the `log` facade, so any logger the host
//! application installs (`env_logger`, ...) picks them up.

/// Receives diagnostic messages from the client.
///
/// `log` returns whether logging is currently enabled, so callers can skip building
/// expensive messages.
pub trait Logger: Send + Sync {
    fn log(&self, message: &str) -> bool;

    /// Emits a warning. Defaults to a regular log line.
    fn warn(&self, message: &str) -> bool {
        self.log(message)
    }
}

/// Logger backed by the `log` crate.
#[derive(Debug, Clone, Copy)]
pub struct DefaultLogger {
    enabled: bool,
}

impl DefaultLogger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Logger for DefaultLogger {
    fn log(&self, message: &str) -> bool {
        if self.enabled {
            log::debug!("{message}");
        }
        self.enabled
    }

    fn warn(&self, message: &str) -> bool {
        if self.enabled {
            log::warn!("{message}");
        }
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_enabled_state() {
        assert!(DefaultLogger::new(true).log("hello"));
        assert!(!DefaultLogger::new(false).log("hello"));
        assert!(!DefaultLogger::new(false).warn("hello"));
    }

    struct Counting(std::sync::atomic::AtomicUsize);

    impl Logger for Counting {
        fn log(&self, _message: &str) -> bool {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            true
        }
    }

    #[test]
    fn warn_falls_back_to_log() {
        let logger = Counting(Default::default());
        logger.warn("one");
        logger.log("two");
        assert_eq!(logger.0.load(std::sync::atomic::Ordering::SeqCst), 2);
    }
}
