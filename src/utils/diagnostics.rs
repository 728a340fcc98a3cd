use std::fmt::Debug;
use std::sync::Arc;

use tracing::Level;

use crate::utils::logging::LogLevel;

/// Leveled diagnostic sink handed to every component at construction.
///
/// The library never installs a global subscriber; whatever implements this
/// trait decides where messages go.
pub trait Diagnostics: Send + Sync + Debug {
    fn enabled(&self, level: Level) -> bool;

    fn log(&self, level: Level, message: &str);

    fn debug(&self, message: &str) {
        if self.enabled(Level::DEBUG) {
            self.log(Level::DEBUG, message);
        }
    }

    fn info(&self, message: &str) {
        if self.enabled(Level::INFO) {
            self.log(Level::INFO, message);
        }
    }

    fn warn(&self, message: &str) {
        if self.enabled(Level::WARN) {
            self.log(Level::WARN, message);
        }
    }

    fn error(&self, message: &str) {
        if self.enabled(Level::ERROR) {
            self.log(Level::ERROR, message);
        }
    }
}

pub type SharedDiagnostics = Arc<dyn Diagnostics>;

/// Forwards to `tracing` events, filtered by the client's own log level.
#[derive(Debug, Clone)]
pub struct TracingDiagnostics {
    max_level: Level,
}

impl TracingDiagnostics {
    pub fn new(level: LogLevel) -> Self {
        Self { max_level: level.as_level() }
    }

    pub fn shared(level: LogLevel) -> SharedDiagnostics {
        Arc::new(Self::new(level))
    }
}

impl Diagnostics for TracingDiagnostics {
    fn enabled(&self, level: Level) -> bool {
        // tracing orders levels by verbosity: TRACE > DEBUG > ... > ERROR
        level <= self.max_level
    }

    fn log(&self, level: Level, message: &str) {
        match level {
            Level::TRACE => tracing::trace!(target: "direct_access", "{}", message),
            Level::DEBUG => tracing::debug!(target: "direct_access", "{}", message),
            Level::INFO => tracing::info!(target: "direct_access", "{}", message),
            Level::WARN => tracing::warn!(target: "direct_access", "{}", message),
            Level::ERROR => tracing::error!(target: "direct_access", "{}", message),
        }
    }
}
