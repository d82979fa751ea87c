//! Minimal logging contract and a `tracing` adapter.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::Level;

/// Errors a logger may report. Callers treat logging as best-effort.
#[derive(Debug, Error)]
pub enum LogError {
    /// The logger cannot accept entries any more.
    #[error("logger unavailable: {0}")]
    Unavailable(String),

    /// An entry could not be written.
    #[error("failed to write log entry: {0}")]
    Write(String),
}

/// Minimal logging capability with an unformatted and a formatted entry point.
pub trait Logger: Send + Sync {
    /// Write a message as-is.
    fn log(&self, message: &str) -> Result<(), LogError>;

    /// Write a formatted message. Use through [`logf!`](crate::logf).
    fn log_fmt(&self, args: fmt::Arguments<'_>) -> Result<(), LogError> {
        match args.as_str() {
            Some(message) => self.log(message),
            None => self.log(&args.to_string()),
        }
    }
}

/// Creates named loggers.
pub trait LoggerFactory: Send + Sync {
    fn create(&self, name: &str) -> Result<Arc<dyn Logger>, LogError>;
}

/// Format and write through a [`Logger`].
///
/// ```
/// use quiesce_contracts::{logf, Logger, TracingLogger};
///
/// let logger = TracingLogger::new("pool");
/// let _ = logf!(logger, "{} workers stopped", 4);
/// ```
#[macro_export]
macro_rules! logf {
    ($logger:expr, $($arg:tt)+) => {
        $crate::Logger::log_fmt(&$logger, format_args!($($arg)+))
    };
}

/// [`Logger`] that emits `tracing` events tagged with the logger name.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    name: String,
    level: Level,
}

impl TracingLogger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: Level::INFO,
        }
    }

    /// Emit at a different level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Logger for TracingLogger {
    fn log(&self, message: &str) -> Result<(), LogError> {
        let logger = self.name.as_str();
        match self.level {
            Level::ERROR => tracing::error!(logger, "{}", message),
            Level::WARN => tracing::warn!(logger, "{}", message),
            Level::INFO => tracing::info!(logger, "{}", message),
            Level::DEBUG => tracing::debug!(logger, "{}", message),
            _ => tracing::trace!(logger, "{}", message),
        }
        Ok(())
    }
}

/// Hands out [`TracingLogger`]s at a fixed level.
#[derive(Debug, Clone)]
pub struct TracingLoggerFactory {
    level: Level,
}

impl TracingLoggerFactory {
    pub fn new(level: Level) -> Self {
        Self { level }
    }
}

impl Default for TracingLoggerFactory {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl LoggerFactory for TracingLoggerFactory {
    fn create(&self, name: &str) -> Result<Arc<dyn Logger>, LogError> {
        if name.is_empty() {
            return Err(LogError::Unavailable("logger name must not be empty".to_string()));
        }
        Ok(Arc::new(TracingLogger::new(name).with_level(self.level)))
    }
}
