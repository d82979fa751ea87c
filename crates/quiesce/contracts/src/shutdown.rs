//! Shutdown request contract.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Why a shutdown was asked for.
///
/// Absence of a reason (`None` wherever an `Option<ShutdownReason>` is taken)
/// means a normal, voluntary shutdown.
#[derive(Clone)]
pub struct ShutdownReason(Arc<dyn Error + Send + Sync + 'static>);

impl ShutdownReason {
    /// Wrap an error or message as a shutdown cause.
    pub fn new<E>(cause: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        Self(Arc::from(cause.into()))
    }

    /// The underlying cause.
    pub fn cause(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Debug for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ShutdownReason")
            .field(&self.0.to_string())
            .finish()
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Something that can be told to shut down, possibly because of an error.
///
/// Fault detectors hold an `Arc<dyn Shutdowner>` and call it when they see a
/// condition the process cannot continue through. Implementations must not
/// block the caller.
pub trait Shutdowner: Send + Sync {
    /// Ask for shutdown. `None` means voluntary.
    fn request_shutdown(&self, reason: Option<ShutdownReason>);
}
