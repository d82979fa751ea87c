//! Delayed-close contract and its write-once completion signal.
//!
//! A [`DelayCloser`] is triggered synchronously and finishes asynchronously:
//! `close` must return immediately, and some time later, usually from another
//! task or thread, the implementation writes exactly one result into the
//! [`CloseSignal`] it was handed.
//!
//! The signal is single-writer, single-value and write-once. Every write
//! method takes `self` by value, so a second write cannot be expressed.
//! Writing after the listening side has gone away (for example once a
//! shutdown deadline has elapsed) is not an error; the value is discarded and
//! the write reports `false`.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Opaque error reported by a resource that failed to close.
///
/// Shared so that shutdown reports can be cloned and inspected by several
/// observers without re-interpreting the error.
pub type CloseError = Arc<dyn Error + Send + Sync + 'static>;

/// Plain message error used when a resource has nothing richer to report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CloseFailure(pub String);

impl CloseFailure {
    /// Failure recorded when a signal is dropped without ever being written.
    pub fn signal_dropped() -> Self {
        Self("completion signal dropped without a result".to_string())
    }
}

/// Build a [`CloseError`] from a message.
pub fn close_error(message: impl Into<String>) -> CloseError {
    Arc::new(CloseFailure(message.into()))
}

/// A value that needs to be closed but may take time to do so, usually
/// because it owns worker tasks.
pub trait DelayCloser: Send + Sync {
    /// Begin closing.
    ///
    /// Must return without blocking. Exactly one result must later be
    /// written to `signal`, from any thread.
    fn close(&self, signal: CloseSignal);
}

/// A single close result together with the instant it was written.
#[derive(Debug, Clone)]
pub struct CloseDelivery {
    /// `Ok(())` for a clean close, the resource's error otherwise.
    pub result: Result<(), CloseError>,

    /// Monotonic instant at which the resource wrote the result.
    pub delivered_at: Instant,
}

/// Create a connected signal/receiver pair.
pub fn close_channel() -> (CloseSignal, CloseReceiver) {
    let (sender, receiver) = oneshot::channel();
    (CloseSignal { sender }, CloseReceiver { receiver })
}

/// Write-once handle a [`DelayCloser`] uses to report its outcome.
#[must_use = "a close signal must be completed or failed exactly once"]
pub struct CloseSignal {
    sender: oneshot::Sender<CloseDelivery>,
}

impl CloseSignal {
    /// Report a clean close.
    pub fn complete(self) -> bool {
        self.finish(Ok(()))
    }

    /// Report a failed close.
    pub fn fail<E>(self, error: E) -> bool
    where
        E: Into<Box<dyn Error + Send + Sync + 'static>>,
    {
        self.finish(Err(Arc::from(error.into())))
    }

    /// Report an outcome.
    ///
    /// Returns `true` if the result reached a listener and `false` if it
    /// arrived after the listener was dropped.
    pub fn finish(self, result: Result<(), CloseError>) -> bool {
        let delivery = CloseDelivery {
            result,
            delivered_at: Instant::now(),
        };

        match self.sender.send(delivery) {
            Ok(()) => true,
            Err(_) => {
                tracing::trace!("close result delivered after listener went away; discarded");
                false
            }
        }
    }

    /// Whether the listening side has already stopped waiting.
    pub fn is_abandoned(&self) -> bool {
        self.sender.is_closed()
    }
}

impl fmt::Debug for CloseSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseSignal")
            .field("abandoned", &self.is_abandoned())
            .finish()
    }
}

/// Listening side of a [`CloseSignal`].
///
/// Resolves to `Some(delivery)` once the resource writes its result, or
/// `None` if the signal was dropped unwritten.
#[derive(Debug)]
pub struct CloseReceiver {
    receiver: oneshot::Receiver<CloseDelivery>,
}

impl Future for CloseReceiver {
    type Output = Option<CloseDelivery>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().receiver).poll(cx).map(Result::ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_complete_is_delivered() {
        let (signal, receiver) = close_channel();
        assert!(signal.complete());

        let delivery = receiver.await.expect("delivery");
        assert!(delivery.result.is_ok());
    }

    #[tokio::test]
    async fn test_fail_keeps_error_verbatim() {
        let (signal, receiver) = close_channel();
        assert!(signal.fail("disk full"));

        let delivery = receiver.await.expect("delivery");
        let err = delivery.result.unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[tokio::test]
    async fn test_dropped_signal_resolves_to_none() {
        let (signal, receiver) = close_channel();
        drop(signal);
        assert!(receiver.await.is_none());
    }

    #[tokio::test]
    async fn test_late_delivery_is_discarded() {
        let (signal, receiver) = close_channel();
        drop(receiver);

        assert!(signal.is_abandoned());
        assert!(!signal.complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivery_is_stamped_when_written() {
        let start = Instant::now();
        let (signal, receiver) = close_channel();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(25)).await;
            signal.complete();
        });

        let delivery = receiver.await.expect("delivery");
        assert_eq!(delivery.delivered_at - start, Duration::from_millis(25));
    }

    #[test]
    fn test_close_error_message() {
        let err = close_error("socket still busy");
        assert_eq!(err.to_string(), "socket still busy");
        assert_eq!(
            CloseFailure::signal_dropped().to_string(),
            "completion signal dropped without a result"
        );
    }
}
