//! Shutdown requests.

use std::time::Duration;

use quiesce_contracts::ShutdownReason;
use tokio::time::Instant;

/// Parameters of one shutdown sequence.
#[derive(Debug, Clone, Default)]
pub struct ShutdownRequest {
    /// Why shutdown was initiated. `None` means normal/voluntary.
    pub reason: Option<ShutdownReason>,

    /// Absolute instant after which outstanding resources count as timed out.
    ///
    /// `None` waits for every resource without limit. Production callers
    /// should always supply a deadline; the coordinator imposes no cap of
    /// its own.
    pub deadline: Option<Instant>,
}

impl ShutdownRequest {
    /// Voluntary shutdown with no deadline.
    pub fn voluntary() -> Self {
        Self::default()
    }

    /// Voluntary shutdown bounded by an absolute deadline.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            reason: None,
            deadline: Some(deadline),
        }
    }

    /// Voluntary shutdown bounded by a timeout measured from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Attach a cause.
    pub fn because(mut self, reason: ShutdownReason) -> Self {
        self.reason = Some(reason);
        self
    }

    pub fn is_voluntary(&self) -> bool {
        self.reason.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voluntary_has_no_deadline() {
        let request = ShutdownRequest::voluntary();
        assert!(request.is_voluntary());
        assert!(request.deadline.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_absolute_deadline() {
        let now = Instant::now();
        let request = ShutdownRequest::with_timeout(Duration::from_millis(50))
            .because(ShutdownReason::new("upstream fault"));

        assert_eq!(request.deadline, Some(now + Duration::from_millis(50)));
        assert!(!request.is_voluntary());
        assert_eq!(request.reason.unwrap().to_string(), "upstream fault");
    }
}
