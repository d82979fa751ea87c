//! # Quiesce Coordinator - Graceful Multi-Resource Shutdown
//!
//! A [`ShutdownCoordinator`] owns a registry of resources that close with
//! delayed-completion semantics ([`DelayCloser`](quiesce_contracts::DelayCloser)).
//! On shutdown it triggers all of them at once and aggregates their
//! completion signals under a deadline.
//!
//! ## Lifecycle
//!
//! ```text
//! OPEN --shutdown()--> SHUTTING_DOWN --(all signals | deadline)--> TERMINAL
//! OPEN --register/unregister--> OPEN
//! SHUTTING_DOWN / TERMINAL --register/unregister--> error
//! ```
//!
//! ## Partial failure
//!
//! Shutdown always finishes in bounded time when given a deadline, and
//! reports what happened instead of failing outright: every resource in the
//! snapshot lands in exactly one of `completed`, `failed` or `timed_out`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use quiesce_contracts::{CloseSignal, DelayCloser};
//! use quiesce_coordinator::{CoordinatorConfig, ShutdownCoordinator, ShutdownRequest};
//!
//! struct WorkerPool;
//!
//! impl DelayCloser for WorkerPool {
//!     fn close(&self, signal: CloseSignal) {
//!         tokio::spawn(async move {
//!             // stop workers, flush queues...
//!             signal.complete();
//!         });
//!     }
//! }
//!
//! # async fn example() {
//! let coordinator = ShutdownCoordinator::new(CoordinatorConfig::default());
//! coordinator.register("workers", Arc::new(WorkerPool)).unwrap();
//!
//! let report = coordinator
//!     .shutdown(ShutdownRequest::with_timeout(Duration::from_secs(5)))
//!     .await
//!     .unwrap();
//! println!("{}", report.summary());
//! # }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod ids;
mod registry;
pub mod report;
pub mod request;

pub use config::CoordinatorConfig;
pub use coordinator::ShutdownCoordinator;
pub use error::{CoordinatorError, CoordinatorResult};
pub use events::ShutdownEvent;
pub use ids::ResourceId;
pub use registry::CoordinatorPhase;
pub use report::{ResourceOutcome, ShutdownReport, ShutdownSummary};
pub use request::ShutdownRequest;

#[cfg(test)]
mod tests {
    use super::*;
    use quiesce_contracts::{CloseSignal, DelayCloser};
    use std::sync::Arc;
    use std::time::Duration;

    struct Immediate;

    impl DelayCloser for Immediate {
        fn close(&self, signal: CloseSignal) {
            signal.complete();
        }
    }

    #[tokio::test]
    async fn test_coordinator_integration() {
        let coordinator = ShutdownCoordinator::new(CoordinatorConfig::default());
        assert!(coordinator.is_empty());

        coordinator.register("x", Arc::new(Immediate)).unwrap();
        assert_eq!(
            coordinator.register("x", Arc::new(Immediate)),
            Err(CoordinatorError::AlreadyRegistered(ResourceId::new("x")))
        );
        assert_eq!(coordinator.len(), 1);

        let report = coordinator
            .shutdown(ShutdownRequest::with_timeout(Duration::from_secs(1)))
            .await
            .unwrap();

        assert_eq!(
            report.outcome_of(&ResourceId::new("x")),
            Some(ResourceOutcome::Completed)
        );
        assert_eq!(coordinator.phase(), CoordinatorPhase::Terminal);
    }
}
