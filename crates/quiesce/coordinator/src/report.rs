//! Aggregated shutdown outcome.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use quiesce_contracts::{CloseError, ShutdownReason};
use serde::{Deserialize, Serialize};

use crate::ids::ResourceId;

/// How a single resource ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceOutcome {
    /// Reported success at or before the deadline.
    Completed,
    /// Reported an error at or before the deadline.
    Failed,
    /// Reported nothing by the deadline, or reported after it.
    TimedOut,
}

impl fmt::Display for ResourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceOutcome::Completed => write!(f, "completed"),
            ResourceOutcome::Failed => write!(f, "failed"),
            ResourceOutcome::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Result of one shutdown sequence.
///
/// `completed`, `failed` and `timed_out` partition the registry snapshot
/// taken when shutdown began: every id appears in exactly one of them.
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    /// Resources that closed cleanly in time.
    pub completed: BTreeSet<ResourceId>,

    /// Resources that reported an error in time, with the error verbatim.
    pub failed: BTreeMap<ResourceId, CloseError>,

    /// Resources with no usable signal by the deadline.
    pub timed_out: BTreeSet<ResourceId>,

    /// Cause carried by the request, if any.
    pub reason: Option<ShutdownReason>,

    /// Wall-clock time at which the sequence began.
    pub started_at: DateTime<Utc>,

    /// Time spent between triggering and aggregation.
    pub elapsed: Duration,
}

impl ShutdownReport {
    pub(crate) fn new(reason: Option<ShutdownReason>, started_at: DateTime<Utc>) -> Self {
        Self {
            completed: BTreeSet::new(),
            failed: BTreeMap::new(),
            timed_out: BTreeSet::new(),
            reason,
            started_at,
            elapsed: Duration::ZERO,
        }
    }

    /// Number of resources the sequence covered.
    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len() + self.timed_out.len()
    }

    /// True when every resource closed cleanly in time.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.timed_out.is_empty()
    }

    /// Outcome for one resource, or `None` if it was not part of the sequence.
    pub fn outcome_of(&self, id: &ResourceId) -> Option<ResourceOutcome> {
        if self.completed.contains(id) {
            Some(ResourceOutcome::Completed)
        } else if self.failed.contains_key(id) {
            Some(ResourceOutcome::Failed)
        } else if self.timed_out.contains(id) {
            Some(ResourceOutcome::TimedOut)
        } else {
            None
        }
    }

    /// Error reported by a failed resource.
    pub fn error_of(&self, id: &ResourceId) -> Option<&CloseError> {
        self.failed.get(id)
    }

    /// Counts only, for events and logs.
    pub fn summary(&self) -> ShutdownSummary {
        ShutdownSummary {
            completed: self.completed.len(),
            failed: self.failed.len(),
            timed_out: self.timed_out.len(),
            elapsed_ms: self.elapsed.as_millis() as u64,
        }
    }
}

/// Outcome counts of a shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShutdownSummary {
    pub completed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub elapsed_ms: u64,
}

impl fmt::Display for ShutdownSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} completed, {} failed, {} timed out in {}ms",
            self.completed, self.failed, self.timed_out, self.elapsed_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiesce_contracts::close_error;

    fn sample() -> ShutdownReport {
        let mut report = ShutdownReport::new(None, Utc::now());
        report.completed.insert(ResourceId::new("a"));
        report
            .failed
            .insert(ResourceId::new("b"), close_error("disk full"));
        report.timed_out.insert(ResourceId::new("c"));
        report.elapsed = Duration::from_millis(50);
        report
    }

    #[test]
    fn test_outcome_lookup() {
        let report = sample();

        assert_eq!(report.outcome_of(&"a".into()), Some(ResourceOutcome::Completed));
        assert_eq!(report.outcome_of(&"b".into()), Some(ResourceOutcome::Failed));
        assert_eq!(report.outcome_of(&"c".into()), Some(ResourceOutcome::TimedOut));
        assert_eq!(report.outcome_of(&"d".into()), None);
        assert_eq!(report.error_of(&"b".into()).unwrap().to_string(), "disk full");
    }

    #[test]
    fn test_summary() {
        let report = sample();
        assert_eq!(report.total(), 3);
        assert!(!report.is_clean());
        assert_eq!(
            report.summary().to_string(),
            "1 completed, 1 failed, 1 timed out in 50ms"
        );
    }

    #[test]
    fn test_empty_report_is_clean() {
        let report = ShutdownReport::new(None, Utc::now());
        assert_eq!(report.total(), 0);
        assert!(report.is_clean());
    }
}
