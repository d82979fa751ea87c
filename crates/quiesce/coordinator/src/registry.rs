//! Resource registry and coordinator lifecycle phase.
//!
//! Phase and entries live together so that freezing the registry and taking
//! the shutdown snapshot happen as one step under one lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use quiesce_contracts::DelayCloser;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::{CoordinatorError, CoordinatorResult};
use crate::ids::ResourceId;
use crate::report::ShutdownReport;

/// Lifecycle phase of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordinatorPhase {
    /// Accepting registrations.
    Open,
    /// Shutdown sequence running; registry frozen.
    ShuttingDown,
    /// Shutdown sequence finished.
    Terminal,
}

impl fmt::Display for CoordinatorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorPhase::Open => write!(f, "open"),
            CoordinatorPhase::ShuttingDown => write!(f, "shutting-down"),
            CoordinatorPhase::Terminal => write!(f, "terminal"),
        }
    }
}

/// One registered resource.
pub(crate) struct Registration {
    pub id: ResourceId,
    pub closer: Arc<dyn DelayCloser>,
    pub registered_at: Instant,
    sequence: u64,
}

pub(crate) struct Registry {
    phase: CoordinatorPhase,
    entries: HashMap<ResourceId, Registration>,
    next_sequence: u64,
    report: Option<ShutdownReport>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            phase: CoordinatorPhase::Open,
            entries: HashMap::new(),
            next_sequence: 0,
            report: None,
        }
    }

    pub fn phase(&self) -> CoordinatorPhase {
        self.phase
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn insert(&mut self, id: ResourceId, closer: Arc<dyn DelayCloser>) -> CoordinatorResult<()> {
        if self.phase != CoordinatorPhase::Open {
            return Err(CoordinatorError::CoordinatorClosed);
        }
        if self.entries.contains_key(&id) {
            return Err(CoordinatorError::AlreadyRegistered(id));
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.entries.insert(
            id.clone(),
            Registration {
                id,
                closer,
                registered_at: Instant::now(),
                sequence,
            },
        );
        Ok(())
    }

    pub fn remove(&mut self, id: &ResourceId) -> CoordinatorResult<Arc<dyn DelayCloser>> {
        if self.phase != CoordinatorPhase::Open {
            return Err(CoordinatorError::CoordinatorClosed);
        }
        self.entries
            .remove(id)
            .map(|registration| registration.closer)
            .ok_or_else(|| CoordinatorError::NotFound(id.clone()))
    }

    /// Ids in registration order.
    pub fn ids(&self) -> Vec<ResourceId> {
        let mut entries: Vec<&Registration> = self.entries.values().collect();
        entries.sort_by_key(|registration| registration.sequence);
        entries.into_iter().map(|registration| registration.id.clone()).collect()
    }

    /// Freeze the registry and hand out everything registered, in
    /// registration order.
    pub fn begin_shutdown(&mut self) -> CoordinatorResult<Vec<Registration>> {
        if self.phase != CoordinatorPhase::Open {
            return Err(CoordinatorError::AlreadyShuttingDown);
        }
        self.phase = CoordinatorPhase::ShuttingDown;

        let mut snapshot: Vec<Registration> = self.entries.drain().map(|(_, r)| r).collect();
        snapshot.sort_by_key(|registration| registration.sequence);
        Ok(snapshot)
    }

    pub fn finish(&mut self, report: ShutdownReport) {
        self.phase = CoordinatorPhase::Terminal;
        self.report = Some(report);
    }

    pub fn report(&self) -> Option<&ShutdownReport> {
        self.report.as_ref()
    }
}
