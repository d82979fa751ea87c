//! Events broadcast by the coordinator.

use crate::ids::ResourceId;
use crate::report::ShutdownSummary;

/// Events emitted by the shutdown coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownEvent {
    /// Resource was added to the registry.
    Registered(ResourceId),

    /// Resource was removed before shutdown.
    Unregistered(ResourceId),

    /// Shutdown was asked for through the `Shutdowner` contract.
    ShutdownRequested { reason: Option<String> },

    /// Shutdown sequence began with this many resources.
    ShutdownStarted { resources: usize, voluntary: bool },

    /// Resource closed cleanly in time.
    ResourceClosed(ResourceId),

    /// Resource reported an error in time.
    ResourceFailed {
        resource_id: ResourceId,
        error: String,
    },

    /// Resource did not report in time.
    ResourceTimedOut(ResourceId),

    /// Shutdown sequence finished; the coordinator is terminal.
    ShutdownCompleted(ShutdownSummary),
}
