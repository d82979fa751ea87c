//! Coordinator configuration.
//!
//! Values are layered: built-in defaults, then an optional file, then
//! `QUIESCE_`-prefixed environment variables (`QUIESCE_EVENT_CAPACITY=64`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoordinatorError, CoordinatorResult};

/// Configuration for a [`ShutdownCoordinator`](crate::ShutdownCoordinator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Grace period applied when shutdown is triggered through the
    /// `Shutdowner` contract. `None` waits without limit.
    pub default_grace_period_ms: Option<u64>,

    /// Capacity of the shutdown event broadcast channel.
    pub event_capacity: usize,

    /// Emit one log line per resource outcome.
    pub log_progress: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_grace_period_ms: Some(default_grace_period_ms()),
            event_capacity: default_event_capacity(),
            log_progress: true,
        }
    }
}

fn default_grace_period_ms() -> u64 {
    30_000
}

fn default_event_capacity() -> usize {
    256
}

impl CoordinatorConfig {
    /// Load configuration from defaults, an optional file and the environment.
    pub fn load(path: Option<&str>) -> CoordinatorResult<Self> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&CoordinatorConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("QUIESCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: CoordinatorConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the coordinator cannot run with.
    pub fn validate(&self) -> CoordinatorResult<()> {
        if self.event_capacity == 0 {
            return Err(CoordinatorError::Config(
                "event_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Grace period as a duration.
    pub fn default_grace_period(&self) -> Option<Duration> {
        self.default_grace_period_ms.map(Duration::from_millis)
    }

    /// Set the grace period used for requested shutdowns.
    pub fn with_grace_period(mut self, grace: Option<Duration>) -> Self {
        self.default_grace_period_ms = grace.map(|g| g.as_millis() as u64);
        self
    }
}
