//! Environment layering for coordinator configuration.
//!
//! Lives in its own test binary because it mutates process environment.

use std::io::Write;
use std::time::Duration;

use quiesce_coordinator::CoordinatorConfig;

#[test]
fn environment_overrides_file_and_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "default_grace_period_ms = 1500").unwrap();
    writeln!(file, "event_capacity = 64").unwrap();

    std::env::set_var("QUIESCE_DEFAULT_GRACE_PERIOD_MS", "250");
    std::env::set_var("QUIESCE_LOG_PROGRESS", "false");

    let path = file.path().to_str().unwrap().to_string();
    let config = CoordinatorConfig::load(Some(&path)).unwrap();

    std::env::remove_var("QUIESCE_DEFAULT_GRACE_PERIOD_MS");
    std::env::remove_var("QUIESCE_LOG_PROGRESS");

    assert_eq!(config.default_grace_period(), Some(Duration::from_millis(250)));
    assert_eq!(config.event_capacity, 64);
    assert!(!config.log_progress);
}
