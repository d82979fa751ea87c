//! Sectioned configuration lookup.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLookupError {
    #[error("configuration value {section}.{name} not found")]
    Missing { section: String, name: String },

    #[error("configuration value {section}.{name} is invalid: {reason}")]
    Invalid {
        section: String,
        name: String,
        reason: String,
    },
}

/// Read-only access to `section.name` style configuration values.
pub trait ConfigSource: Send + Sync {
    fn value(&self, section: &str, name: &str) -> Result<String, ConfigLookupError>;
}

impl ConfigSource for config::Config {
    fn value(&self, section: &str, name: &str) -> Result<String, ConfigLookupError> {
        let key = format!("{}.{}", section, name);
        self.get_string(&key).map_err(|e| match e {
            config::ConfigError::NotFound(_) => ConfigLookupError::Missing {
                section: section.to_string(),
                name: name.to_string(),
            },
            other => ConfigLookupError::Invalid {
                section: section.to_string(),
                name: name.to_string(),
                reason: other.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layered() -> config::Config {
        config::Config::builder()
            .set_default("shutdown.grace_period_ms", 500)
            .unwrap()
            .set_default("shutdown.owner", "ingest")
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_value_lookup() {
        let source = layered();
        assert_eq!(source.value("shutdown", "owner").unwrap(), "ingest");
        assert_eq!(source.value("shutdown", "grace_period_ms").unwrap(), "500");
    }

    #[test]
    fn test_missing_value() {
        let source: Box<dyn ConfigSource> = Box::new(layered());
        let err = source.value("shutdown", "nope").unwrap_err();
        assert!(matches!(err, ConfigLookupError::Missing { .. }));
        assert_eq!(err.to_string(), "configuration value shutdown.nope not found");
    }
}
