//! Contracts for dumping large chunks of data.
//!
//! Where the bytes end up is up to the implementation. A dumper that holds a
//! handle releases it when dropped.

use serde::Serialize;
use thiserror::Error;

/// Errors raised while dumping.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("dump target unavailable: {0}")]
    Unavailable(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Writes raw data or JSON values to a single dump target.
pub trait Dumper: Send {
    fn dump(&mut self, data: &[u8]) -> Result<(), DumpError>;

    /// Dump a JSON value, pretty-printed.
    fn dump_value(&mut self, value: &serde_json::Value) -> Result<(), DumpError> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.dump(&bytes)
    }
}

/// Creates named dumpers.
pub trait DumperFactory: Send + Sync {
    fn create(&self, name: &str) -> Result<Box<dyn Dumper>, DumpError>;

    /// Create a dumper, write one buffer, and release it.
    fn dump(&self, name: &str, data: &[u8]) -> Result<(), DumpError> {
        let mut dumper = self.create(name)?;
        dumper.dump(data)
    }

    /// Create a dumper, write one value, and release it.
    fn dump_value(&self, name: &str, value: &serde_json::Value) -> Result<(), DumpError> {
        let mut dumper = self.create(name)?;
        dumper.dump_value(value)
    }
}

/// Serialize any value and dump it.
pub fn dump_serialized<T>(dumper: &mut dyn Dumper, value: &T) -> Result<(), DumpError>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(value)?;
    dumper.dump_value(&value)
}
