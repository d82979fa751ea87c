//! # Quiesce Contracts
//!
//! Small, independent capability traits shared by services that need to be
//! shut down gracefully. Each concern is its own trait so a collaborator
//! implements only what it needs and is handed around as `Arc<dyn _>`.
//!
//! - [`DelayCloser`] + [`CloseSignal`]: close now, report exactly once later
//! - [`Shutdowner`]: ask something to shut down, optionally with a cause
//! - [`Logger`] / [`LoggerFactory`]: minimal logging, with a `tracing` adapter
//! - [`Dumper`] / [`DumperFactory`]: dump raw bytes or JSON values
//! - [`Task`]: a named, runnable unit of work
//! - [`ConfigSource`]: `section.name` configuration lookup
//! - [`PersistentState`]: save and retrieve named state
//!
//! ## Example
//!
//! ```rust
//! use quiesce_contracts::{close_channel, CloseSignal, DelayCloser};
//!
//! struct Pool;
//!
//! impl DelayCloser for Pool {
//!     fn close(&self, signal: CloseSignal) {
//!         std::thread::spawn(move || {
//!             // drain workers...
//!             signal.complete();
//!         });
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (signal, receiver) = close_channel();
//! Pool.close(signal);
//! let delivery = receiver.await.expect("pool reports once");
//! assert!(delivery.result.is_ok());
//! # }
//! ```

pub mod close;
pub mod config_source;
pub mod dump;
pub mod logging;
pub mod shutdown;
pub mod state;
pub mod task;

pub use close::{
    close_channel, close_error, CloseDelivery, CloseError, CloseFailure, CloseReceiver,
    CloseSignal, DelayCloser,
};
pub use config_source::{ConfigLookupError, ConfigSource};
pub use dump::{dump_serialized, DumpError, Dumper, DumperFactory};
pub use logging::{LogError, Logger, LoggerFactory, TracingLogger, TracingLoggerFactory};
pub use shutdown::{ShutdownReason, Shutdowner};
pub use state::{
    MemoryState, PersistentState, PersistentStateExt, StateError, StateResult,
};
pub use task::{Task, TaskError};
