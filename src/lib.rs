//! # svclog
//!
//! Structured logging for server processes, built on `tracing`.
//!
//! ## Features
//!
//! - JSON file output with optional console mirroring
//! - Size and/or time based rotation with bounded, age-pruned backups
//! - Service name, caller location and error stack traces on every record
//! - Loosely typed key/value arguments flattened into structured fields
//!
//! ## Example
//!
//! ```rust
//! use svclog::{args, Arg, LogConfig, Logger};
//!
//! let logger = Logger::from_config(&LogConfig::new().with_service("auth"))?;
//!
//! logger.info("user signed in", &args!["user", "alice", "attempt", 3]);
//!
//! let err = std::io::Error::other("connection reset");
//! logger.error("session lost", &args!["user", "alice", "err", Arg::error(&err)]);
//!
//! logger.close();
//! # Ok::<(), svclog::Error>(())
//! ```

pub mod backend;
pub mod builder;
pub mod config;
pub mod encoder;
pub mod error;
pub mod field;
pub mod layer;
pub mod logger;
pub mod rotation;
pub mod setup;
pub mod writer;

pub use backend::{Backend, DispatchBackend};
pub use builder::LoggerBuilder;
pub use config::{CallerFormat, Encoding, FileLogConfig, LogConfig};
pub use error::{Error, Result};
pub use field::{Arg, Field, flatten};
pub use logger::Logger;
pub use rotation::{RotationPeriod, RotationTrigger};
pub use setup::init_global;
pub use writer::RotatingWriter;

/// Start configuring a [`Logger`].
pub fn builder() -> LoggerBuilder {
    LoggerBuilder::new()
}
