//! Builder pattern for setting up a service logger.
//!
//! # Example
//!
//! ```rust,no_run
//! use svclog::args;
//!
//! let logger = svclog::builder()
//!     .with_service("billing")
//!     .with_console(true)
//!     .with_file("/var/log/billing/app.log")
//!     .init()
//!     .expect("Failed to initialize logging");
//!
//! logger.info("invoice sent", &args!["invoice", 1042, "amount", "19.99"]);
//! ```

use crate::{
    CallerFormat, Encoding, FileLogConfig, LogConfig, Logger, Result, RotationTrigger, setup,
};
use std::path::PathBuf;

/// A builder for configuring and creating a [`Logger`].
#[derive(Debug, Clone)]
pub struct LoggerBuilder {
    config: LogConfig,
    verbose: Option<u8>,
}

impl LoggerBuilder {
    /// Create a new LoggerBuilder with default configuration.
    pub fn new() -> Self {
        Self::from_config(LogConfig::new())
    }

    /// Create a LoggerBuilder from an existing configuration.
    pub fn from_config(config: LogConfig) -> Self {
        Self {
            config,
            verbose: None,
        }
    }

    /// Mirror records to stdout.
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.config = self.config.with_console(enabled);
        self
    }

    /// Set the level or filter directive (e.g., "debug", "info,hyper=warn").
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.config = self.config.with_level(level);
        self
    }

    /// Apply a `-v` count from the command line; `RUST_LOG` still wins.
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Set the file encoding.
    pub fn with_format(mut self, format: Encoding) -> Self {
        self.config = self.config.with_format(format);
        self
    }

    /// Tag every record with a service name.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.config = self.config.with_service(service);
        self
    }

    pub fn with_caller(mut self, caller: CallerFormat) -> Self {
        self.config = self.config.with_caller(caller);
        self
    }

    pub fn with_stacktrace(mut self, level: Option<&str>) -> Self {
        self.config = self.config.with_stacktrace(level);
        self
    }

    pub fn with_capture_log(mut self, capture: bool) -> Self {
        self.config = self.config.with_capture_log(capture);
        self
    }

    /// Log to a file with the default rotation (100 MB, 10 backups, 10 days).
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config = self.config.with_file(FileLogConfig::new(path));
        self
    }

    /// Log to a file with a custom FileLogConfig.
    pub fn with_file_config(mut self, file_config: FileLogConfig) -> Self {
        self.config = self.config.with_file(file_config);
        self
    }

    /// Set the rotation trigger for file logging.
    ///
    /// If no file is configured yet, this configures "app.log".
    pub fn with_rotation(mut self, rotation: RotationTrigger) -> Self {
        match self.config.file.as_mut() {
            Some(file) => file.rotation = rotation,
            None => {
                self.config.file = Some(FileLogConfig::new("app.log").with_rotation_trigger(rotation))
            }
        }
        self
    }

    /// Get the current configuration without creating a logger.
    pub fn build(self) -> LogConfig {
        self.config
    }

    /// Create the logger without installing anything process-wide.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be opened or the level or
    /// stack trace setting does not parse.
    pub fn init(self) -> Result<Logger> {
        setup::build(&self.config, self.verbose)
    }

    /// Create the logger and install its sinks as the global `tracing` default.
    ///
    /// # Errors
    ///
    /// As [`init`](Self::init), plus an error if a global subscriber (or
    /// `log` bridge, when capturing) is already installed.
    pub fn init_global(self) -> Result<Logger> {
        setup::init_global(&self.config, self.verbose)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_new() {
        let config = LoggerBuilder::new().build();
        assert!(!config.console);
        assert_eq!(config.level, "info");
        assert_eq!(config.format, Encoding::Json);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_builder_chaining() {
        let config = LoggerBuilder::new()
            .with_console(true)
            .with_level("debug")
            .with_format(Encoding::Console)
            .with_service("payments")
            .with_caller(CallerFormat::Off)
            .with_stacktrace(Some("warn"))
            .with_capture_log(true)
            .with_file("app.log")
            .build();

        assert!(config.console);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, Encoding::Console);
        assert_eq!(config.service_name(), Some("payments"));
        assert_eq!(config.caller, CallerFormat::Off);
        assert_eq!(config.stacktrace.as_deref(), Some("warn"));
        assert!(config.capture_log);
        assert_eq!(config.file.unwrap().path, PathBuf::from("app.log"));
    }

    #[test]
    fn test_builder_from_config() {
        let original = LogConfig::new().with_console(true).with_level("warn");
        let config = LoggerBuilder::from_config(original.clone()).build();
        assert_eq!(config.console, original.console);
        assert_eq!(config.level, original.level);
    }

    #[test]
    fn test_builder_with_rotation_updates_file() {
        let config = LoggerBuilder::new()
            .with_file("test.log")
            .with_rotation(RotationTrigger::size(1024 * 1024, 5))
            .build();
        let file = config.file.unwrap();
        assert_eq!(file.path, PathBuf::from("test.log"));
        assert_eq!(file.rotation, RotationTrigger::size(1024 * 1024, 5));
    }

    #[test]
    fn test_builder_with_rotation_defaults_path() {
        let config = LoggerBuilder::new()
            .with_rotation(RotationTrigger::Never)
            .build();
        let file = config.file.unwrap();
        assert_eq!(file.path, PathBuf::from("app.log"));
        assert_eq!(file.rotation, RotationTrigger::Never);
    }

    #[test]
    fn test_builder_init_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("svc.log");
        let logger = LoggerBuilder::new()
            .with_level("debug")
            .with_file(&path)
            .init()
            .expect("init");

        logger.debug("built", &[]);
        logger.close();

        assert!(std::fs::read_to_string(&path).unwrap().contains("\"msg\":\"built\""));
    }
}
