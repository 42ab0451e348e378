use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;

use crate::backend::Backend;
use crate::{Arg, LogConfig, Result, flatten};

/// Handle for writing leveled messages with key/value arguments.
///
/// Clones share the same backend. When file output is configured the
/// background writer is flushed once the last clone is closed or dropped.
///
/// ```rust
/// use svclog::{args, LogConfig, Logger};
///
/// let logger = Logger::from_config(&LogConfig::new())?;
/// logger.info("user signed in", &args!["user", "alice", "attempt", 3]);
/// logger.close();
/// # Ok::<(), svclog::Error>(())
/// ```
#[derive(Clone)]
pub struct Logger {
    backend: Arc<dyn Backend>,
    guard: Option<Arc<WorkerGuard>>,
}

impl Logger {
    /// Wrap an arbitrary backend.
    pub fn new<B: Backend + 'static>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            guard: None,
        }
    }

    /// Build the configured sinks without touching process-wide state.
    pub fn from_config(config: &LogConfig) -> Result<Self> {
        crate::setup::build(config, None)
    }

    /// Keep `guard` alive for as long as any clone of this logger.
    pub(crate) fn with_guard(mut self, guard: Option<WorkerGuard>) -> Self {
        self.guard = guard.map(Arc::new);
        self
    }

    #[track_caller]
    pub fn debug(&self, message: &str, args: &[Arg<'_>]) {
        self.log(Level::DEBUG, message, args);
    }

    #[track_caller]
    pub fn info(&self, message: &str, args: &[Arg<'_>]) {
        self.log(Level::INFO, message, args);
    }

    #[track_caller]
    pub fn warn(&self, message: &str, args: &[Arg<'_>]) {
        self.log(Level::WARN, message, args);
    }

    #[track_caller]
    pub fn error(&self, message: &str, args: &[Arg<'_>]) {
        self.log(Level::ERROR, message, args);
    }

    /// Log at `level`. Fewer than two arguments means no fields are attached.
    ///
    /// The recorded caller is whoever called this method (or the level
    /// shortcut); wrappers that should be transparent need `#[track_caller]`
    /// themselves.
    #[track_caller]
    pub fn log(&self, level: Level, message: &str, args: &[Arg<'_>]) {
        let caller = Location::caller();
        if args.len() >= 2 {
            self.backend.log_at(level, message, &flatten(args), caller);
        } else {
            self.backend.log_at(level, message, &[], caller);
        }
    }

    /// Release this handle; the last one flushes pending file output.
    pub fn close(self) {
        drop(self);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("file_output", &self.guard.is_some())
            .finish_non_exhaustive()
    }
}
