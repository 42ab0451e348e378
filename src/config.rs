use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::RotationTrigger;

/// Configuration for a service logger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Mirror records to stdout
    #[serde(default)]
    pub console: bool,
    /// Minimum level or filter directive (e.g., "info", "debug,hyper=warn")
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Encoding of the log file
    #[serde(default)]
    pub format: Encoding,
    /// Service name tagged on every record as `svr`
    #[serde(default)]
    pub service: Option<String>,
    /// How the caller location is rendered
    #[serde(default)]
    pub caller: CallerFormat,
    /// Lowest level that carries a stack trace; `None` disables stack traces
    #[serde(default = "default_stacktrace")]
    pub stacktrace: Option<String>,
    /// Route records from the `log` crate into the same sinks once installed globally
    #[serde(default)]
    pub capture_log: bool,
    /// File logging configuration
    pub file: Option<FileLogConfig>,
}

impl LogConfig {
    /// Create a new LogConfig with defaults
    pub fn new() -> Self {
        Self {
            console: false,
            level: default_log_level(),
            format: Encoding::default(),
            service: None,
            caller: CallerFormat::default(),
            stacktrace: default_stacktrace(),
            capture_log: false,
            file: None,
        }
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_format(mut self, format: Encoding) -> Self {
        self.format = format;
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_caller(mut self, caller: CallerFormat) -> Self {
        self.caller = caller;
        self
    }

    /// Set the lowest level that captures a stack trace, or `None` to disable.
    pub fn with_stacktrace(mut self, level: Option<&str>) -> Self {
        self.stacktrace = level.map(str::to_string);
        self
    }

    pub fn with_capture_log(mut self, capture: bool) -> Self {
        self.capture_log = capture;
        self
    }

    pub fn with_file(mut self, file: FileLogConfig) -> Self {
        self.file = Some(file);
        self
    }

    /// The service tag, if one is set and non-empty.
    pub fn service_name(&self) -> Option<&str> {
        self.service.as_deref().filter(|s| !s.is_empty())
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_stacktrace() -> Option<String> {
    Some("error".to_string())
}

/// Line encoding of a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// One JSON object per line.
    #[default]
    Json,
    /// Tab separated, human readable.
    Console,
}

/// Rendering of the source location that issued a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerFormat {
    /// Parent directory and file name: `handlers/user.rs:42`.
    #[default]
    Short,
    /// The path as recorded by the compiler.
    Full,
    /// No caller key.
    Off,
}

impl CallerFormat {
    /// Render `file:line`, or `None` when callers are switched off.
    pub fn render(&self, file: &str, line: u32) -> Option<String> {
        match self {
            Self::Off => None,
            Self::Full => Some(format!("{}:{}", file, line)),
            Self::Short => {
                let trimmed = file.trim_end_matches(['/', '\\']);
                let short = match trimmed.rfind(['/', '\\']) {
                    Some(idx) => match trimmed[..idx].rfind(['/', '\\']) {
                        Some(parent) => &trimmed[parent + 1..],
                        None => trimmed,
                    },
                    None => trimmed,
                };
                Some(format!("{}:{}", short, line))
            }
        }
    }
}

/// Configuration for file logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileLogConfig {
    /// Path to the active log file
    pub path: PathBuf,
    /// Log rotation trigger
    #[serde(default = "RotationTrigger::default_size")]
    pub rotation: RotationTrigger,
    /// Rotated files older than this many days are removed; `None` keeps them
    #[serde(default = "default_max_age_days")]
    pub max_age_days: Option<u32>,
}

impl FileLogConfig {
    /// Create a new FileLogConfig rotating at 100 MB with 10 backups kept for 10 days
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            rotation: RotationTrigger::default_size(),
            max_age_days: default_max_age_days(),
        }
    }

    pub fn with_rotation_trigger(mut self, rotation: RotationTrigger) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_max_age_days(mut self, days: Option<u32>) -> Self {
        self.max_age_days = days;
        self
    }

    pub fn max_age(&self) -> Option<std::time::Duration> {
        self.max_age_days
            .map(|days| std::time::Duration::from_secs(u64::from(days) * 24 * 60 * 60))
    }
}

fn default_max_age_days() -> Option<u32> {
    Some(10)
}
