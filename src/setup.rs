use std::str::FromStr;

use tracing::{Dispatch, Level};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt};

use crate::backend::DispatchBackend;
use crate::encoder::RecordEncoder;
use crate::layer::RecordLayer;
use crate::{Encoding, Error, FileLogConfig, LogConfig, Logger, Result, RotatingWriter};

/// Build a logger for `config` with an optional CLI verbosity override.
///
/// Nothing process-wide is touched: the sinks are reachable only through the
/// returned [`Logger`].
pub fn build(config: &LogConfig, cli_verbose: Option<u8>) -> Result<Logger> {
    let stacktrace = stacktrace_level(config)?;
    let (dispatch, guard) = build_dispatch(config, cli_verbose)?;
    let backend = DispatchBackend::new(dispatch).with_stacktrace(stacktrace);
    Ok(Logger::new(backend).with_guard(guard))
}

/// Build a logger and make its sinks the process default for `tracing`.
///
/// Plain `tracing::info!` calls anywhere in the process end up in the same
/// file and console output. With `capture_log` set, records from the `log`
/// crate are bridged as well. Fails if a global subscriber already exists.
pub fn init_global(config: &LogConfig, cli_verbose: Option<u8>) -> Result<Logger> {
    let stacktrace = stacktrace_level(config)?;
    let (dispatch, guard) = build_dispatch(config, cli_verbose)?;

    tracing::dispatcher::set_global_default(dispatch.clone())
        .map_err(|e| Error::Init(e.to_string()))?;
    if config.capture_log {
        tracing_log::LogTracer::init().map_err(|e| Error::Init(e.to_string()))?;
    }

    let backend = DispatchBackend::new(dispatch).with_stacktrace(stacktrace);
    Ok(Logger::new(backend).with_guard(guard))
}

type Guard = Option<tracing_appender::non_blocking::WorkerGuard>;

/// Assemble filter, file sink and console sink into one dispatch.
fn build_dispatch(config: &LogConfig, cli_verbose: Option<u8>) -> Result<(Dispatch, Guard)> {
    let log_spec = effective_log_spec(config, cli_verbose, std::env::var("RUST_LOG").ok());
    let env_filter = EnvFilter::try_new(&log_spec).map_err(|e| Error::Config(e.to_string()))?;

    let (file_layer, guard) = match &config.file {
        Some(file_config) => {
            let (layer, guard) = file_layer(config, file_config)?;
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer = config.console.then(|| {
        let encoder = RecordEncoder::new(Encoding::Console)
            .with_caller(config.caller)
            .with_service(config.service_name());
        RecordLayer::new(encoder, std::io::stdout as fn() -> std::io::Stdout)
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer);

    Ok((Dispatch::new(subscriber), guard))
}

/// The file sink: rotating writer behind a non-blocking worker thread.
fn file_layer(
    config: &LogConfig,
    file_config: &FileLogConfig,
) -> Result<(
    RecordLayer<tracing_appender::non_blocking::NonBlocking>,
    tracing_appender::non_blocking::WorkerGuard,
)> {
    let writer = RotatingWriter::new(&file_config.path, file_config.rotation.clone())?
        .with_max_age(file_config.max_age());
    let (non_blocking, guard) = tracing_appender::non_blocking(writer);

    let encoder = RecordEncoder::new(config.format)
        .with_caller(config.caller)
        .with_service(config.service_name());
    Ok((RecordLayer::new(encoder, non_blocking), guard))
}

fn stacktrace_level(config: &LogConfig) -> Result<Option<Level>> {
    config
        .stacktrace
        .as_deref()
        .map(|level| {
            Level::from_str(level.trim())
                .map_err(|_| Error::Config(format!("invalid stacktrace level: {}", level)))
        })
        .transpose()
}

/// Determine the filter directives: `RUST_LOG`, then CLI verbosity, then config.
fn effective_log_spec(
    config: &LogConfig,
    cli_verbose: Option<u8>,
    rust_log: Option<String>,
) -> String {
    if let Some(rust_log) = rust_log
        && !rust_log.is_empty()
    {
        return rust_log;
    }

    let level = if config.level.is_empty() {
        "info".to_string()
    } else {
        config.level.clone()
    };

    match cli_verbose {
        None | Some(0) => level,
        Some(1) => "debug".to_string(),
        Some(_) => "trace".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_overrides_config_level() {
        let cfg = LogConfig::new().with_level("info");
        assert_eq!(
            effective_log_spec(&cfg, Some(2), Some("warn,hyper=off".to_string())),
            "warn,hyper=off"
        );
    }

    #[test]
    fn empty_rust_log_is_ignored() {
        let cfg = LogConfig::new().with_level("warn");
        assert_eq!(effective_log_spec(&cfg, None, Some(String::new())), "warn");
    }

    #[test]
    fn cli_verbosity_overrides_config_level() {
        let cfg = LogConfig::new().with_level("warn");
        assert_eq!(effective_log_spec(&cfg, None, None), "warn");
        assert_eq!(effective_log_spec(&cfg, Some(0), None), "warn");
        assert_eq!(effective_log_spec(&cfg, Some(1), None), "debug");
        assert_eq!(effective_log_spec(&cfg, Some(2), None), "trace");
        assert_eq!(effective_log_spec(&cfg, Some(9), None), "trace");
    }

    #[test]
    fn empty_config_level_defaults_to_info() {
        let cfg = LogConfig::new().with_level("");
        assert_eq!(effective_log_spec(&cfg, None, None), "info");
    }

    #[test]
    fn stacktrace_level_parsing() {
        let cfg = LogConfig::new();
        assert_eq!(stacktrace_level(&cfg).unwrap(), Some(Level::ERROR));
        let cfg = LogConfig::new().with_stacktrace(Some("warn"));
        assert_eq!(stacktrace_level(&cfg).unwrap(), Some(Level::WARN));
        let cfg = LogConfig::new().with_stacktrace(None);
        assert_eq!(stacktrace_level(&cfg).unwrap(), None);
        let cfg = LogConfig::new().with_stacktrace(Some("loud"));
        assert!(matches!(stacktrace_level(&cfg), Err(Error::Config(_))));
    }

    #[test]
    fn build_without_sinks_succeeds() {
        let logger = build(&LogConfig::new(), None).expect("build");
        logger.info("dropped", &[]);
    }

    #[test]
    fn build_rejects_bad_stacktrace_level() {
        let cfg = LogConfig::new().with_stacktrace(Some("nope"));
        assert!(build(&cfg, None).is_err());
    }

    #[test]
    fn build_with_unwritable_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let cfg = LogConfig::new().with_file(FileLogConfig::new(blocker.join("app.log")));
        assert!(matches!(build(&cfg, None), Err(Error::Io(_))));
    }
}
