//! A small service wiring up file and console output.
//!
//! Run with:
//! ```bash
//! cargo run --example service
//! ```

use svclog::{Arg, RotationTrigger, args};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logger = svclog::builder()
        .with_service("demo")
        .with_console(true)
        .with_level("debug")
        .with_file("logs/demo.log")
        .with_rotation(RotationTrigger::size(10 * 1024 * 1024, 3))
        .init_global()?;

    logger.debug("starting", &args!["pid", std::process::id()]);
    logger.info("listening", &args!["addr", "0.0.0.0:8080", "workers", 4]);

    // Plain tracing calls reach the same sinks once installed globally.
    tracing::info!(requests = 0, "metrics reset");

    match std::fs::read_to_string("does-not-exist.toml") {
        Ok(_) => logger.info("config loaded", &[]),
        Err(err) => logger.warn("config missing, using defaults", &args!["err", Arg::error(&err)]),
    }

    logger.error("upstream unavailable", &args!["upstream", "billing", "retry_in_s", 30]);

    logger.close();
    Ok(())
}
