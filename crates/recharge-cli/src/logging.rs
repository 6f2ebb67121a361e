use crate::error::{CliError, Result};
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt,
    prelude::*,
};

/// Maps the `-v` count (and `-q`) onto the most detailed level to emit.
fn verbosity_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::OFF;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Builds the target filter: the `recharge` crates log at the requested
/// level while dependencies are capped at warnings, except at full trace
/// verbosity where everything is let through.
fn crate_targets(level: LevelFilter) -> Targets {
    let dependency_level = if level == LevelFilter::TRACE || level == LevelFilter::OFF {
        level
    } else {
        LevelFilter::WARN
    };

    Targets::new()
        .with_target("recharge", level)
        .with_target("recharge_cli", level)
        .with_default(dependency_level)
}

/// Installs the global subscriber: a compact stderr layer, plus a more
/// detailed file layer when `--log-file` is given.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let level = verbosity_filter(verbosity, quiet);

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let registry = tracing_subscriber::registry()
        .with(crate_targets(level))
        .with(console_layer);

    match log_file {
        Some(path) => {
            let file = File::create(path).map_err(CliError::Io)?;

            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_thread_ids(true);

            registry.with(file_layer).init();
        }
        None => registry.init(),
    }

    Ok(())
}
