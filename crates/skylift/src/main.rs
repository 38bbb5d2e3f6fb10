//! Skylift - submit browser extensions to multiple stores

mod cli;
mod exit_codes;

use std::path::PathBuf;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use cli::Cli;

const LOG_FILE: &str = "skylift.log";

fn main() {
    let cli = Cli::parse();
    let guard = init_tracing(cli.verbose);

    let code = match cli.execute() {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            cli::output::error(&format!("{:#}", e));
            exit_codes::ERROR
        }
    };

    drop(guard);
    std::process::exit(code);
}

/// Console logging filtered by `RUST_LOG` (or `--verbose`), plus a debug-level
/// JSON file under `~/.skylift/logs` when that directory is usable
///
/// The returned guard flushes the file writer when dropped.
fn init_tracing(verbose: bool) -> Option<WorkerGuard> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let (file, guard) = match log_directory() {
        Some(dir) => {
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE));
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(console).with(file).init();
    guard
}

fn log_directory() -> Option<PathBuf> {
    let dir = dirs::home_dir()?.join(".skylift").join("logs");
    std::fs::create_dir_all(&dir).ok()?;
    Some(dir)
}
