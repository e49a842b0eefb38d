//! DriveWatch — removable volume watcher.
//!
//! Thin binary entry point. All logic lives in the `drivewatch-core`
//! and `drivewatch-console` crates.

use anyhow::Context;
use drivewatch_console::{logging, ConsoleReporter, StdinOperator};
use drivewatch_core::counters::FileCounterStore;
use drivewatch_core::presence::DirListingProbe;
use drivewatch_core::report::Reporter;
use drivewatch_core::session::SessionController;
use drivewatch_core::{CancelToken, WatcherConfig};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let config = WatcherConfig::from_env().context("failed to load configuration")?;

    // Held until exit so buffered log lines are flushed.
    let _log_guard = logging::init(&config.log_file);
    tracing::info!("DriveWatch starting");

    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::stdout());
    reporter.info("Welcome to DriveWatch: removable volume monitoring and folder checks.");
    reporter.info(&format!(
        "Type '{}' and press Enter at any time to exit.",
        config.cancel_key
    ));

    let cancel = CancelToken::new();
    let mut operator = StdinOperator::spawn_stdin(&config.cancel_key, cancel.clone())
        .context("failed to start the input listener")?;
    let counters = Arc::new(FileCounterStore::new(&config.counters_dir));

    let mut session = SessionController::new(&config, DirListingProbe, counters, reporter, cancel);
    session.run(&mut operator);

    tracing::info!("DriveWatch exiting after {} passes", session.passes_run());
    Ok(())
}
