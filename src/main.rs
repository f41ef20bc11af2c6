// src/main.rs

use crash_reporter::config::CONFIG;
use crash_reporter::display::WaylandDisplay;
use crash_reporter::CrashReporter;

use anyhow::Context;
use log::{info, warn};
use nix::sys::signal::{SigSet, Signal};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Main entry point for the crash screen.
///
/// Usage: `crash-reporter [RRGGBB]`
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting crash-reporter...");

    let reporter = Arc::new(CrashReporter::new(&CONFIG).context("Failed to initialize text renderer")?);
    if let Some(colour) = std::env::args().nth(1) {
        reporter.set_background_colour(&colour);
    }

    // Blocked here so that every thread spawned below inherits the mask and
    // only the watcher receives them.
    let mut signals = SigSet::empty();
    signals.add(Signal::SIGINT);
    signals.add(Signal::SIGTERM);
    signals.thread_block().context("Failed to block termination signals")?;

    {
        let reporter = Arc::clone(&reporter);
        thread::Builder::new()
            .name("signal-watcher".to_string())
            .spawn(move || match signals.wait() {
                Ok(signal) => {
                    info!("Received {}, stopping", signal);
                    // The client may still be connecting.
                    while !reporter.stop() {
                        thread::sleep(Duration::from_millis(50));
                    }
                }
                Err(e) => warn!("Waiting for termination signals failed: {}", e),
            })
            .context("Failed to spawn signal watcher")?;
    }

    reporter.run(&WaylandDisplay).context("Crash screen failed")?;

    info!("crash-reporter exited gracefully.");
    Ok(())
}
