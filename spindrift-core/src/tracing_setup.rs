//! Tracing setup for Spindrift
//!
//! Console output at a caller-chosen level, plus an optional full-debug file
//! layer so a failed upload run can be reconstructed afterwards. The embedding
//! harness decides whether a log directory exists at all; without one, no
//! files are touched.

use std::fs::{File, create_dir_all};
use std::path::Path;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Initializes the global subscriber: console at `console_level` and, when
/// `logs_dir` is given, full TRACE output to `<logs_dir>/spindrift-last-run.log`
/// (overwriting the previous run).
///
/// # Errors
///
/// - `Box<dyn std::error::Error>` - If the log directory or file cannot be
///   created, or a global subscriber is already installed
pub fn init_tracing(
    console_level: Level,
    logs_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level.to_string()));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_filter(console_filter);

    let file_layer = match logs_dir {
        Some(logs_path) => {
            create_dir_all(logs_path)?;
            let log_file = File::create(logs_path.join("spindrift-last-run.log"))?;
            let layer = fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false) // No color codes in files
                .with_writer(log_file)
                .with_filter(EnvFilter::new("trace"));
            Some(layer)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::info!(console = %console_level, file = logs_dir.is_some(), "tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let logs_dir = dir.path().join("logs");

        init_tracing(Level::INFO, Some(logs_dir.as_path())).unwrap();
        tracing::info!("hello from the test");

        assert!(logs_dir.join("spindrift-last-run.log").exists());

        // The global subscriber is already installed now; a second init must
        // report that instead of silently replacing it.
        assert!(init_tracing(Level::INFO, None).is_err());
    }
}
