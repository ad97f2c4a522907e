//! Tracing setup for Sonora
//!
//! Two outputs: the console at the operator's chosen level, and a log of the
//! current run written to disk with every event Sonora and its HTTP stack emit.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// File name of the per-run log inside the logs directory.
pub const RUN_LOG_FILE: &str = "sonora-last-run.log";

/// Filter applied to the run log, independent of the console level.
const RUN_LOG_FILTER: &str = "info,sonora_core=trace,sonora_web=trace,tower_http=debug";

/// Installs the global subscriber.
///
/// The console honours `RUST_LOG` when set, `console_level` otherwise. The run
/// log in `logs_dir` (default `./logs`) is truncated on every start.
///
/// # Errors
///
/// - `Box<dyn std::error::Error>` - Logs directory or run log could not be
///   created, or a global subscriber is already installed
pub fn init_tracing(
    console_level: Level,
    logs_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (run_log, run_log_path) = open_run_log(logs_dir.unwrap_or_else(|| Path::new("logs")))?;

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level.as_str().to_lowercase()));

    let console_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(run_log)
        .with_filter(EnvFilter::new(RUN_LOG_FILTER));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    tracing::debug!(
        "Logging to console at {} and to {}",
        console_level,
        run_log_path.display()
    );

    Ok(())
}

fn open_run_log(logs_dir: &Path) -> std::io::Result<(File, PathBuf)> {
    create_dir_all(logs_dir)?;
    let path = logs_dir.join(RUN_LOG_FILE);
    let file = File::create(&path)?;
    Ok((file, path))
}

/// Console verbosity selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CliLogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for Level {
    /// # Examples
    /// ```
    /// use sonora_core::tracing_setup::CliLogLevel;
    ///
    /// assert_eq!(tracing::Level::from(CliLogLevel::Debug), tracing::Level::DEBUG);
    /// ```
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}
