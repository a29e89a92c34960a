// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Installs a console layer filtered by the per-crate debug flags. With the
//! `file-logging` feature, a JSON log file is also written to a timestamped
//! run folder:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── placecell.log
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{LogFormat, LoggingOptions};

const RUN_PREFIX: &str = "run_";
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps file writers alive; logs are flushed when dropped
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    run_folder: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder of this process, if file logging is active
    pub fn run_folder(&self) -> Option<&Path> {
        self.run_folder.as_deref()
    }
}

/// Filter from the base level plus per-crate debug overrides
pub fn build_filter(debug_flags: &CrateDebugFlags, level: &str) -> Result<EnvFilter> {
    let directives = debug_flags.to_filter_string(level);
    EnvFilter::try_new(&directives)
        .with_context(|| format!("Invalid log filter '{}'", directives))
}

/// Install the global subscriber.
///
/// Fails if the filter is invalid or a subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, options: &LoggingOptions) -> Result<LoggingGuard> {
    let console: BoxedLayer = match options.format {
        LogFormat::Text => fmt::layer()
            .with_target(false)
            .with_filter(build_filter(debug_flags, &options.level)?)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_filter(build_filter(debug_flags, &options.level)?)
            .boxed(),
    };
    let mut layers = vec![console];

    #[cfg(feature = "file-logging")]
    let (run_folder, file_guards) = {
        let (folder, guard) = file_layer(debug_flags, options, &mut layers)?;
        (Some(folder), vec![guard])
    };
    #[cfg(not(feature = "file-logging"))]
    let run_folder = None;

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: file_guards,
        run_folder,
    })
}

#[cfg(feature = "file-logging")]
fn file_layer(
    debug_flags: &CrateDebugFlags,
    options: &LoggingOptions,
    layers: &mut Vec<BoxedLayer>,
) -> Result<(PathBuf, tracing_appender::non_blocking::WorkerGuard)> {
    let run_folder = options.log_dir.join(run_folder_name(Utc::now()));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;
    cleanup_old_logs(&options.log_dir, options.retention_days, options.retention_runs)?;

    let appender = tracing_appender::rolling::never(&run_folder, "placecell.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    layers.push(
        fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(build_filter(debug_flags, &options.level)?)
            .boxed(),
    );
    Ok((run_folder, guard))
}

/// Folder name for a run started at `started`
pub fn run_folder_name(started: DateTime<Utc>) -> String {
    format!("{}{}", RUN_PREFIX, started.format(RUN_TIMESTAMP_FORMAT))
}

fn parse_run_folder(name: &str) -> Option<DateTime<Utc>> {
    let timestamp = name.strip_prefix(RUN_PREFIX)?;
    let naive = NaiveDateTime::parse_from_str(timestamp, RUN_TIMESTAMP_FORMAT).ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Remove run folders older than `retention_days`, then the oldest ones beyond
/// `retention_runs`. Other entries in `base_log_dir` are left alone.
///
/// Returns the number of folders removed.
pub fn cleanup_old_logs(
    base_log_dir: &Path,
    retention_days: u64,
    retention_runs: usize,
) -> Result<usize> {
    if !base_log_dir.exists() {
        return Ok(0);
    }
    let cutoff = Utc::now() - chrono::Duration::days(retention_days as i64);

    let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(started) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(parse_run_folder)
        {
            runs.push((path, started));
        }
    }
    // Oldest first
    runs.sort_by_key(|(_, started)| *started);

    let expired = runs.iter().take_while(|(_, started)| *started < cutoff).count();
    let over_limit = (runs.len() - expired).saturating_sub(retention_runs);

    let mut removed = 0;
    for (path, _) in runs.iter().take(expired + over_limit) {
        match std::fs::remove_dir_all(path) {
            Ok(()) => removed += 1,
            Err(e) => eprintln!(
                "Warning: Failed to remove old log directory {}: {}",
                path.display(),
                e
            ),
        }
    }
    Ok(removed)
}
