// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Run a place cell population from a configuration file.
//!
//! Loads `placecell_configuration.toml` (or `--config <path>`), applies
//! `--set section.key=value` overrides, runs the population for
//! `simulation.duration_ms` and prints a summary. `--output <path>` also writes
//! the summary as JSON.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{bail, Context, Result};
use placecell::setup::logging_options;
use placecell::{build_population, RunSummary};
use placecell_config::load_config;
use placecell_observability::{debug_flags_help, init_logging, parse_debug_flags};
use tracing::info;

struct Args {
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    overrides: HashMap<String, String>,
}

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: run_place_cells [--config <path>] [--output <path>] [--set <section.key=value>]...\n\n\
         Defaults:\n\
         - config: PLACECELL_CONFIG_PATH, else placecell_configuration.toml in the\n\
           working directory or up to five parents\n\n{}",
        debug_flags_help()
    );
    process::exit(2);
}

fn parse_args() -> Result<Args> {
    let mut parsed = Args {
        config: None,
        output: None,
        overrides: HashMap::new(),
    };

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.config = Some(PathBuf::from(v));
            }
            "--output" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.output = Some(PathBuf::from(v));
            }
            "--set" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                let Some((key, value)) = v.split_once('=') else {
                    bail!("Override '{v}' is not of the form section.key=value");
                };
                parsed
                    .overrides
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
            "-h" | "--help" => usage_and_exit(),
            // Handled by the logging setup
            other if other.starts_with("--debug-") => {}
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit();
            }
        }
    }
    Ok(parsed)
}

fn main() -> Result<()> {
    let args = parse_args()?;

    let config = load_config(args.config.as_deref(), Some(&args.overrides))
        .context("Failed to load configuration")?;
    let _logging = init_logging(&parse_debug_flags(), &logging_options(&config.logging))
        .context("Failed to initialize logging")?;

    let (mut population, ids) =
        build_population(&config).context("Failed to build place cell population")?;
    let duration_ms = config.simulation.duration_ms;
    let recorder = population
        .run(duration_ms)
        .context("Place cell population run failed")?;

    let summary = RunSummary::new(&recorder, &ids, duration_ms);
    info!(
        generators = summary.generators,
        spikes = summary.spikes,
        mean_rate_hz = summary.mean_rate_hz,
        most_active = ?summary.most_active,
        "Run summary"
    );
    println!(
        "{} place cells, {} ms: {} spikes, mean rate {:.3} Hz",
        summary.generators, summary.duration_ms, summary.spikes, summary.mean_rate_hz
    );

    if let Some(path) = args.output {
        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        info!(path = %path.display(), "Wrote run summary");
    }
    Ok(())
}
