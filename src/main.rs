use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use edfdeid::discovery::EdfPaths;
use edfdeid::{batch, DeidentifyConfig};

/// Deidentify EDF recordings in place: blank the patient and recording
/// identification and jitter the start date.
#[derive(Parser, Debug)]
#[command(name = "edf-deidentify", version, about)]
struct Cli {
    /// Files or directories (searched recursively) to process
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for reproducible date jitter
    #[arg(long)]
    seed: Option<u64>,

    /// Maximum date shift in days, in either direction
    #[arg(long)]
    jitter_days: Option<u32>,

    /// Text written into the identity fields (default: blank)
    #[arg(long)]
    replacement: Option<String>,

    /// Two-digit years at or above this value are 19xx
    #[arg(long)]
    century_pivot: Option<u8>,

    /// Run every step but do not write headers back
    #[arg(long)]
    dry_run: bool,

    /// Process files in parallel
    #[arg(long)]
    parallel: bool,

    /// Only check that headers decode, change nothing
    #[arg(long)]
    verify: bool,

    /// Remove the dates from event CSV exports instead of touching EDF files
    #[arg(long, conflicts_with = "verify")]
    events: bool,

    /// Print one JSON result record per file on stdout
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn config(&self) -> Result<DeidentifyConfig> {
        let mut config = match &self.config {
            Some(path) => DeidentifyConfig::load(path)?,
            None => DeidentifyConfig::default(),
        };

        if let Some(seed) = self.seed {
            config.random_seed = Some(seed);
        }
        if let Some(days) = self.jitter_days {
            config.date_jitter_range_days = days;
        }
        if let Some(replacement) = &self.replacement {
            config.identity_replacement = replacement.clone();
        }
        if let Some(pivot) = self.century_pivot {
            config.century_pivot = pivot;
        }
        config.dry_run |= self.dry_run;
        config.parallel |= self.parallel;

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config().context("loading configuration")?;

    if cli.events {
        let events = cli
            .paths
            .iter()
            .flat_map(|root| EdfPaths::new(root, &config.event_extensions));
        let summary = batch::strip_event_dates(events, &config)?;
        if cli.json {
            for report in &summary.reports {
                println!("{}", serde_json::to_string(report)?);
            }
        }
        return Ok(exit_code(summary.has_failures()));
    }

    let paths = cli
        .paths
        .iter()
        .flat_map(|root| EdfPaths::new(root, &config.extensions));

    if cli.verify {
        let reports = batch::verify(paths);
        if cli.json {
            for report in &reports {
                println!("{}", serde_json::to_string(report)?);
            }
        }
        return Ok(exit_code(reports.iter().any(|r| !r.ok)));
    }

    let summary = batch::run(paths, &config)?;
    if cli.json {
        for report in &summary.reports {
            println!("{}", serde_json::to_string(report)?);
        }
    }

    Ok(exit_code(summary.has_failures()))
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
