//! Batch processing over discovered files.
//!
//! Files are independent. Every path is deduplicated (after
//! canonicalization) before dispatch so a file has exactly one owner, both
//! sequentially and on the rayon pool. A failing file never stops the batch.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::DeidentifyConfig;
use crate::error::{ErrorKind, Result};
use crate::events::{EventDateStripper, EventReport};
use crate::pipeline::Deidentifier;
use crate::types::{EdfFile, FileReport, FileStatus};

/// Per-file record that carries a final status
pub trait StatusReport {
    fn status(&self) -> FileStatus;
}

impl StatusReport for FileReport {
    fn status(&self) -> FileStatus {
        self.status
    }
}

impl StatusReport for EventReport {
    fn status(&self) -> FileStatus {
        self.status
    }
}

/// Outcome of a whole run
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary<R = FileReport> {
    pub reports: Vec<R>,
    pub written: usize,
    pub dry_run: usize,
    pub failed: usize,
}

impl<R: StatusReport> BatchSummary<R> {
    fn from_reports(reports: Vec<R>) -> Self {
        let count = |status: FileStatus| reports.iter().filter(|r| r.status() == status).count();
        BatchSummary {
            written: count(FileStatus::Written),
            dry_run: count(FileStatus::DryRun),
            failed: count(FileStatus::Failed),
            reports,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Deidentifies every path in `paths`.
///
/// With `randomSeed` set, file `i` (in deduplicated order) gets an RNG seeded
/// with `seed + i`, so results do not depend on thread scheduling.
///
/// # Errors
///
/// Only an invalid configuration is an error; per-file failures are in the
/// returned reports.
///
/// # Examples
///
/// ```rust
/// use edfdeid::{batch, DeidentifyConfig};
/// use edfdeid::doctest_utils::SampleEdf;
///
/// # let dir = tempfile::tempdir()?;
/// let good = dir.path().join("good.edf");
/// let bad = dir.path().join("bad.edf");
/// SampleEdf::default().write_to(&good)?;
/// std::fs::write(&bad, b"too short")?;
///
/// let config = DeidentifyConfig { random_seed: Some(1), ..Default::default() };
/// let summary = batch::run(vec![bad, good], &config)?;
///
/// assert_eq!(summary.failed, 1);
/// assert_eq!(summary.written, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn run<I>(paths: I, config: &DeidentifyConfig) -> Result<BatchSummary>
where
    I: IntoIterator<Item = PathBuf>,
{
    config.validate()?;
    let deidentifier = Deidentifier::new(config);
    let seed = config.random_seed;
    let paths = single_owner(paths);
    info!(
        files = paths.len(),
        parallel = config.parallel,
        dry_run = config.dry_run,
        "starting deidentification"
    );

    let process = |(index, path): (usize, &PathBuf)| {
        let mut rng = file_rng(seed, index);
        deidentifier.process(path, &mut rng)
    };

    let reports: Vec<FileReport> = if config.parallel {
        paths.par_iter().enumerate().map(process).collect()
    } else {
        paths.iter().enumerate().map(process).collect()
    };

    let summary = BatchSummary::from_reports(reports);
    info!(
        written = summary.written,
        dry_run = summary.dry_run,
        failed = summary.failed,
        "finished"
    );
    Ok(summary)
}

/// Removes the dates from every event export in `paths`.
///
/// Uses the same single-owner dispatch as [`run`]; `dryRun` and `parallel`
/// apply the same way.
///
/// # Examples
///
/// ```rust
/// use edfdeid::{batch, DeidentifyConfig};
///
/// # let dir = tempfile::tempdir()?;
/// let events = dir.path().join("night1.csv");
/// std::fs::write(&events, "5/22/2018 8:16:00 PM, 30.000, Wake\n")?;
///
/// let summary = batch::strip_event_dates(vec![events.clone()], &DeidentifyConfig::default())?;
/// assert_eq!(summary.written, 1);
/// assert_eq!(std::fs::read_to_string(&events)?, "20:16:00, 30.000, Wake\n");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn strip_event_dates<I>(
    paths: I,
    config: &DeidentifyConfig,
) -> Result<BatchSummary<EventReport>>
where
    I: IntoIterator<Item = PathBuf>,
{
    config.validate()?;
    let stripper = EventDateStripper::new(config.dry_run);
    let paths = single_owner(paths);
    info!(files = paths.len(), parallel = config.parallel, "removing dates from event files");

    let reports: Vec<EventReport> = if config.parallel {
        paths.par_iter().map(|path| stripper.process(path)).collect()
    } else {
        paths.iter().map(|path| stripper.process(path)).collect()
    };

    let summary = BatchSummary::from_reports(reports);
    if summary.has_failures() {
        let failed: Vec<_> = summary
            .reports
            .iter()
            .filter(|r| r.status == FileStatus::Failed)
            .map(|r| r.path.display().to_string())
            .collect();
        warn!(count = failed.len(), files = ?failed, "event files failed");
    }
    info!(
        written = summary.written,
        dry_run = summary.dry_run,
        failed = summary.failed,
        "finished"
    );
    Ok(summary)
}

/// Header check result for one file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReport {
    pub path: PathBuf,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Loads and decodes every header without modifying anything.
pub fn verify<I>(paths: I) -> Vec<VerifyReport>
where
    I: IntoIterator<Item = PathBuf>,
{
    let reports: Vec<VerifyReport> = single_owner(paths)
        .into_iter()
        .map(|path| match EdfFile::open(&path) {
            Ok(file) => VerifyReport {
                ok: true,
                start_date: Some(file.header.start_date.clone()),
                start_time: Some(file.header.start_time.clone()),
                recording_seconds: file.header.recording_seconds(),
                file_size_bytes: Some(file.byte_len),
                error_kind: None,
                error: None,
                path,
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "FAIL");
                VerifyReport {
                    ok: false,
                    start_date: None,
                    start_time: None,
                    recording_seconds: None,
                    file_size_bytes: None,
                    error_kind: Some(e.kind()),
                    error: Some(e.to_string()),
                    path,
                }
            }
        })
        .collect();

    let failed = reports.iter().filter(|r| !r.ok).count();
    info!(files = reports.len(), failed, "verification finished");
    reports
}

/// 去重：同一文件只分配给一个处理者
fn single_owner<I>(paths: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|path| {
            let key = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
            seen.insert(key)
        })
        .collect()
}

fn file_rng(seed: Option<u64>, index: usize) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index as u64)),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctest_utils::SampleEdf;
    use tempfile::TempDir;

    #[test]
    fn test_duplicates_are_processed_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.edf");
        SampleEdf::default().write_to(&path).unwrap();
        let alias = dir.path().join(".").join("a.edf");

        let config = DeidentifyConfig { random_seed: Some(3), ..Default::default() };
        let summary = run(vec![path.clone(), alias, path], &config).unwrap();
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.written, 1);
    }

    #[test]
    fn test_invalid_config_stops_before_any_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.edf");
        SampleEdf::default().patient_id("John Doe").write_to(&path).unwrap();
        let before = fs::read(&path).unwrap();

        let config = DeidentifyConfig { clamp_date: "99.99.99".to_string(), ..Default::default() };
        assert!(run(vec![path.clone()], &config).is_err());
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_file_rng_is_reproducible_per_index() {
        use rand::Rng;
        let a: u64 = file_rng(Some(10), 2).gen();
        let b: u64 = file_rng(Some(10), 2).gen();
        let c: u64 = file_rng(Some(10), 3).gen();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_verify_reports_without_writing() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.edf");
        let bad = dir.path().join("bad.edf");
        SampleEdf::default().patient_id("John Doe").write_to(&good).unwrap();
        fs::write(&bad, b"0       ").unwrap();
        let before = fs::read(&good).unwrap();

        let reports = verify(vec![good.clone(), bad]);
        assert!(reports[0].ok);
        assert_eq!(reports[0].recording_seconds, Some(3.0));
        assert_eq!(reports[0].file_size_bytes, Some(before.len() as u64));
        assert_eq!(reports[1].file_size_bytes, None);
        assert!(!reports[1].ok);
        assert_eq!(reports[1].error_kind, Some(ErrorKind::Format));
        assert_eq!(fs::read(&good).unwrap(), before);
    }
}
