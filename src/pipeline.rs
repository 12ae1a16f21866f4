//! Per-file deidentification: load, scrub, jitter, encode, commit.

use std::path::Path;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::DeidentifyConfig;
use crate::error::Result;
use crate::jitter::DateJitter;
use crate::scrub::IdentityScrubber;
use crate::types::{EdfFile, FileReport, FileStatus, PipelineState};
use crate::writer::RecordWriter;

/// Runs the deidentification state machine on one file at a time.
///
/// States advance `Loaded → Scrubbed → DateJittered → Encoded → Written`.
/// Any error moves the file to `Failed`; nothing is written unless every
/// earlier state was reached.
///
/// # Examples
///
/// ```rust
/// use edfdeid::{Deidentifier, DeidentifyConfig, FileStatus};
/// use edfdeid::doctest_utils::SampleEdf;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// # let dir = tempfile::tempdir()?;
/// # let path = dir.path().join("recording.edf");
/// SampleEdf::default().patient_id("John Doe").start_date("15.06.20").write_to(&path)?;
///
/// let deidentifier = Deidentifier::new(&DeidentifyConfig::default());
/// let report = deidentifier.process(&path, &mut StdRng::seed_from_u64(1));
///
/// assert_eq!(report.status, FileStatus::Written);
/// assert_eq!(report.patient_id_before.as_deref(), Some("John Doe"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Deidentifier {
    scrubber: IdentityScrubber,
    jitter: DateJitter,
    dry_run: bool,
}

impl Deidentifier {
    pub fn new(config: &DeidentifyConfig) -> Self {
        Deidentifier {
            scrubber: config.scrubber(),
            jitter: config.date_jitter(),
            dry_run: config.dry_run,
        }
    }

    /// Processes one file and returns its result record.
    ///
    /// Never panics on bad input and never returns an error: failures are
    /// reported in the record so the caller can carry on with the batch.
    pub fn process<R: Rng + ?Sized>(&self, path: &Path, rng: &mut R) -> FileReport {
        let mut report = FileReport::new(path.to_path_buf());

        match self.run(path, rng, &mut report) {
            Ok(status) => {
                report.status = status;
                info!(
                    path = %path.display(),
                    original = report.original_date.as_deref().unwrap_or_default(),
                    new = report.new_date.as_deref().unwrap_or_default(),
                    ?status,
                    "OK"
                );
            }
            Err(e) => {
                report.status = FileStatus::Failed;
                report.failed_after = Some(report.state);
                report.state = PipelineState::Failed;
                report.error_kind = Some(e.kind());
                report.error = Some(e.to_string());
                warn!(path = %path.display(), kind = ?e.kind(), error = %e, "FAILED");
            }
        }

        report
    }

    fn run<R: Rng + ?Sized>(
        &self,
        path: &Path,
        rng: &mut R,
        report: &mut FileReport,
    ) -> Result<FileStatus> {
        let mut file = EdfFile::open(path)?;
        report.original_date = Some(file.header.start_date.clone());
        advance(report, PipelineState::Loaded);

        let before = self.scrubber.scrub(&mut file.header);
        report.patient_id_before = Some(before.patient_id);
        report.recording_id_before = Some(before.recording_id);
        advance(report, PipelineState::Scrubbed);

        let outcome = self.jitter.jitter(&file.header.start_date, rng)?;
        if let Some(audit) = &outcome.clamp {
            info!(
                path = %path.display(),
                original = %audit.original,
                clamped = %audit.clamped,
                "start date clamped"
            );
        }
        file.header.start_date = outcome.new_date.clone();
        report.clamped_date = outcome.clamp.map(|audit| audit.clamped);
        report.new_date = Some(outcome.new_date);
        report.offset_days = Some(outcome.offset_days);
        advance(report, PipelineState::DateJittered);

        let block = file.header.encode()?;
        advance(report, PipelineState::Encoded);

        if self.dry_run {
            return Ok(FileStatus::DryRun);
        }

        RecordWriter::commit(&file, &block)?;
        advance(report, PipelineState::Written);
        Ok(FileStatus::Written)
    }
}

fn advance(report: &mut FileReport, state: PipelineState) {
    debug!(path = %report.path.display(), from = ?report.state, to = ?state, "pipeline state");
    report.state = state;
}
