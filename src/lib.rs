//! # EDF Deidentification for Rust
//!
//! A library and command line tool that deidentifies EDF (European Data
//! Format) recordings in place. It blanks the local patient and recording
//! identification fields and moves the recording start date by a few random
//! days, while every other header byte and the whole signal payload stay
//! exactly as they were.
//!
//! ## Quick Start
//!
//! ### Deidentifying a directory of recordings
//!
//! ```rust
//! use edfdeid::{batch, discovery::EdfPaths, DeidentifyConfig, Result};
//! # use edfdeid::doctest_utils::SampleEdf;
//!
//! fn main() -> Result<()> {
//!     # let dir = tempfile::tempdir()?;
//!     # let sample = SampleEdf::default();
//!     # sample.clone().patient_id("John Doe").write_to(dir.path().join("night1.edf"))?;
//!     # sample.start_date("00.00.00").write_to(dir.path().join("night2.edf"))?;
//!     let config = DeidentifyConfig::default();
//!
//!     // Collect candidate files below a directory
//!     let paths = EdfPaths::new(dir.path(), &config.extensions);
//!
//!     // Scrub and jitter every file; failures are reported, not fatal
//!     let summary = batch::run(paths, &config)?;
//!     for report in &summary.reports {
//!         println!(
//!             "{:?}: {:?} -> {:?}",
//!             report.path, report.original_date, report.new_date
//!         );
//!     }
//!     assert_eq!(summary.written, 2);
//!     Ok(())
//! }
//! ```
//!
//! ### Working on a single header
//!
//! The codec, scrubber and jitter engine can be used on their own. The
//! random source is always passed in, so runs are reproducible with a seed:
//!
//! ```rust
//! use edfdeid::{DateJitter, EdfHeader, IdentityScrubber};
//! use edfdeid::doctest_utils::SampleEdf;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let bytes = SampleEdf::default()
//!     .patient_id("John Doe")
//!     .start_date("15.06.20")
//!     .to_bytes();
//! let mut header = EdfHeader::decode(&bytes)?;
//!
//! IdentityScrubber::default().scrub(&mut header);
//! let mut rng = StdRng::seed_from_u64(1);
//! let outcome = DateJitter::default().jitter(&header.start_date, &mut rng)?;
//! header.start_date = outcome.new_date;
//!
//! let block = header.encode()?;
//! assert_eq!(block.len(), 256);
//! assert!(block[8..88].iter().all(|&b| b == b' '));
//! # Ok::<(), edfdeid::EdfError>(())
//! ```
//!
//! ## Header layout
//!
//! Only the fixed 256-byte base header is touched:
//!
//! | Field | Offset | Width |
//! |---|---|---|
//! | version | 0 | 8 |
//! | patientId | 8 | 80 |
//! | recordingId | 88 | 80 |
//! | startDate (`dd.mm.yy`) | 168 | 8 |
//! | startTime (`hh.mm.ss`) | 176 | 8 |
//! | headerByteCount | 184 | 8 |
//! | reserved | 192 | 44 |
//! | recordCount | 236 | 8 |
//! | recordDurationSeconds | 244 | 8 |
//! | signalCount | 252 | 4 |
//!
//! Two-digit years `85`-`99` are read as 19xx and `00`-`84` as 20xx; the
//! pivot is configurable through `centuryPivot`.
//!
//! ## Event exports
//!
//! The CSV event lists exported next to each recording start every line
//! with a full `m/d/Y h:m:s AM` timestamp. [`batch::strip_event_dates`]
//! cuts those down to the time of day so the real date does not survive
//! beside the jittered header.

pub mod error;
pub mod types;
pub mod utils;
pub mod codec;
pub mod jitter;
pub mod scrub;
pub mod reader;
pub mod writer;
pub mod pipeline;
pub mod config;
pub mod discovery;
pub mod batch;
pub mod events;

#[doc(hidden)]
pub mod doctest_utils; // For internal doctest support

// Re-export main types for convenience
pub use error::{EdfError, ErrorKind, Result};
pub use types::{EdfFile, EdfHeader, FileReport, FileStatus, HeaderField, PipelineState};
pub use jitter::{ClampAudit, DateJitter, JitterOutcome};
pub use scrub::IdentityScrubber;
pub use writer::RecordWriter;
pub use pipeline::Deidentifier;
pub use config::DeidentifyConfig;
pub use events::{EventDateStripper, EventReport};

// Important constants
pub const EDF_HEADER_SIZE: usize = 256;
pub const EDF_SIGNAL_HEADER_SIZE: usize = 256;
pub const EDF_MAX_SIGNALS: usize = 4096;

/// Library version
///
/// ```rust
/// let version = edfdeid::version();
/// assert!(version.contains('.'));
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
