//! Date removal for the event exports that accompany recordings.
//!
//! Scoring software exports the events of a night as CSV, one event per
//! line, with a full timestamp in the first column:
//!
//! ```text
//! Start Time,Duration (seconds),Event
//! 5/22/2018 8:16:00 PM, 30.000, Wake
//! ```
//!
//! Keeping that date next to a jittered EDF would give the real recording
//! date away, so the first column is cut down to the time of day
//! (`20:16:00`). Lines whose first column is not such a timestamp (column
//! titles, blank lines, lines stripped by an earlier run) are kept as-is.

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{EdfError, ErrorKind, Result};
use crate::types::FileStatus;

/// Timestamp layout of the first column, e.g. `5/22/2018 8:16:00 PM`
pub const EVENT_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";
/// What the first column is rewritten to
pub const EVENT_TIME_FORMAT: &str = "%H:%M:%S";

/// Result record for one event file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReport {
    pub path: PathBuf,
    pub status: FileStatus,
    pub lines: usize,
    pub rewritten: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Rewrites one line, or returns `None` when its first column is not a
/// dated timestamp.
///
/// ```rust
/// use edfdeid::events::strip_line;
///
/// assert_eq!(strip_line("5/22/2018 8:16:13 PM, 0.000, Custom User Event 4").as_deref(),
///            Some("20:16:13, 0.000, Custom User Event 4"));
/// assert_eq!(strip_line("Start Time,Duration (seconds),Event"), None);
/// ```
pub fn strip_line(line: &str) -> Option<String> {
    let (timestamp, rest) = line.split_at(line.find(',').unwrap_or(line.len()));
    let parsed = NaiveDateTime::parse_from_str(timestamp, EVENT_TIMESTAMP_FORMAT).ok()?;
    Some(format!("{}{}", parsed.format(EVENT_TIME_FORMAT), rest))
}

/// Removes the dates from every line of `text`, keeping line endings.
///
/// Returns the new text and the number of lines rewritten.
pub fn strip_text(text: &str) -> (String, usize) {
    let mut out = String::with_capacity(text.len());
    let mut rewritten = 0;

    for line in text.split_inclusive('\n') {
        // 行尾的 \r\n / \n 原样保留
        let body = line.trim_end_matches(['\r', '\n']);
        let ending = &line[body.len()..];
        match strip_line(body) {
            Some(stripped) => {
                out.push_str(&stripped);
                out.push_str(ending);
                rewritten += 1;
            }
            None => out.push_str(line),
        }
    }

    (out, rewritten)
}

/// Strips the dates out of event files, one file at a time.
///
/// # Examples
///
/// ```rust
/// use edfdeid::events::EventDateStripper;
/// use edfdeid::FileStatus;
///
/// # let dir = tempfile::tempdir()?;
/// # let path = dir.path().join("night1.csv");
/// let export = "Start Time,Duration (seconds),Event\n5/22/2018 8:16:00 PM, 30.000, Wake\n";
/// std::fs::write(&path, export)?;
///
/// let report = EventDateStripper::new(false).process(&path);
/// assert_eq!(report.status, FileStatus::Written);
/// assert_eq!(report.rewritten, 1);
/// assert_eq!(
///     std::fs::read_to_string(&path)?,
///     "Start Time,Duration (seconds),Event\n20:16:00, 30.000, Wake\n"
/// );
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EventDateStripper {
    dry_run: bool,
}

impl EventDateStripper {
    pub fn new(dry_run: bool) -> Self {
        EventDateStripper { dry_run }
    }

    /// Processes one file; failures end up in the report, never in a panic.
    pub fn process(&self, path: &Path) -> EventReport {
        let mut report = EventReport {
            path: path.to_path_buf(),
            status: FileStatus::Failed,
            lines: 0,
            rewritten: 0,
            error_kind: None,
            error: None,
        };

        match self.run(path, &mut report) {
            Ok(status) => {
                report.status = status;
                info!(path = %path.display(), rewritten = report.rewritten, ?status, "done");
            }
            Err(e) => {
                report.error_kind = Some(e.kind());
                report.error = Some(e.to_string());
                warn!(path = %path.display(), error = %e, "FAIL");
            }
        }

        report
    }

    fn run(&self, path: &Path, report: &mut EventReport) -> Result<FileStatus> {
        let bytes = fs::read(path).map_err(|e| match e.kind() {
            IoErrorKind::NotFound => EdfError::FileNotFound(format!("{}: {}", path.display(), e)),
            _ => EdfError::Io(e),
        })?;
        let text = String::from_utf8(bytes)
            .map_err(|e| EdfError::NotText(format!("{}: {}", path.display(), e)))?;

        let (stripped, rewritten) = strip_text(&text);
        report.lines = text.lines().count();
        report.rewritten = rewritten;

        if self.dry_run {
            for line in stripped.lines() {
                debug!(path = %path.display(), line, "dry run");
            }
            return Ok(FileStatus::DryRun);
        }

        // 没有需要改写的行就不动文件
        if rewritten > 0 {
            fs::write(path, stripped)?;
        }
        Ok(FileStatus::Written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EXPORT: &str = "Start Time,Duration (seconds),Event\n\
                          5/22/2018 8:16:00 PM, 30.000, Wake\n\
                          5/22/2018 8:16:13 PM, 0.000, Custom User Event 4\n\
                          5/23/2018 12:05:30 AM, 30.000, N2\n";

    const STRIPPED: &str = "Start Time,Duration (seconds),Event\n\
                            20:16:00, 30.000, Wake\n\
                            20:16:13, 0.000, Custom User Event 4\n\
                            00:05:30, 30.000, N2\n";

    fn write_export(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_strip_line_keeps_time_of_day() {
        let cases = [
            ("5/22/2018 8:16:00 PM, 30.000, Wake", "20:16:00, 30.000, Wake"),
            ("12/01/2019 12:00:00 PM,1,Arousal", "12:00:00,1,Arousal"),
            ("12/01/2019 12:00:00 AM,1,Arousal", "00:00:00,1,Arousal"),
        ];
        for (line, expected) in cases {
            assert_eq!(strip_line(line).as_deref(), Some(expected));
        }
        // 没有逗号时整行都是时间戳
        assert_eq!(strip_line("5/22/2018 8:16:00 PM").as_deref(), Some("20:16:00"));
    }

    #[test]
    fn test_strip_line_leaves_other_lines() {
        let lines = [
            "Start Time,Duration (seconds),Event",
            "",
            "20:16:00, 30.000, Wake",
            "13/40/2018 8:16:00 PM,1,x",
        ];
        for line in lines {
            assert_eq!(strip_line(line), None, "{line:?} should be kept");
        }
    }

    #[test]
    fn test_strip_text_keeps_line_endings() {
        let text = "Start Time,Event\r\n5/22/2018 8:16:00 PM,Wake\r\nno newline at end";
        let (out, rewritten) = strip_text(text);
        assert_eq!(out, "Start Time,Event\r\n20:16:00,Wake\r\nno newline at end");
        assert_eq!(rewritten, 1);
    }

    #[test]
    fn test_process_rewrites_file() {
        let dir = TempDir::new().unwrap();
        let path = write_export(&dir, "night1.csv", EXPORT.as_bytes());

        let report = EventDateStripper::new(false).process(&path);
        assert_eq!(report.status, FileStatus::Written);
        assert_eq!(report.lines, 4);
        assert_eq!(report.rewritten, 3);
        assert_eq!(fs::read_to_string(&path).unwrap(), STRIPPED);

        // 第二次运行没有日期可删
        let again = EventDateStripper::new(false).process(&path);
        assert_eq!(again.status, FileStatus::Written);
        assert_eq!(again.rewritten, 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), STRIPPED);
    }

    #[test]
    fn test_dry_run_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        let path = write_export(&dir, "night1.csv", EXPORT.as_bytes());

        let report = EventDateStripper::new(true).process(&path);
        assert_eq!(report.status, FileStatus::DryRun);
        assert_eq!(report.rewritten, 3);
        assert_eq!(fs::read_to_string(&path).unwrap(), EXPORT);
    }

    #[test]
    fn test_binary_file_fails_untouched() {
        let dir = TempDir::new().unwrap();
        let contents = b"5/22/2018 8:16:00 PM,\xff\xfe Wake\n";
        let path = write_export(&dir, "binary.csv", contents);

        let report = EventDateStripper::new(false).process(&path);
        assert_eq!(report.status, FileStatus::Failed);
        assert_eq!(report.error_kind, Some(ErrorKind::Format));
        assert_eq!(fs::read(&path).unwrap(), contents);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let report = EventDateStripper::new(false).process(&dir.path().join("missing.csv"));
        assert_eq!(report.status, FileStatus::Failed);
        assert_eq!(report.error_kind, Some(ErrorKind::Io));
    }
}
