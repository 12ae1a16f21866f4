use std::ops::Range;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::ErrorKind;

/// Fields of the fixed 256-byte EDF base header, in file order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    Version,
    PatientId,
    RecordingId,
    StartDate,
    StartTime,
    HeaderByteCount,
    Reserved,
    RecordCount,
    RecordDuration,
    SignalCount,
}

impl HeaderField {
    pub const ALL: [HeaderField; 10] = [
        HeaderField::Version,
        HeaderField::PatientId,
        HeaderField::RecordingId,
        HeaderField::StartDate,
        HeaderField::StartTime,
        HeaderField::HeaderByteCount,
        HeaderField::Reserved,
        HeaderField::RecordCount,
        HeaderField::RecordDuration,
        HeaderField::SignalCount,
    ];

    /// 字段宽度（字节）
    pub const fn width(self) -> usize {
        match self {
            HeaderField::Version => 8,
            HeaderField::PatientId => 80,
            HeaderField::RecordingId => 80,
            HeaderField::StartDate => 8,
            HeaderField::StartTime => 8,
            HeaderField::HeaderByteCount => 8,
            HeaderField::Reserved => 44,
            HeaderField::RecordCount => 8,
            HeaderField::RecordDuration => 8,
            HeaderField::SignalCount => 4,
        }
    }

    /// 字段在头部中的起始偏移
    pub const fn offset(self) -> usize {
        match self {
            HeaderField::Version => 0,
            HeaderField::PatientId => 8,
            HeaderField::RecordingId => 88,
            HeaderField::StartDate => 168,
            HeaderField::StartTime => 176,
            HeaderField::HeaderByteCount => 184,
            HeaderField::Reserved => 192,
            HeaderField::RecordCount => 236,
            HeaderField::RecordDuration => 244,
            HeaderField::SignalCount => 252,
        }
    }

    pub const fn range(self) -> Range<usize> {
        self.offset()..self.offset() + self.width()
    }

    /// Name used in error messages and reports
    pub const fn name(self) -> &'static str {
        match self {
            HeaderField::Version => "version",
            HeaderField::PatientId => "patientId",
            HeaderField::RecordingId => "recordingId",
            HeaderField::StartDate => "startDate",
            HeaderField::StartTime => "startTime",
            HeaderField::HeaderByteCount => "headerByteCount",
            HeaderField::Reserved => "reserved",
            HeaderField::RecordCount => "recordCount",
            HeaderField::RecordDuration => "recordDurationSeconds",
            HeaderField::SignalCount => "signalCount",
        }
    }
}

/// A numeric header field: the parsed value plus the exact text it came from.
///
/// Keeping the raw text means a header that was only read is re-encoded
/// byte-for-byte, even when the number was written as `0256` or `1.000`.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericField<T> {
    raw: String,
    value: T,
}

impl<T: Copy> NumericField<T> {
    pub(crate) fn new(raw: String, value: T) -> Self {
        NumericField { raw, value }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> T {
        self.value
    }
}

/// Decoded view of the EDF base header.
///
/// Text fields hold the field content without its trailing space padding.
/// Bytes are mapped one-to-one onto chars (ISO-8859-1), so non-ASCII content
/// written by older acquisition software still survives a decode/encode cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct EdfHeader {
    pub version: String,
    pub patient_id: String,
    pub recording_id: String,
    pub start_date: String,
    pub start_time: String,
    pub header_byte_count: NumericField<usize>,
    pub reserved: String,
    pub record_count: NumericField<i64>,
    pub record_duration: NumericField<f64>,
    pub signal_count: NumericField<usize>,
}

impl EdfHeader {
    /// Text content of a field, as it will be written before padding
    pub fn field_text(&self, field: HeaderField) -> &str {
        match field {
            HeaderField::Version => &self.version,
            HeaderField::PatientId => &self.patient_id,
            HeaderField::RecordingId => &self.recording_id,
            HeaderField::StartDate => &self.start_date,
            HeaderField::StartTime => &self.start_time,
            HeaderField::HeaderByteCount => self.header_byte_count.raw(),
            HeaderField::Reserved => &self.reserved,
            HeaderField::RecordCount => self.record_count.raw(),
            HeaderField::RecordDuration => self.record_duration.raw(),
            HeaderField::SignalCount => self.signal_count.raw(),
        }
    }

    /// 记录总时长（秒），数据记录数未知（-1）时返回 None
    pub fn recording_seconds(&self) -> Option<f64> {
        let records = self.record_count.value();
        if records < 0 {
            return None;
        }
        Some(records as f64 * self.record_duration.value())
    }
}

/// A candidate file with its header loaded
#[derive(Debug)]
pub struct EdfFile {
    pub path: PathBuf,
    /// File length in bytes at load time
    pub byte_len: u64,
    /// The base header block exactly as read from disk
    pub raw_header: Vec<u8>,
    pub header: EdfHeader,
}

impl EdfFile {
    /// Offset of the first data record; nothing at or after it is ever touched
    pub fn signal_data_offset(&self) -> u64 {
        self.header.header_byte_count.value() as u64
    }
}

/// Per-file pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Loaded,
    Scrubbed,
    DateJittered,
    Encoded,
    Written,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileStatus {
    Written,
    /// Everything but the commit ran
    DryRun,
    Failed,
}

/// Result record emitted for every processed file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: PathBuf,
    pub original_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clamped_date: Option<String>,
    pub new_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset_days: Option<i64>,
    pub patient_id_before: Option<String>,
    pub recording_id_before: Option<String>,
    pub status: FileStatus,
    pub state: PipelineState,
    /// Last state reached before the pipeline moved to `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_after: Option<PipelineState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub(crate) fn new(path: PathBuf) -> Self {
        FileReport {
            path,
            original_date: None,
            clamped_date: None,
            new_date: None,
            offset_days: None,
            patient_id_before: None,
            recording_id_before: None,
            status: FileStatus::Failed,
            state: PipelineState::Loaded,
            failed_after: None,
            error_kind: None,
            error: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == FileStatus::Failed
    }
}
