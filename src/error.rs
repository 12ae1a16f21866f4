use std::io;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EdfError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Header too short: {actual} bytes, at least {expected} required")]
    HeaderTooShort { actual: usize, expected: usize },

    #[error("Invalid {field} field {value:?}: {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Field {field} overflows its width: {len} bytes > {width}")]
    FieldOverflow {
        field: &'static str,
        len: usize,
        width: usize,
    },

    #[error("Invalid start date {value:?}: expected dd.mm.yy")]
    InvalidDate { value: String },

    #[error("Header on disk changed since it was loaded: {0}")]
    HeaderChanged(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Not a UTF-8 text file: {0}")]
    NotText(String),
}

impl EdfError {
    /// Shorthand for [`EdfError::InvalidField`]
    pub fn invalid_field(field: &'static str, value: &str, reason: impl Into<String>) -> Self {
        EdfError::InvalidField {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Classifies the error for the per-file result record.
    ///
    /// Configuration errors never reach a file, they are reported as
    /// format errors only if someone feeds them through a report anyway.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EdfError::HeaderTooShort { .. }
            | EdfError::InvalidField { .. }
            | EdfError::Config(_)
            | EdfError::NotText(_) => ErrorKind::Format,
            EdfError::FieldOverflow { .. } => ErrorKind::FieldOverflow,
            EdfError::InvalidDate { .. } => ErrorKind::DateFormat,
            EdfError::FileNotFound(_) | EdfError::Io(_) | EdfError::HeaderChanged(_) => {
                ErrorKind::Io
            }
        }
    }
}

/// Error taxonomy as it appears in result records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "FormatError")]
    Format,
    #[serde(rename = "FieldOverflowError")]
    FieldOverflow,
    #[serde(rename = "DateFormatError")]
    DateFormat,
    #[serde(rename = "IOError")]
    Io,
}

pub type Result<T> = std::result::Result<T, EdfError>;
