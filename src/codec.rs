//! Fixed-width codec for the 256-byte EDF base header.
//!
//! Decoding validates only what this crate relies on: the version marker and
//! the numeric fields. Dates are left as text because the reserved
//! `00.00.00` value must survive decoding; the jitter step validates them.

use crate::error::{EdfError, Result};
use crate::types::{EdfHeader, HeaderField, NumericField};
use crate::utils::{
    atof_nonlocalized, atoi_nonlocalized, decode_field, encode_field, is_integer_number, is_number,
    is_unsigned_number,
};
use crate::{EDF_HEADER_SIZE, EDF_MAX_SIGNALS, EDF_SIGNAL_HEADER_SIZE};

impl EdfHeader {
    /// Decodes the base header from the start of `bytes`.
    ///
    /// Only the first [`EDF_HEADER_SIZE`] bytes are looked at; anything after
    /// them (signal sub-headers, data records) is ignored.
    ///
    /// # Errors
    ///
    /// * `EdfError::HeaderTooShort` - fewer than 256 bytes
    /// * `EdfError::InvalidField` - version is not `0`, a numeric field holds
    ///   anything but digits and spaces, or `headerByteCount` does not match
    ///   `256 * (signalCount + 1)`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use edfdeid::EdfHeader;
    /// use edfdeid::doctest_utils::SampleEdf;
    ///
    /// let bytes = SampleEdf::default().patient_id("John Doe").to_bytes();
    /// let header = EdfHeader::decode(&bytes)?;
    ///
    /// assert_eq!(header.patient_id, "John Doe");
    /// assert_eq!(header.encode()?, bytes[..256].to_vec());
    /// # Ok::<(), edfdeid::EdfError>(())
    /// ```
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < EDF_HEADER_SIZE {
            return Err(EdfError::HeaderTooShort {
                actual: bytes.len(),
                expected: EDF_HEADER_SIZE,
            });
        }
        let text = |field: HeaderField| decode_field(&bytes[field.range()]);

        // 验证版本标识
        let version = text(HeaderField::Version);
        if version != "0" {
            return Err(EdfError::invalid_field(
                HeaderField::Version.name(),
                &version,
                "only EDF version 0 headers are supported",
            ));
        }

        let signal_count =
            parse_unsigned(HeaderField::SignalCount, text(HeaderField::SignalCount))?;
        if signal_count.value() == 0 || signal_count.value() > EDF_MAX_SIGNALS {
            return Err(EdfError::invalid_field(
                HeaderField::SignalCount.name(),
                signal_count.raw(),
                format!("signal count must be between 1 and {EDF_MAX_SIGNALS}"),
            ));
        }

        // 头部大小必须等于 (ns + 1) * 256
        let header_byte_count =
            parse_unsigned(HeaderField::HeaderByteCount, text(HeaderField::HeaderByteCount))?;
        let expected = EDF_HEADER_SIZE + signal_count.value() * EDF_SIGNAL_HEADER_SIZE;
        if header_byte_count.value() != expected {
            return Err(EdfError::invalid_field(
                HeaderField::HeaderByteCount.name(),
                header_byte_count.raw(),
                format!("expected {expected} for {} signals", signal_count.value()),
            ));
        }

        let record_count = parse_record_count(text(HeaderField::RecordCount))?;
        let record_duration = parse_duration(text(HeaderField::RecordDuration))?;

        Ok(EdfHeader {
            version,
            patient_id: text(HeaderField::PatientId),
            recording_id: text(HeaderField::RecordingId),
            start_date: text(HeaderField::StartDate),
            start_time: text(HeaderField::StartTime),
            header_byte_count,
            reserved: text(HeaderField::Reserved),
            record_count,
            record_duration,
            signal_count,
        })
    }

    /// Encodes the base header into exactly [`EDF_HEADER_SIZE`] bytes.
    ///
    /// Every field is written left-justified and padded with spaces.
    /// A field whose content does not fit is reported as
    /// `EdfError::FieldOverflow` instead of being cut short.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut block = vec![b' '; EDF_HEADER_SIZE];
        for field in HeaderField::ALL {
            encode_field(&mut block[field.range()], field, self.field_text(field))?;
        }
        Ok(block)
    }
}

fn parse_unsigned(field: HeaderField, raw: String) -> Result<NumericField<usize>> {
    if !is_unsigned_number(&raw) {
        return Err(EdfError::invalid_field(field.name(), &raw, "expected ASCII digits"));
    }
    let value = atoi_nonlocalized(&raw)
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| EdfError::invalid_field(field.name(), &raw, "number out of range"))?;
    Ok(NumericField::new(raw, value))
}

/// 数据记录数，-1 表示记录仍在进行中（未知）
fn parse_record_count(raw: String) -> Result<NumericField<i64>> {
    let field = HeaderField::RecordCount;
    if !is_unsigned_number(&raw) && !(is_integer_number(&raw) && raw.trim() == "-1") {
        return Err(EdfError::invalid_field(field.name(), &raw, "expected ASCII digits or -1"));
    }
    let value = atoi_nonlocalized(&raw)
        .ok_or_else(|| EdfError::invalid_field(field.name(), &raw, "number out of range"))?;
    Ok(NumericField::new(raw, value))
}

fn parse_duration(raw: String) -> Result<NumericField<f64>> {
    let field = HeaderField::RecordDuration;
    let value = Some(raw.as_str())
        .filter(|s| is_number(s))
        .and_then(atof_nonlocalized)
        .filter(|v| *v >= 0.0)
        .ok_or_else(|| {
            EdfError::invalid_field(field.name(), &raw, "expected a non-negative decimal number")
        })?;
    Ok(NumericField::new(raw, value))
}
