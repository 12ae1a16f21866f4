use tracing::warn;

use crate::types::EdfHeader;

/// Identity fields as they were before scrubbing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrubbedIdentity {
    pub patient_id: String,
    pub recording_id: String,
}

/// Replaces the patient and recording identification fields.
///
/// The fields are only replaced in memory; width is restored by
/// [`EdfHeader::encode`], which pads the replacement with spaces.
///
/// ```rust
/// use edfdeid::{EdfHeader, IdentityScrubber};
/// use edfdeid::doctest_utils::SampleEdf;
///
/// let bytes = SampleEdf::default().patient_id("John Doe").to_bytes();
/// let mut header = EdfHeader::decode(&bytes)?;
///
/// let before = IdentityScrubber::default().scrub(&mut header);
/// assert_eq!(before.patient_id, "John Doe");
/// assert_eq!(&header.encode()?[8..88], [b' '; 80].as_slice());
/// # Ok::<(), edfdeid::EdfError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct IdentityScrubber {
    replacement: String,
}

impl IdentityScrubber {
    pub fn new(replacement: &str) -> Self {
        IdentityScrubber {
            replacement: replacement.to_string(),
        }
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn scrub(&self, header: &mut EdfHeader) -> ScrubbedIdentity {
        if !header.patient_id.trim().is_empty() {
            warn!("local patient identification is not empty, blanking it");
        }

        let patient_id = std::mem::replace(&mut header.patient_id, self.replacement.clone());
        let recording_id = std::mem::replace(&mut header.recording_id, self.replacement.clone());

        ScrubbedIdentity { patient_id, recording_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doctest_utils::SampleEdf;
    use crate::types::HeaderField;

    fn sample_header() -> EdfHeader {
        let bytes = SampleEdf::default()
            .patient_id("John Doe")
            .recording_id("Startdate 15-JUN-2020 Lab7 Tech1 Device")
            .to_bytes();
        EdfHeader::decode(&bytes).unwrap()
    }

    #[test]
    fn test_default_scrub_blanks_both_fields() {
        let mut header = sample_header();
        let before = IdentityScrubber::default().scrub(&mut header);

        assert_eq!(before.patient_id, "John Doe");
        assert_eq!(before.recording_id, "Startdate 15-JUN-2020 Lab7 Tech1 Device");

        let encoded = header.encode().unwrap();
        assert!(encoded[HeaderField::PatientId.range()].iter().all(|&b| b == b' '));
        assert!(encoded[HeaderField::RecordingId.range()].iter().all(|&b| b == b' '));
    }

    #[test]
    fn test_custom_replacement_leaves_no_residue() {
        let mut header = sample_header();
        IdentityScrubber::new("X").scrub(&mut header);

        let encoded = header.encode().unwrap();
        let patient = &encoded[HeaderField::PatientId.range()];
        assert_eq!(patient[0], b'X');
        assert!(patient[1..].iter().all(|&b| b == b' '));
    }

    #[test]
    fn test_scrub_touches_nothing_else() {
        let original = sample_header();
        let mut header = original.clone();
        IdentityScrubber::default().scrub(&mut header);

        header.patient_id = original.patient_id.clone();
        header.recording_id = original.recording_id.clone();
        assert_eq!(header, original);
    }

    #[test]
    fn test_scrub_is_stable_on_blank_fields() {
        let mut header = sample_header();
        let scrubber = IdentityScrubber::default();
        scrubber.scrub(&mut header);
        let second = scrubber.scrub(&mut header);
        assert_eq!(second.patient_id, "");
        assert_eq!(header.patient_id, "");
    }
}
