use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{EdfError, Result};
use crate::jitter::{
    DateJitter, DEFAULT_CENTURY_PIVOT, DEFAULT_CLAMP_DATE, DEFAULT_JITTER_RANGE_DAYS,
    DEFAULT_SENTINEL_DATE,
};
use crate::scrub::IdentityScrubber;
use crate::types::HeaderField;

/// Largest accepted jitter range, about a century in days
pub const MAX_JITTER_RANGE_DAYS: u32 = 36500;

/// Options recognised by the deidentification run.
///
/// Every field has a default, so a config file only needs the keys it
/// changes:
///
/// ```rust
/// use edfdeid::DeidentifyConfig;
///
/// let config = DeidentifyConfig::from_json(r#"{ "dateJitterRangeDays": 3, "randomSeed": 42 }"#)?;
/// assert_eq!(config.date_jitter_range_days, 3);
/// assert_eq!(config.clamp_date, "01.01.85");
/// # Ok::<(), edfdeid::EdfError>(())
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct DeidentifyConfig {
    pub date_jitter_range_days: u32,
    pub identity_replacement: String,
    pub sentinel_date: String,
    pub clamp_date: String,
    pub random_seed: Option<u64>,
    pub century_pivot: u8,
    /// Run every step except writing the header back
    pub dry_run: bool,
    /// Process files on the rayon thread pool
    pub parallel: bool,
    /// File extensions picked up when walking directories
    pub extensions: Vec<String>,
    /// Extensions of the event exports whose timestamps get their dates removed
    pub event_extensions: Vec<String>,
}

impl Default for DeidentifyConfig {
    fn default() -> Self {
        DeidentifyConfig {
            date_jitter_range_days: DEFAULT_JITTER_RANGE_DAYS,
            identity_replacement: String::new(),
            sentinel_date: DEFAULT_SENTINEL_DATE.to_string(),
            clamp_date: DEFAULT_CLAMP_DATE.to_string(),
            random_seed: None,
            century_pivot: DEFAULT_CENTURY_PIVOT,
            dry_run: false,
            parallel: false,
            extensions: vec!["edf".to_string()],
            event_extensions: vec!["csv".to_string()],
        }
    }
}

impl DeidentifyConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| EdfError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| EdfError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    /// Checks the options before any file is touched.
    pub fn validate(&self) -> Result<()> {
        let replacement = &self.identity_replacement;
        if replacement.len() > HeaderField::PatientId.width() {
            return Err(EdfError::Config(format!(
                "identityReplacement is {} bytes, fields are {} wide",
                replacement.len(),
                HeaderField::PatientId.width()
            )));
        }
        if !replacement.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
            return Err(EdfError::Config(
                "identityReplacement must be printable ASCII".to_string(),
            ));
        }

        if self.date_jitter_range_days > MAX_JITTER_RANGE_DAYS {
            return Err(EdfError::Config(format!(
                "dateJitterRangeDays {} exceeds {}",
                self.date_jitter_range_days, MAX_JITTER_RANGE_DAYS
            )));
        }

        let sentinel = &self.sentinel_date;
        if sentinel.len() != HeaderField::StartDate.width() || !sentinel.is_ascii() {
            return Err(EdfError::Config(format!(
                "sentinelDate {sentinel:?} must be 8 ASCII characters"
            )));
        }
        if self.century_pivot > 99 {
            return Err(EdfError::Config(format!(
                "centuryPivot {} must be between 0 and 99",
                self.century_pivot
            )));
        }
        self.date_jitter().parse_date(&self.clamp_date).map_err(|_| {
            EdfError::Config(format!(
                "clampDate {:?} is not a valid dd.mm.yy date",
                self.clamp_date
            ))
        })?;

        Ok(())
    }

    pub fn date_jitter(&self) -> DateJitter {
        DateJitter::new(
            self.date_jitter_range_days,
            &self.sentinel_date,
            &self.clamp_date,
            self.century_pivot,
        )
    }

    pub fn scrubber(&self) -> IdentityScrubber {
        IdentityScrubber::new(&self.identity_replacement)
    }
}
