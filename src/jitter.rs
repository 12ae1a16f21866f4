//! Start date validation and jitter.
//!
//! Dates are handled as [`chrono::NaiveDate`]; the `dd.mm.yy` text is only
//! parsed on the way in and formatted on the way out.

use chrono::{Datelike, Days, NaiveDate};
use rand::Rng;
use tracing::{debug, warn};

use crate::error::{EdfError, Result};

/// Reserved start date meaning "no date recorded"
pub const DEFAULT_SENTINEL_DATE: &str = "00.00.00";
/// Replacement for the sentinel before jitter is applied
pub const DEFAULT_CLAMP_DATE: &str = "01.01.85";
pub const DEFAULT_JITTER_RANGE_DAYS: u32 = 5;
/// Two-digit years at or above the pivot belong to the 1900s
pub const DEFAULT_CENTURY_PIVOT: u8 = 85;

/// Audit record emitted when the sentinel date was replaced by the clamp date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClampAudit {
    pub original: String,
    pub clamped: String,
}

/// Outcome of jittering one start date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JitterOutcome {
    pub original: String,
    pub clamp: Option<ClampAudit>,
    pub offset_days: i64,
    pub new_date: String,
    /// The shifted date left the 100-year window of the century pivot, so
    /// `new_date` reads back a century away from the date it encodes
    pub century_wrapped: bool,
}

/// Moves a `dd.mm.yy` start date by a random number of days.
///
/// # Examples
///
/// ```rust
/// use edfdeid::DateJitter;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let jitter = DateJitter::default();
/// let mut rng = StdRng::seed_from_u64(7);
///
/// let outcome = jitter.jitter("15.06.20", &mut rng)?;
/// assert!(outcome.offset_days.abs() <= 5);
/// assert_eq!(outcome.new_date.len(), 8);
///
/// // The sentinel is clamped first, then jittered
/// let outcome = jitter.jitter("00.00.00", &mut rng)?;
/// assert_eq!(outcome.clamp.unwrap().clamped, "01.01.85");
/// # Ok::<(), edfdeid::EdfError>(())
/// ```
#[derive(Debug, Clone)]
pub struct DateJitter {
    range_days: u32,
    sentinel: String,
    clamp: String,
    century_pivot: u8,
}

impl Default for DateJitter {
    fn default() -> Self {
        DateJitter {
            range_days: DEFAULT_JITTER_RANGE_DAYS,
            sentinel: DEFAULT_SENTINEL_DATE.to_string(),
            clamp: DEFAULT_CLAMP_DATE.to_string(),
            century_pivot: DEFAULT_CENTURY_PIVOT,
        }
    }
}

impl DateJitter {
    pub fn new(range_days: u32, sentinel: &str, clamp: &str, century_pivot: u8) -> Self {
        DateJitter {
            range_days,
            sentinel: sentinel.to_string(),
            clamp: clamp.to_string(),
            century_pivot,
        }
    }

    pub fn range_days(&self) -> u32 {
        self.range_days
    }

    /// Parses `dd.mm.yy` into a calendar date.
    ///
    /// Day must be 01-31, month 01-12, year 00-99, and the combination must
    /// exist in the calendar (`29.02.21` does not).
    pub fn parse_date(&self, value: &str) -> Result<NaiveDate> {
        let invalid = || EdfError::InvalidDate { value: value.to_string() };

        let bytes = value.as_bytes();
        if bytes.len() != 8 || bytes[2] != b'.' || bytes[5] != b'.' {
            return Err(invalid());
        }
        let two_digits = |at: usize| -> Option<u32> {
            let (hi, lo) = (bytes[at], bytes[at + 1]);
            (hi.is_ascii_digit() && lo.is_ascii_digit())
                .then(|| u32::from(hi - b'0') * 10 + u32::from(lo - b'0'))
        };

        let day = two_digits(0).filter(|d| (1..=31).contains(d)).ok_or_else(invalid)?;
        let month = two_digits(3).filter(|m| (1..=12).contains(m)).ok_or_else(invalid)?;
        let yy = two_digits(6).ok_or_else(invalid)?;

        NaiveDate::from_ymd_opt(self.full_year(yy), month, day).ok_or_else(invalid)
    }

    /// 两位年份转四位：>= pivot 为 19xx，否则为 20xx
    fn full_year(&self, yy: u32) -> i32 {
        let yy = yy as i32;
        if yy >= i32::from(self.century_pivot) {
            1900 + yy
        } else {
            2000 + yy
        }
    }

    /// Whether `year` can be written as two digits and read back unchanged
    fn in_century_window(&self, year: i32) -> bool {
        let first = 1900 + i32::from(self.century_pivot);
        (first..first + 100).contains(&year)
    }

    pub fn format_date(date: NaiveDate) -> String {
        format!("{:02}.{:02}.{:02}", date.day(), date.month(), date.year().rem_euclid(100))
    }

    /// Validates `value`, clamps the sentinel, and shifts the date by a
    /// uniformly drawn offset in `[-range, +range]` days.
    ///
    /// # Errors
    ///
    /// * `EdfError::InvalidDate` - the value is neither a valid `dd.mm.yy`
    ///   date nor exactly the sentinel
    ///
    /// A source date within `range` days of the pivot can be shifted across
    /// it. The result is still written (two digits cannot say otherwise) but
    /// `century_wrapped` is set and a warning is logged.
    pub fn jitter<R: Rng + ?Sized>(&self, value: &str, rng: &mut R) -> Result<JitterOutcome> {
        let (source, clamp) = if value == self.sentinel {
            let audit = ClampAudit {
                original: value.to_string(),
                clamped: self.clamp.clone(),
            };
            debug!(
                original = %audit.original,
                clamped = %audit.clamped,
                "sentinel start date clamped"
            );
            (self.parse_date(&self.clamp)?, Some(audit))
        } else {
            (self.parse_date(value)?, None)
        };

        let range = i64::from(self.range_days);
        let offset_days = rng.gen_range(-range..=range);
        let shifted = shift_date(source, offset_days).ok_or_else(|| EdfError::InvalidDate {
            value: value.to_string(),
        })?;

        let new_date = Self::format_date(shifted);
        let century_wrapped = !self.in_century_window(shifted.year());
        if century_wrapped {
            warn!(
                original = value,
                new = %new_date,
                year = shifted.year(),
                pivot = self.century_pivot,
                "jittered start date crossed the century pivot and reads back 100 years off"
            );
        }

        Ok(JitterOutcome {
            original: value.to_string(),
            clamp,
            offset_days,
            new_date,
            century_wrapped,
        })
    }
}

/// Calendar-aware day shift; `None` only at the limits of `NaiveDate`
fn shift_date(date: NaiveDate, offset_days: i64) -> Option<NaiveDate> {
    let days = Days::new(offset_days.unsigned_abs());
    if offset_days >= 0 {
        date.checked_add_days(days)
    } else {
        date.checked_sub_days(days)
    }
}
