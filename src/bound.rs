//! Bounds of an effect period.
//!
//! A [`Bound`] is either one of the two infinities or a timezone aware
//! instant. The variant order is the ordering: `NegativeInfinity` sorts
//! before every timestamp and `PositiveInfinity` after every timestamp, while
//! two timestamps compare by the instant they denote (the offset they were
//! written in plays no part in equality, ordering or hashing).

// used for the instants themselves
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc};

// used when parsing a string to a Bound
use std::str::FromStr;
// used to print out readable forms of a bound
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Result, VirkningError};

pub type Timestamp = DateTime<FixedOffset>;

pub const INFINITY: &str = "infinity";
pub const NEGATIVE_INFINITY: &str = "-infinity";

lazy_static! {
    // all-digit tokens are seconds since the Unix epoch
    static ref EPOCH_SECONDS: Regex = Regex::new(r"^[+-]?\d+$").unwrap();
    // PostgreSQL writes offsets as +01, +0530 or +05:30
    static ref SHORT_OFFSET: Regex = Regex::new(r"([+-]\d{2})$").unwrap();
    // the offset must follow a time of day, or the day of a bare date would match
    static ref HAS_OFFSET: Regex = Regex::new(r"\d{2}:\d{2}(:\d{2}(\.\d+)?)?(Z|z|[+-]\d{2}(:?\d{2})?)$").unwrap();
}

// formats tried in order for tokens carrying an offset
const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
pub enum Bound {
    NegativeInfinity,
    Timestamp(Timestamp),
    PositiveInfinity,
}

impl Bound {
    pub fn at(t: Timestamp) -> Self {
        Bound::Timestamp(t)
    }
    pub fn is_infinite(&self) -> bool {
        !matches!(self, Bound::Timestamp(_))
    }
    pub fn timestamp(&self) -> Option<&Timestamp> {
        match self {
            Bound::Timestamp(t) => Some(t),
            _ => None,
        }
    }
    /// Shifts a finite bound by `delta`. Infinities have no arithmetic, so
    /// shifting one is an error rather than a saturation.
    pub fn checked_add(&self, delta: Duration) -> Result<Bound> {
        match self {
            Bound::Timestamp(t) => t
                .checked_add_signed(delta)
                .map(Bound::Timestamp)
                .ok_or_else(|| VirkningError::UnboundedArithmetic(format!("{} + {}", t, delta))),
            other => Err(VirkningError::UnboundedArithmetic(format!("{} + {}", other, delta))),
        }
    }
    /// Parses a bound token, reading naive timestamps in `offset`.
    pub fn parse_in(token: &str, offset: FixedOffset) -> Result<Bound> {
        let token = token.trim();
        if token.eq_ignore_ascii_case(INFINITY) || token.eq_ignore_ascii_case("+infinity") {
            Ok(Bound::PositiveInfinity)
        } else if token.eq_ignore_ascii_case(NEGATIVE_INFINITY) {
            Ok(Bound::NegativeInfinity)
        } else {
            parse_timestamp_in(token, offset).map(Bound::Timestamp)
        }
    }
}

impl From<Timestamp> for Bound {
    fn from(t: Timestamp) -> Self {
        Bound::Timestamp(t)
    }
}
impl From<DateTime<Utc>> for Bound {
    fn from(t: DateTime<Utc>) -> Self {
        Bound::Timestamp(t.fixed_offset())
    }
}

impl FromStr for Bound {
    type Err = VirkningError;
    fn from_str(s: &str) -> Result<Self> {
        Bound::parse_in(s, utc())
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Bound::NegativeInfinity => write!(f, "{}", NEGATIVE_INFINITY),
            Bound::Timestamp(t) => write!(f, "{}", format_timestamp(t)),
            Bound::PositiveInfinity => write!(f, "{}", INFINITY),
        }
    }
}

pub fn utc() -> FixedOffset {
    Utc.fix()
}

/// RFC 3339 with the offset the instant was read in, fractional seconds only
/// when present.
pub fn format_timestamp(t: &Timestamp) -> String {
    t.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

pub fn parse_timestamp(token: &str) -> Result<Timestamp> {
    parse_timestamp_in(token, utc())
}

/// Parses the timestamp spellings found on the wire: RFC 3339, the
/// PostgreSQL output form (`2017-01-01 00:00:00+01`), naive date-times and
/// dates (read in `offset`) and epoch seconds.
pub fn parse_timestamp_in(token: &str, offset: FixedOffset) -> Result<Timestamp> {
    let token = token.trim();
    let invalid = || VirkningError::InvalidTimestamp(token.to_string());
    if token.is_empty() {
        return Err(invalid());
    }
    if EPOCH_SECONDS.is_match(token) {
        let seconds = token.parse::<i64>().map_err(|_| invalid())?;
        return DateTime::from_timestamp(seconds, 0)
            .map(|t| t.fixed_offset())
            .ok_or_else(invalid);
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(token) {
        return Ok(t);
    }
    if HAS_OFFSET.is_match(token) {
        // widen "+01" to "+01:00" so a single offset directive covers it
        let widened = SHORT_OFFSET.replace(token, "${1}:00");
        let widened = if widened.ends_with('Z') || widened.ends_with('z') {
            format!("{}+00:00", &widened[..widened.len() - 1])
        } else {
            widened.into_owned()
        };
        return OFFSET_FORMATS
            .iter()
            .find_map(|format| DateTime::parse_from_str(&widened, format).ok())
            .ok_or_else(invalid);
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(token, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(token, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(invalid)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(invalid)
}
