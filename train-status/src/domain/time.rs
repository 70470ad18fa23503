//! Clock values in the timetable API's `"HHMM"` format.
//!
//! Realtime Trains encodes times of day as bare digit strings: `"0800"`,
//! `"2359"`, sometimes `"080030"` when a realtime value carries seconds.
//! This module parses the HH:MM prefix and provides the midnight-wrap
//! arithmetic the extractor needs. There is no date component; a service
//! arriving at a numerically earlier time than it departed is treated as
//! arriving the next day.

use std::fmt;

/// Error returned when parsing an invalid HHMM string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid HHMM time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A 24h wall-clock time parsed from an `"HHMM"` string.
///
/// # Examples
///
/// ```
/// use train_status::domain::Hhmm;
///
/// let dep = Hhmm::parse("0915").unwrap();
/// assert_eq!(dep.to_string(), "0915");
/// assert_eq!(dep.minutes_from_midnight(), 9 * 60 + 15);
///
/// // Seconds suffixes are tolerated, extra digits beyond HHMM ignored
/// assert_eq!(Hhmm::parse("091530").unwrap(), dep);
///
/// // Too short or non-numeric values are rejected
/// assert!(Hhmm::parse("915").is_err());
/// assert!(Hhmm::parse("09:15").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hhmm {
    hour: u8,
    minute: u8,
}

impl Hhmm {
    /// Construct from components. Fails on out-of-range values.
    pub fn new(hour: u32, minute: u32) -> Result<Self, TimeError> {
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }
        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    /// Parse an `"HHMM"` string as the API emits them.
    ///
    /// The value must be at least 4 ASCII digits; only the first four are
    /// read, so `"HHMMSS"` realtime values parse as their HH:MM prefix.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let bytes = s.as_bytes();

        if bytes.len() < 4 {
            return Err(TimeError::new("expected at least 4 digits"));
        }
        if !bytes.iter().all(|b| b.is_ascii_digit()) {
            return Err(TimeError::new("expected digits only"));
        }

        let hour = two_digits(&bytes[0..2]);
        let minute = two_digits(&bytes[2..4]);
        Self::new(hour, minute)
    }

    /// Clock value of a chrono time, seconds discarded.
    pub fn from_time(time: chrono::NaiveTime) -> Self {
        use chrono::Timelike;
        // NaiveTime guarantees in-range components
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u32 {
        u32::from(self.hour)
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        u32::from(self.minute)
    }

    /// Minutes since midnight, 0..1440.
    pub fn minutes_from_midnight(&self) -> u32 {
        self.hour() * 60 + self.minute()
    }

    /// True when `self` is strictly later in the day than `other`.
    ///
    /// This is the time-window comparison: a departure at exactly "now"
    /// is not strictly later and gets filtered out.
    pub fn is_after(&self, other: Hhmm) -> bool {
        self.minutes_from_midnight() > other.minutes_from_midnight()
    }

    /// Journey duration in minutes from `departure` to `arrival`.
    ///
    /// An arrival numerically earlier than the departure is read as the
    /// next day (+1440 minutes). The result is never negative.
    pub fn elapsed_minutes(departure: Hhmm, arrival: Hhmm) -> u32 {
        let dep = departure.minutes_from_midnight();
        let mut arr = arrival.minutes_from_midnight();
        if arr < dep {
            arr += 24 * 60;
        }
        arr - dep
    }
}

impl fmt::Debug for Hhmm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hhmm({:02}{:02})", self.hour, self.minute)
    }
}

impl fmt::Display for Hhmm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}", self.hour, self.minute)
    }
}

/// Read two ASCII digit bytes as a number. Caller guarantees digits.
fn two_digits(bytes: &[u8]) -> u32 {
    u32::from(bytes[0] - b'0') * 10 + u32::from(bytes[1] - b'0')
}
