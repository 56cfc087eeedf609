//! XMLTV timestamp conventions.
//!
//! Upstream listings give wall-clock times (`HH:MM`) in Beijing time and
//! leave the date implicit. XMLTV wants `YYYYMMDDHHMMSS +HHMM`, so every
//! slot is anchored to the harvest date and stamped with a fixed `+0800`
//! offset.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// UTC offset of every timestamp the guide emits.
pub const BROADCAST_OFFSET: &str = "+0800";

/// A wall-clock time of day as printed by listing sources.
///
/// Hours run to 24 inclusive; `24:00` and later mark a slot ending after
/// midnight and roll over to the following date when stamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    /// Create a clock time, validating the hour (0..=24) and minute (0..=59).
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour > 24 || minute > 59 {
            return Err(Error::InvalidTime(format!("{hour}:{minute:02}")));
        }
        Ok(Self { hour, minute })
    }

    #[must_use]
    pub const fn hour(&self) -> u8 {
        self.hour
    }

    #[must_use]
    pub const fn minute(&self) -> u8 {
        self.minute
    }
}

impl FromStr for ClockTime {
    type Err = Error;

    /// Parse `H:MM` or `HH:MM`, ignoring surrounding whitespace.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || Error::InvalidTime(trimmed.to_string());

        let (h, m) = trimmed.split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let hour = h.parse::<u8>().map_err(|_| invalid())?;
        let minute = m.parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute).map_err(|_| invalid())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<ClockTime> for String {
    fn from(clock: ClockTime) -> Self {
        clock.to_string()
    }
}

/// Stamp `clock` on `date` as an XMLTV timestamp.
///
/// ```
/// use chrono::NaiveDate;
/// use tvguide_core::time::xmltv_timestamp;
/// use tvguide_core::ClockTime;
///
/// let date = NaiveDate::from_ymd_opt(2026, 2, 13).unwrap();
/// let clock: ClockTime = "4:53".parse().unwrap();
/// assert_eq!(xmltv_timestamp(date, clock), "20260213045300 +0800");
/// ```
#[must_use]
pub fn xmltv_timestamp(date: NaiveDate, clock: ClockTime) -> String {
    let (date, hour) = if clock.hour >= 24 {
        (
            date.checked_add_days(Days::new(1)).unwrap_or(date),
            clock.hour - 24,
        )
    } else {
        (date, clock.hour)
    };
    format!(
        "{}{:02}{:02}00 {}",
        date.format("%Y%m%d"),
        hour,
        clock.minute,
        BROADCAST_OFFSET
    )
}

/// The last second of `date` as an XMLTV timestamp.
#[must_use]
pub fn end_of_day(date: NaiveDate) -> String {
    format!("{}235959 {}", date.format("%Y%m%d"), BROADCAST_OFFSET)
}

/// Today's date in the broadcast time zone (UTC+8).
///
/// Scheduled runs usually happen on UTC machines; anchoring to Beijing
/// time keeps an early-morning run from harvesting yesterday.
#[must_use]
pub fn broadcast_today() -> NaiveDate {
    let now = Utc::now();
    FixedOffset::east_opt(8 * 3600)
        .map_or_else(|| now.date_naive(), |tz| now.with_timezone(&tz).date_naive())
}

/// Format a date the way listing APIs expect it (`YYYYMMDD`).
#[must_use]
pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Parse a `YYYYMMDD` date.
pub fn parse_compact_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y%m%d")
        .map_err(|e| Error::InvalidData(format!("invalid date {s:?}: {e}")))
}
