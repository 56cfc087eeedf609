use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::time::{end_of_day, xmltv_timestamp, ClockTime};

/// A single programme slot on a channel.
///
/// `start` and `stop` are XMLTV timestamps (`YYYYMMDDHHMMSS +0800`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Programme {
    /// Id of the [`Channel`](crate::Channel) this slot airs on.
    pub channel: String,
    pub start: String,
    pub stop: String,
    pub title: String,
}

impl Programme {
    #[must_use]
    pub fn new(
        channel: impl Into<String>,
        start: impl Into<String>,
        stop: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            start: start.into(),
            stop: stop.into(),
            title: title.into(),
        }
    }

    /// Build a slot from wall-clock start and stop times on `date`.
    ///
    /// A `stop` earlier than `start` crosses midnight and is stamped on the
    /// following date.
    #[must_use]
    pub fn on_date(
        channel: impl Into<String>,
        date: NaiveDate,
        start: ClockTime,
        stop: ClockTime,
        title: impl Into<String>,
    ) -> Self {
        let stop_date = if stop < start {
            date.checked_add_days(Days::new(1)).unwrap_or(date)
        } else {
            date
        };
        Self::new(
            channel,
            xmltv_timestamp(date, start),
            xmltv_timestamp(stop_date, stop),
            title,
        )
    }

    /// Build a slot that runs from `start` until the last second of `date`.
    #[must_use]
    pub fn until_end_of_day(
        channel: impl Into<String>,
        date: NaiveDate,
        start: ClockTime,
        title: impl Into<String>,
    ) -> Self {
        Self::new(channel, xmltv_timestamp(date, start), end_of_day(date), title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 13).unwrap()
    }

    #[test]
    fn test_programme_on_date() {
        let prog = Programme::on_date(
            "CCTV1",
            date(),
            ClockTime::new(19, 0).unwrap(),
            ClockTime::new(19, 30).unwrap(),
            "新闻联播",
        );
        assert_eq!(prog.channel, "CCTV1");
        assert_eq!(prog.start, "20260213190000 +0800");
        assert_eq!(prog.stop, "20260213193000 +0800");
        assert_eq!(prog.title, "新闻联播");
    }

    #[test]
    fn test_programme_crossing_midnight_stops_next_day() {
        let prog = Programme::on_date(
            "CCTV1",
            date(),
            ClockTime::new(23, 30).unwrap(),
            ClockTime::new(0, 30).unwrap(),
            "午夜剧场",
        );
        assert_eq!(prog.start, "20260213233000 +0800");
        assert_eq!(prog.stop, "20260214003000 +0800");
    }

    #[test]
    fn test_programme_ending_at_24_00_is_not_pushed_twice() {
        let prog = Programme::on_date(
            "CCTV1",
            date(),
            ClockTime::new(23, 30).unwrap(),
            ClockTime::new(24, 0).unwrap(),
            "晚间新闻",
        );
        assert_eq!(prog.stop, "20260214000000 +0800");
    }

    #[test]
    fn test_programme_until_end_of_day() {
        let prog =
            Programme::until_end_of_day("CCTV1", date(), ClockTime::new(23, 5).unwrap(), "晚间新闻");
        assert_eq!(prog.start, "20260213230500 +0800");
        assert_eq!(prog.stop, "20260213235959 +0800");
    }
}
