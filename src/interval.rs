use chrono::{NaiveTime, Timelike};
use std::fmt;

use crate::error::{Error, Result};

pub const MINUTES_PER_DAY: u32 = 24 * 60;
pub const DAYS_PER_WEEK: u32 = 7;
pub const MINUTES_PER_WEEK: u32 = DAYS_PER_WEEK * MINUTES_PER_DAY;

const TIME_FMT: &str = "%H:%M";
const TIME_FMT_SECONDS: &str = "%H:%M:%S";

/// A busy period inside the week, `[start, end)` in minutes since Monday 00:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct TimeRange {
    start: u32,
    end: u32,
}

impl TimeRange {
    /// Returns `None` unless `start < end`, the range lies inside the week and
    /// does not run past midnight.
    pub fn new(start: u32, end: u32) -> Option<TimeRange> {
        if start >= end || end > MINUTES_PER_WEEK {
            return None;
        }
        if start / MINUTES_PER_DAY != (end - 1) / MINUTES_PER_DAY {
            return None;
        }
        Some(TimeRange { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn day(&self) -> u32 {
        self.start / MINUTES_PER_DAY
    }

    /// Start and end relative to the beginning of `self.day()`.
    pub fn minutes_of_day(&self) -> (u32, u32) {
        let offset = self.day() * MINUTES_PER_DAY;
        (self.start - offset, self.end - offset)
    }

    pub fn intersects(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = self.minutes_of_day();
        write!(
            f,
            "{} {}-{}",
            day_name(self.day()),
            format_minutes(start),
            format_minutes(end)
        )
    }
}

/// True if any range of `a` intersects any range of `b`.
pub fn overlaps(a: &[TimeRange], b: &[TimeRange]) -> bool {
    a.iter().any(|x| b.iter().any(|y| x.intersects(y)))
}

/// Parse a clock time ("08:30" or "08:30:00") into minutes since midnight.
pub fn time_to_minutes(time: &str) -> Result<u32> {
    let time = time.trim();
    let parsed = NaiveTime::parse_from_str(time, TIME_FMT)
        .or_else(|_| NaiveTime::parse_from_str(time, TIME_FMT_SECONDS))
        .map_err(|e| Error::InvalidTime(format!("{:?}: {}", time, e)))?;
    Ok(parsed.hour() * 60 + parsed.minute())
}

/// Format minutes since midnight as "HH:MM". 1440 is printed as "24:00".
pub fn format_minutes(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

pub fn day_name(day: u32) -> &'static str {
    match day {
        0 => "Mon",
        1 => "Tue",
        2 => "Wed",
        3 => "Thu",
        4 => "Fri",
        5 => "Sat",
        6 => "Sun",
        _ => "???",
    }
}
