//! Time arithmetic for the fixed daily slot grid.
//!
//! All `HH:MM` and date handling lives here; other modules never format or
//! parse times themselves.
//!
//! The grid runs from 09:00 to 23:00 in 30-minute steps, which gives 29 slots
//! per day. Bookings may run past the last slot; only the preparation buffer
//! placement cares about closing time.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, Duration, Months, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Pre-compiled pattern for `HH:MM` (one or two hour digits, two minute digits).
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]?\d|2[0-3]):([0-5]\d)$").unwrap());

/// First slot of the day, in minutes since midnight (09:00).
pub const OPENING_MINUTES: i64 = 9 * 60;

/// Last slot of the day, in minutes since midnight (23:00).
pub const CLOSING_MINUTES: i64 = 23 * 60;

/// Length of one grid slot.
pub const SLOT_MINUTES: i64 = 30;

/// Number of slots in the daily grid.
pub const SLOTS_PER_DAY: usize = 29;

/// Mandatory gap after every confirmed reservation.
pub const PREP_BUFFER_MINUTES: i64 = 15;

/// Longest duration a single booking may request: one full day.
pub const MAX_DURATION_MINUTES: i64 = 24 * 60;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// A wall-clock time of day with minute precision.
///
/// Serialized as an `HH:MM` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u16);

impl ClockTime {
    /// 09:00, the first slot.
    pub const OPENING: Self = Self(540);

    /// 23:00, the last slot and the cut-off for preparation buffers.
    pub const CLOSING: Self = Self(1380);

    /// Builds a time from minutes since midnight.
    ///
    /// Returns `None` outside `0..1440`; there is no day rollover.
    pub fn from_minutes(minutes: i64) -> Option<Self> {
        if (0..MINUTES_PER_DAY).contains(&minutes) {
            u16::try_from(minutes).ok().map(Self)
        } else {
            None
        }
    }

    /// Minutes since midnight.
    pub fn minutes(self) -> i64 {
        i64::from(self.0)
    }

    /// Parses an `HH:MM` string.
    pub fn parse(value: &str) -> Result<Self, ScheduleError> {
        let minutes = time_to_minutes(value)?;
        Self::from_minutes(minutes).ok_or_else(|| ScheduleError::InvalidTimeFormat {
            value: value.to_string(),
        })
    }

    /// Position of this time in the daily grid, if it is a grid slot.
    pub fn slot_index(self) -> Option<usize> {
        let offset = self.minutes() - OPENING_MINUTES;
        if offset < 0 || offset % SLOT_MINUTES != 0 {
            return None;
        }
        usize::try_from(offset / SLOT_MINUTES)
            .ok()
            .filter(|idx| *idx < SLOTS_PER_DAY)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", minutes_to_time(self.minutes()))
    }
}

impl FromStr for ClockTime {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClockTime> for String {
    fn from(time: ClockTime) -> Self {
        time.to_string()
    }
}

/// Converts `HH:MM` into minutes since midnight.
pub fn time_to_minutes(hhmm: &str) -> Result<i64, ScheduleError> {
    let invalid = || ScheduleError::InvalidTimeFormat {
        value: hhmm.to_string(),
    };
    let caps = TIME_RE.captures(hhmm).ok_or_else(invalid)?;
    let hours: i64 = caps[1].parse().map_err(|_| invalid())?;
    let minutes: i64 = caps[2].parse().map_err(|_| invalid())?;
    Ok(hours * 60 + minutes)
}

/// Converts minutes since midnight into zero-padded `HH:MM`.
///
/// Values of 1440 or more are not wrapped; callers must guard them.
pub fn minutes_to_time(minutes: i64) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// The canonical grid, 09:00 through 23:00 every 30 minutes.
pub const SLOT_GRID: [ClockTime; SLOTS_PER_DAY] = build_grid();

const fn build_grid() -> [ClockTime; SLOTS_PER_DAY] {
    let mut grid = [ClockTime::OPENING; SLOTS_PER_DAY];
    let mut idx = 0;
    while idx < SLOTS_PER_DAY {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_possible_wrap,
            reason = "grid minutes stay below 1440"
        )]
        let minutes = (OPENING_MINUTES + idx as i64 * SLOT_MINUTES) as u16;
        grid[idx] = ClockTime(minutes);
        idx += 1;
    }
    grid
}

/// Returns the slot grid in canonical iteration order.
pub const fn slot_grid() -> &'static [ClockTime] {
    &SLOT_GRID
}

// ========== Dates ==========

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| {
            ScheduleError::InvalidInput(format!("invalid date {value:?}, expected YYYY-MM-DD"))
        })
}

/// Formats a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses a `YYYY-MM` month into its first day.
pub fn parse_month(value: &str) -> Result<NaiveDate, ScheduleError> {
    parse_date(&format!("{value}-01"))
        .map_err(|_| {
            ScheduleError::InvalidInput(format!("invalid month {value:?}, expected YYYY-MM"))
        })
}

/// First day of the given month.
pub fn first_of_month(year: i32, month: u32) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ScheduleError::InvalidInput(format!("invalid month {year}-{month:02}")))
}

/// Monday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Half-open range of calendar dates, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A single date.
    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date + Duration::days(1))
    }

    /// The Monday-start week containing `date`.
    pub fn week(date: NaiveDate) -> Self {
        let start = week_start(date);
        Self::new(start, start + Duration::days(7))
    }

    /// The calendar month starting at `first` (which must be a first-of-month).
    pub fn month(first: NaiveDate) -> Self {
        let end = first
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        Self::new(first, end)
    }

    /// The 42-day Monday-start window a month calendar displays.
    pub fn month_grid(first: NaiveDate) -> Self {
        let start = week_start(first);
        Self::new(start, start + Duration::days(42))
    }

    /// A whole calendar year.
    pub fn year(year: i32) -> Result<Self, ScheduleError> {
        let start = first_of_month(year, 1)?;
        let next = year
            .checked_add(1)
            .ok_or_else(|| ScheduleError::InvalidInput(format!("year {year} out of range")))?;
        let end = first_of_month(next, 1)?;
        Ok(Self::new(start, end))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Iterates every date in the range in calendar order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d < end)
    }
}
