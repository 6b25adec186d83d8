//! Usage windows and calendar boundaries.
//!
//! A window start is the midnight that opens the current calendar month or
//! day, evaluated in a [`Calendar`]. Records with a timestamp at or after the
//! start fall inside the window.

use std::str::FromStr;

use chrono::{
    DateTime, Datelike, FixedOffset, Local, NaiveDate, NaiveTime, Offset, TimeDelta, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Time range over which usage records are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageWindow {
    /// Every record ever written.
    AllTime,
    /// From the first day of the current month.
    CalendarMonth,
    /// From the start of the current day.
    CalendarDay,
}

impl UsageWindow {
    /// Start of the window containing `now`, or `None` for [`UsageWindow::AllTime`].
    pub fn start(&self, now: DateTime<Utc>, calendar: Calendar) -> Option<DateTime<Utc>> {
        match calendar {
            Calendar::Local => self.start_in(now.with_timezone(&Local)),
            Calendar::Fixed(offset) => self.start_in(now.with_timezone(&offset)),
        }
    }

    fn start_in<Tz: TimeZone>(&self, now: DateTime<Tz>) -> Option<DateTime<Utc>> {
        let today = now.date_naive();
        let first = match self {
            UsageWindow::AllTime => return None,
            UsageWindow::CalendarMonth => {
                NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today)
            }
            UsageWindow::CalendarDay => today,
        };
        Some(midnight(&now.timezone(), first))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UsageWindow::AllTime => "all_time",
            UsageWindow::CalendarMonth => "calendar_month",
            UsageWindow::CalendarDay => "calendar_day",
        }
    }
}

/// First instant of `date` in `tz`, as UTC.
fn midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
        return dt.with_timezone(&Utc);
    }
    // Midnight skipped by a DST jump: the day opens one hour later.
    tz.from_local_datetime(&(naive + TimeDelta::hours(1)))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// Calendar in which month and day boundaries are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Calendar {
    /// The process's local time zone.
    #[default]
    Local,
    /// A fixed UTC offset.
    Fixed(FixedOffset),
}

impl Calendar {
    /// UTC calendar.
    pub fn utc() -> Self {
        Calendar::Fixed(Utc.fix())
    }
}

/// Error parsing a calendar setting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid calendar '{0}': expected 'local', 'utc', or an offset like '+09:00'")]
pub struct CalendarParseError(pub String);

impl FromStr for Calendar {
    type Err = CalendarParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_lowercase().as_str() {
            "local" => return Ok(Calendar::Local),
            "utc" | "z" => return Ok(Calendar::utc()),
            _ => {}
        }

        let err = || CalendarParseError(s.to_string());

        let (sign, rest) = match trimmed.as_bytes().first() {
            Some(b'+') => (1, &trimmed[1..]),
            Some(b'-') => (-1, &trimmed[1..]),
            _ => return Err(err()),
        };
        let (hours, minutes) = rest.split_once(':').ok_or_else(err)?;
        let hours: i32 = hours.parse().map_err(|_| err())?;
        let minutes: i32 = minutes.parse().map_err(|_| err())?;
        if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
            return Err(err());
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Calendar::Fixed)
            .ok_or_else(err)
    }
}
