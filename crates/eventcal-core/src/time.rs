//! Time helpers for calendar events.
//!
//! This module resolves wall-clock date-times in a calendar's timezone,
//! parses the textual date formats used by requests, and provides
//! [`TimeWindow`], the half-open interval every query is evaluated against.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::Violation;

/// Date format used by requests: `2025-05-05`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date-time format used by requests: `2025-05-05T10:00`.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Local start of an all-day event.
pub const ALL_DAY_START: NaiveTime = NaiveTime::MIN;

/// Local end of an all-day event. Stays on the same date so all-day
/// occurrences can belong to a series.
pub const ALL_DAY_END: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 59) {
    Some(time) => time,
    None => NaiveTime::MIN,
};

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, Violation> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| Violation::InvalidValue {
        field: "date",
        value: value.to_string(),
    })
}

/// Parses a `YYYY-MM-DDThh:mm` date-time.
pub fn parse_date_time(value: &str) -> Result<NaiveDateTime, Violation> {
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT).map_err(|_| Violation::InvalidValue {
        field: "date-time",
        value: value.to_string(),
    })
}

/// Parses an IANA timezone identifier such as `America/New_York`.
pub fn parse_timezone(value: &str) -> Result<Tz, Violation> {
    value.parse::<Tz>().map_err(|_| Violation::InvalidValue {
        field: "timezone",
        value: value.to_string(),
    })
}

/// Resolves a wall-clock date-time in the given timezone.
///
/// Ambiguous times (DST fold) resolve to the earlier instant; times inside a
/// DST gap do not exist and are rejected.
pub fn resolve_local(local: NaiveDateTime, tz: Tz) -> Result<DateTime<Tz>, Violation> {
    tz.from_local_datetime(&local)
        .earliest()
        .ok_or(Violation::NonexistentLocalTime {
            time: local,
            timezone: tz,
        })
}

/// Returns the first instant of `date` in the given timezone.
///
/// A few zones skip midnight on DST transition days; the day then starts at
/// the first wall-clock time that exists.
pub fn start_of_day(date: NaiveDate, tz: Tz) -> Result<DateTime<Tz>, Violation> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..=8)
        .map(|step| midnight + TimeDelta::minutes(15 * step))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .ok_or(Violation::NonexistentLocalTime {
            time: midnight,
            timezone: tz,
        })
}

/// Formats an instant as wall-clock time in its own timezone.
pub fn format_local(instant: &DateTime<Tz>) -> String {
    instant.format(DATE_TIME_FORMAT).to_string()
}

/// A time window for querying calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window; `end` must not precede `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, Violation> {
        if end < start {
            return Err(Violation::EndNotAfterStart {
                start: start.naive_utc(),
                end: end.naive_utc(),
            });
        }
        Ok(Self { start, end })
    }

    /// Creates a window from two wall-clock times in the given timezone.
    pub fn from_local(
        start: NaiveDateTime,
        end: NaiveDateTime,
        tz: Tz,
    ) -> Result<Self, Violation> {
        if end < start {
            return Err(Violation::EndNotAfterStart { start, end });
        }
        let start = resolve_local(start, tz)?.with_timezone(&Utc);
        let end = resolve_local(end, tz)?.with_timezone(&Utc);
        Self::new(start, end)
    }

    /// Creates a time window for a single day in the given timezone.
    pub fn for_date(date: NaiveDate, tz: Tz) -> Result<Self, Violation> {
        Self::for_dates(date, date, tz)
    }

    /// Creates a window covering every day from `from` to `to`, inclusive.
    pub fn for_dates(from: NaiveDate, to: NaiveDate, tz: Tz) -> Result<Self, Violation> {
        if to < from {
            return Err(Violation::InvalidDateRange { from, to });
        }
        let after = to
            .checked_add_days(Days::new(1))
            .ok_or(Violation::InvalidDateRange { from, to })?;
        let start = start_of_day(from, tz)?.with_timezone(&Utc);
        let end = start_of_day(after, tz)?.with_timezone(&Utc);
        Self::new(start, end)
    }

    /// Returns the duration of this time window.
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Checks if an instant falls within this window.
    ///
    /// Uses half-open interval semantics: `[start, end)`.
    pub fn contains<Z: TimeZone>(&self, instant: &DateTime<Z>) -> bool {
        let instant = instant.with_timezone(&Utc);
        self.start <= instant && instant < self.end
    }

    /// Checks if an interval `[start, end)` overlaps with this window.
    ///
    /// It overlaps if it starts before the window ends AND ends after the
    /// window starts, so touching boundaries do not count.
    pub fn overlaps<Z: TimeZone>(&self, start: &DateTime<Z>, end: &DateTime<Z>) -> bool {
        start.with_timezone(&Utc) < self.end && end.with_timezone(&Utc) > self.start
    }
}
