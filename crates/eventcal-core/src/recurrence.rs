//! Weekly recurrence expansion.
//!
//! A recurring request names an anchor (a date plus a time-of-day span), a
//! set of weekdays and a termination rule. Expansion walks forward from the
//! anchor date one day at a time and emits an occurrence on every selected
//! weekday until the rule is satisfied. All occurrences of one expansion share
//! a fresh [`SeriesId`].

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CalendarResult, Violation, Violations};
use crate::event::{Event, EventDetails, EventDraft, SeriesId};
use crate::time::{ALL_DAY_END, ALL_DAY_START, resolve_local};

/// Days searched for the first occurrence; one full week always contains a
/// selected weekday when the set is not empty.
const FIRST_OCCURRENCE_WINDOW: usize = 7;

/// Upper bound on the occurrences one recurring request may produce.
pub const MAX_OCCURRENCES: usize = 10_000;

const WEEKDAY_LETTERS: [(Weekday, char); 7] = [
    (Weekday::Mon, 'M'),
    (Weekday::Tue, 'T'),
    (Weekday::Wed, 'W'),
    (Weekday::Thu, 'R'),
    (Weekday::Fri, 'F'),
    (Weekday::Sat, 'S'),
    (Weekday::Sun, 'U'),
];

/// A set of weekdays, written as letters `MTWRFSU` (Thursday is `R`,
/// Sunday is `U`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Weekdays(u8);

impl Weekdays {
    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns the selected days, Monday first.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEKDAY_LETTERS
            .iter()
            .map(|(day, _)| *day)
            .filter(|day| self.contains(*day))
    }
}

impl FromIterator<Weekday> for Weekdays {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut days = Self::default();
        for day in iter {
            days.insert(day);
        }
        days
    }
}

impl FromStr for Weekdays {
    type Err = Violation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Violation::InvalidValue {
            field: "weekdays",
            value: s.to_string(),
        };
        let mut days = Self::default();
        for letter in s.chars() {
            let letter = letter.to_ascii_uppercase();
            let (day, _) = WEEKDAY_LETTERS
                .iter()
                .find(|(_, l)| *l == letter)
                .ok_or_else(invalid)?;
            days.insert(*day);
        }
        if days.is_empty() {
            return Err(invalid());
        }
        Ok(days)
    }
}

impl fmt::Display for Weekdays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        WEEKDAY_LETTERS
            .iter()
            .filter(|(day, _)| self.contains(*day))
            .try_for_each(|(_, letter)| write!(f, "{}", letter))
    }
}

impl TryFrom<String> for Weekdays {
    type Error = Violation;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Weekdays> for String {
    fn from(days: Weekdays) -> Self {
        days.to_string()
    }
}

/// When a recurrence stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Stop after this many occurrences.
    Times(u32),
    /// Stop after the last occurrence on or before this date.
    Until(NaiveDate),
}

/// A weekly recurrence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub weekdays: Weekdays,
    pub termination: Termination,
}

impl Recurrence {
    pub fn times(weekdays: Weekdays, count: u32) -> Self {
        Self {
            weekdays,
            termination: Termination::Times(count),
        }
    }

    pub fn until(weekdays: Weekdays, last: NaiveDate) -> Self {
        Self {
            weekdays,
            termination: Termination::Until(last),
        }
    }

    /// Lists the occurrence dates produced from `anchor`, in increasing order.
    pub fn dates_from(&self, anchor: NaiveDate) -> Result<Vec<NaiveDate>, Violations> {
        let mut violations = Violations::new();
        if self.weekdays.is_empty() {
            violations.push(Violation::NoWeekdays);
        }
        match self.termination {
            Termination::Times(0) => violations.push(Violation::ZeroRepeatCount),
            Termination::Times(count) if count as usize > MAX_OCCURRENCES => {
                violations.push(Violation::InvalidValue {
                    field: "repeat count",
                    value: count.to_string(),
                });
            }
            _ => {}
        }
        if !violations.is_empty() {
            return Err(violations);
        }

        let first = anchor
            .iter_days()
            .take(FIRST_OCCURRENCE_WINDOW)
            .find(|day| self.weekdays.contains(day.weekday()));
        let Some(first) = first else {
            return Err(Violation::NoOccurrences { anchor }.into());
        };

        let selected = first
            .iter_days()
            .filter(|day| self.weekdays.contains(day.weekday()));
        let dates: Vec<NaiveDate> = match self.termination {
            Termination::Times(count) => selected.take(count as usize).collect(),
            Termination::Until(last) => {
                let dates: Vec<NaiveDate> = selected
                    .take_while(|day| *day <= last)
                    .take(MAX_OCCURRENCES + 1)
                    .collect();
                if dates.len() > MAX_OCCURRENCES {
                    return Err(Violation::InvalidValue {
                        field: "repeat end date",
                        value: last.to_string(),
                    }
                    .into());
                }
                dates
            }
        };

        if dates.is_empty() {
            return Err(Violation::NoOccurrences { anchor }.into());
        }
        Ok(dates)
    }
}

/// The first occurrence's date and local time-of-day span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Anchor {
    /// Anchor for an all-day series.
    pub fn all_day(date: NaiveDate) -> Self {
        Self {
            date,
            start: ALL_DAY_START,
            end: ALL_DAY_END,
        }
    }

    /// Anchor for a timed series; start and end must share a date.
    pub fn timed(
        subject: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Self, Violation> {
        if start.date() != end.date() {
            return Err(Violation::SpansMultipleDays {
                subject: subject.to_string(),
                start,
                end,
            });
        }
        Ok(Self {
            date: start.date(),
            start: start.time(),
            end: end.time(),
        })
    }
}

/// Expands a recurring request into concrete occurrences.
///
/// Every occurrence is validated; any failure rejects the whole expansion
/// with all collected violations.
pub fn expand(
    subject: &str,
    details: &EventDetails,
    anchor: Anchor,
    recurrence: &Recurrence,
    tz: Tz,
) -> CalendarResult<Vec<Event>> {
    let dates = recurrence.dates_from(anchor.date)?;
    let series_id = SeriesId::new();

    let mut violations = Violations::new();
    let mut drafts = Vec::with_capacity(dates.len());
    for date in &dates {
        let start = resolve_local(date.and_time(anchor.start), tz);
        let end = resolve_local(date.and_time(anchor.end), tz);
        match (start, end) {
            (Ok(start), Ok(end)) => {
                let draft = EventDraft::new(subject, start, end)
                    .with_details(details)
                    .with_series(Some(series_id));
                violations.extend(draft.violations());
                drafts.push(draft);
            }
            (start, end) => violations.extend(start.err().into_iter().chain(end.err())),
        }
    }
    violations.into_result()?;

    debug!(
        subject = %subject,
        series = %series_id,
        weekdays = %recurrence.weekdays,
        count = drafts.len(),
        "Expanded recurrence"
    );
    Ok(drafts
        .into_iter()
        .map(EventDraft::into_event_unchecked)
        .collect())
}
