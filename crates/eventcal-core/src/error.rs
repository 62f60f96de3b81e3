//! Error types for calendar operations.
//!
//! Every engine reports failures through [`CalendarError`]. Validation
//! failures carry a [`Violations`] list so a batch (a recurring create, a
//! series edit, a multi-event copy) can report every broken rule at once
//! instead of stopping at the first one.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use thiserror::Error;

use crate::time::DATE_TIME_FORMAT;

/// Result type for calendar operations.
pub type CalendarResult<T> = Result<T, CalendarError>;

/// Coarse error category, for callers that branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Duplicate,
    NamingConflict,
    Unsupported,
}

/// A single broken rule found while validating a proposed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The subject is empty or whitespace.
    EmptySubject,
    /// The end is not strictly after the start.
    EndNotAfterStart {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// A series occurrence would start and end on different dates.
    SpansMultipleDays {
        subject: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// The candidate collides with an existing or in-batch event.
    Duplicate {
        subject: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// The wall-clock time falls in a DST gap of the timezone.
    NonexistentLocalTime { time: NaiveDateTime, timezone: Tz },
    /// More than one event matches a lookup that needs exactly one.
    AmbiguousEvent {
        subject: String,
        start: NaiveDateTime,
        matches: usize,
    },
    /// A recurrence with no weekdays selected.
    NoWeekdays,
    /// A recurrence asked to repeat zero times.
    ZeroRepeatCount,
    /// The recurrence rule yields no occurrence at all.
    NoOccurrences { anchor: NaiveDate },
    /// A date interval whose end precedes its start.
    InvalidDateRange { from: NaiveDate, to: NaiveDate },
    /// An edit request without any property change.
    NoChanges,
    /// A value that cannot be interpreted for the named field.
    InvalidValue {
        field: &'static str,
        value: String,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ts = |t: &NaiveDateTime| t.format(DATE_TIME_FORMAT).to_string();
        match self {
            Self::EmptySubject => write!(f, "subject must not be empty"),
            Self::EndNotAfterStart { start, end } => {
                write!(f, "end {} must be after start {}", ts(end), ts(start))
            }
            Self::SpansMultipleDays {
                subject,
                start,
                end,
            } => write!(
                f,
                "series events must start and end on the same day ('{}' {} to {})",
                subject,
                ts(start),
                ts(end)
            ),
            Self::Duplicate {
                subject,
                start,
                end,
            } => write!(
                f,
                "'{}' from {} to {} already exists",
                subject,
                ts(start),
                ts(end)
            ),
            Self::NonexistentLocalTime { time, timezone } => {
                write!(f, "{} does not exist in {}", ts(time), timezone)
            }
            Self::AmbiguousEvent {
                subject,
                start,
                matches,
            } => write!(
                f,
                "{} events named '{}' start at {}; give the end time as well",
                matches,
                subject,
                ts(start)
            ),
            Self::NoWeekdays => write!(f, "a recurring event needs at least one weekday"),
            Self::ZeroRepeatCount => write!(f, "repeat count must be at least 1"),
            Self::NoOccurrences { anchor } => {
                write!(f, "recurrence starting {} produces no occurrences", anchor)
            }
            Self::InvalidDateRange { from, to } => {
                write!(f, "date range end {} is before its start {}", to, from)
            }
            Self::NoChanges => write!(f, "no property changes requested"),
            Self::InvalidValue { field, value } => write!(f, "invalid {}: '{}'", field, value),
        }
    }
}

/// An ordered collection of violations found while validating one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.0.push(violation);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    /// True when every violation is a duplicate collision.
    pub fn only_duplicates(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .iter()
                .all(|v| matches!(v, Violation::Duplicate { .. }))
    }

    /// Turns the collected violations into a result.
    ///
    /// An empty list is success. A list made only of duplicates becomes
    /// [`CalendarError::Duplicate`]; anything else is
    /// [`CalendarError::Validation`].
    pub fn into_result(self) -> CalendarResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(CalendarError::from(self))
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

impl From<Violation> for Violations {
    fn from(violation: Violation) -> Self {
        Self(vec![violation])
    }
}

impl Extend<Violation> for Violations {
    fn extend<I: IntoIterator<Item = Violation>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Errors that can occur while managing calendars and their events.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// A calendar or event lookup failed.
    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    /// The request breaks one or more scheduling rules.
    #[error("invalid request: {0}")]
    Validation(Violations),

    /// The request would create events that already exist.
    #[error("duplicate event: {0}")]
    Duplicate(Violations),

    /// A calendar with that name already exists.
    #[error("calendar name already in use: {name}")]
    NamingConflict { name: String },

    /// Unknown property, command or format.
    #[error("unsupported {what}: '{value}'")]
    Unsupported { what: &'static str, value: String },
}

impl CalendarError {
    /// Creates a not-found error.
    pub fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            key: key.into(),
        }
    }

    /// Creates a naming conflict error.
    pub fn naming_conflict(name: impl Into<String>) -> Self {
        Self::NamingConflict { name: name.into() }
    }

    /// Creates an unsupported-operation error.
    pub fn unsupported(what: &'static str, value: impl Into<String>) -> Self {
        Self::Unsupported {
            what,
            value: value.into(),
        }
    }

    /// Returns the error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Duplicate(_) => ErrorKind::Duplicate,
            Self::NamingConflict { .. } => ErrorKind::NamingConflict,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
        }
    }

    /// Returns the violations behind a validation or duplicate error.
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::Validation(v) | Self::Duplicate(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Violation> for CalendarError {
    fn from(violation: Violation) -> Self {
        Self::from(Violations::from(violation))
    }
}

impl From<Violations> for CalendarError {
    fn from(violations: Violations) -> Self {
        if violations.only_duplicates() {
            Self::Duplicate(violations)
        } else {
            Self::Validation(violations)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 5)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn duplicate() -> Violation {
        Violation::Duplicate {
            subject: "Standup".to_string(),
            start: at(9, 0),
            end: at(9, 15),
        }
    }

    #[test]
    fn empty_violations_are_ok() {
        assert!(Violations::new().into_result().is_ok());
    }

    #[test]
    fn only_duplicates_become_duplicate_error() {
        let mut violations = Violations::new();
        violations.push(duplicate());
        let err = violations.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);
        assert_eq!(
            err.to_string(),
            "duplicate event: 'Standup' from 2025-05-05T09:00 to 2025-05-05T09:15 already exists"
        );
    }

    #[test]
    fn mixed_violations_become_validation_error_listing_all() {
        let mut violations = Violations::new();
        violations.push(Violation::EmptySubject);
        violations.push(duplicate());
        violations.push(Violation::EndNotAfterStart {
            start: at(10, 0),
            end: at(9, 0),
        });
        let err = violations.into_result().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.violations().map(Violations::len), Some(3));
        let message = err.to_string();
        assert!(message.contains("subject must not be empty"));
        assert!(message.contains("already exists"));
        assert!(message.contains("must be after start"));
    }

    #[test]
    fn single_violation_conversion() {
        let err = CalendarError::from(Violation::NoWeekdays);
        assert_eq!(err.kind(), ErrorKind::Validation);
        let err = CalendarError::from(duplicate());
        assert_eq!(err.kind(), ErrorKind::Duplicate);
    }

    #[test]
    fn constructors_and_kinds() {
        let err = CalendarError::not_found("calendar", "work");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "calendar not found: work");
        assert!(err.violations().is_none());

        let err = CalendarError::naming_conflict("work");
        assert_eq!(err.kind(), ErrorKind::NamingConflict);

        let err = CalendarError::unsupported("event property", "colour");
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert_eq!(err.to_string(), "unsupported event property: 'colour'");
    }
}
