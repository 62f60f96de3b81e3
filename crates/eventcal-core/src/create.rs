//! Event creation.
//!
//! A [`CreateRequest`] picks one of six strategies: a timed or all-day event,
//! either single, repeated a number of times, or repeated until a date. Each
//! strategy produces candidate events, runs them through the
//! [`DuplicateGuard`](crate::guard::DuplicateGuard) together with the
//! calendar's existing events, and returns the new events without touching
//! the existing set. Any failure rejects the whole request.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CalendarResult, Violations};
use crate::event::{Event, EventDetails, EventDraft, EventSet};
use crate::guard::DuplicateGuard;
use crate::recurrence::{self, Anchor, Recurrence, Termination};
use crate::time::{ALL_DAY_END, ALL_DAY_START, resolve_local};

/// The time an event occupies, as wall-clock values in the calendar's zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventSpan {
    Timed {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    AllDay {
        date: NaiveDate,
    },
}

/// A request to create one event or one recurring series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub subject: String,
    pub span: EventSpan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
    #[serde(default)]
    pub details: EventDetails,
}

impl CreateRequest {
    /// A single timed event.
    pub fn timed(subject: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            subject: subject.into(),
            span: EventSpan::Timed { start, end },
            recurrence: None,
            details: EventDetails::default(),
        }
    }

    /// A single all-day event.
    pub fn all_day(subject: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            subject: subject.into(),
            span: EventSpan::AllDay { date },
            recurrence: None,
            details: EventDetails::default(),
        }
    }

    /// Builder method to make the request recurring.
    pub fn repeating(mut self, recurrence: Recurrence) -> Self {
        self.recurrence = Some(recurrence);
        self
    }

    /// Builder method to attach details.
    pub fn with_details(mut self, details: EventDetails) -> Self {
        self.details = details;
        self
    }

    /// Returns the strategy this request is handled by.
    pub fn strategy(&self) -> CreateStrategy {
        let termination = self.recurrence.map(|r| r.termination);
        match (&self.span, termination) {
            (EventSpan::Timed { .. }, None) => CreateStrategy::TimedSingle,
            (EventSpan::Timed { .. }, Some(Termination::Times(_))) => CreateStrategy::TimedForCount,
            (EventSpan::Timed { .. }, Some(Termination::Until(_))) => CreateStrategy::TimedUntilDate,
            (EventSpan::AllDay { .. }, None) => CreateStrategy::AllDaySingle,
            (EventSpan::AllDay { .. }, Some(Termination::Times(_))) => {
                CreateStrategy::AllDayForCount
            }
            (EventSpan::AllDay { .. }, Some(Termination::Until(_))) => {
                CreateStrategy::AllDayUntilDate
            }
        }
    }
}

/// The six ways of creating events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateStrategy {
    TimedSingle,
    TimedForCount,
    TimedUntilDate,
    AllDaySingle,
    AllDayForCount,
    AllDayUntilDate,
}

impl fmt::Display for CreateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TimedSingle => "timed",
            Self::TimedForCount => "timed-for-count",
            Self::TimedUntilDate => "timed-until-date",
            Self::AllDaySingle => "all-day",
            Self::AllDayForCount => "all-day-for-count",
            Self::AllDayUntilDate => "all-day-until-date",
        };
        f.write_str(name)
    }
}

/// Builds the events a request describes and checks them against
/// `existing`.
///
/// Returns the new events in chronological order; the caller commits them.
pub fn create(request: &CreateRequest, existing: &EventSet, tz: Tz) -> CalendarResult<Vec<Event>> {
    let strategy = request.strategy();
    debug!(subject = %request.subject, strategy = %strategy, "Creating events");

    let candidates = match (request.span, &request.recurrence) {
        (EventSpan::Timed { start, end }, None) => vec![single(request, start, end, tz)?],
        (EventSpan::AllDay { date }, None) => vec![single(
            request,
            date.and_time(ALL_DAY_START),
            date.and_time(ALL_DAY_END),
            tz,
        )?],
        (EventSpan::Timed { start, end }, Some(recurrence)) => {
            let anchor = Anchor::timed(&request.subject, start, end)?;
            recurrence::expand(&request.subject, &request.details, anchor, recurrence, tz)?
        }
        (EventSpan::AllDay { date }, Some(recurrence)) => recurrence::expand(
            &request.subject,
            &request.details,
            Anchor::all_day(date),
            recurrence,
            tz,
        )?,
    };

    let mut guard = DuplicateGuard::new(existing);
    for candidate in candidates {
        guard.admit(candidate);
    }
    guard.finish().inspect_err(|err| {
        warn!(subject = %request.subject, strategy = %strategy, error = %err, "Create rejected");
    })
}

fn single(
    request: &CreateRequest,
    start: NaiveDateTime,
    end: NaiveDateTime,
    tz: Tz,
) -> CalendarResult<Event> {
    let mut violations = Violations::new();
    let start = resolve_local(start, tz).map_err(|v| violations.push(v)).ok();
    let end = resolve_local(end, tz).map_err(|v| violations.push(v)).ok();
    match (start, end) {
        (Some(start), Some(end)) => EventDraft::new(request.subject.as_str(), start, end)
            .with_details(&request.details)
            .build(),
        _ => Err(violations.into()),
    }
}
