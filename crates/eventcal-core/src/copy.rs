//! Copying events between calendars.
//!
//! Copies are always new events: they never share a series id with their
//! source. Occurrences of one source series copied in the same call get one
//! fresh series id between them, unless the move into the target timezone
//! would make any of them cross midnight, in which case that group is copied
//! as standalone events.
//!
//! A call either copies everything it selects or nothing.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::calendar::CalendarView;
use crate::edit::{EventLocator, locate};
use crate::error::{CalendarResult, Violation, Violations};
use crate::event::{Event, EventDraft, SeriesId};
use crate::guard::DuplicateGuard;
use crate::query::events_in;
use crate::time::{DATE_TIME_FORMAT, TimeWindow, resolve_local};

/// A copy request; the source is the active calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CopyRequest {
    /// Copy one event so it starts at `target_start`, read like `start` in
    /// the source calendar's zone.
    Event {
        subject: String,
        start: NaiveDateTime,
        target_calendar: String,
        target_start: NaiveDateTime,
    },
    /// Copy every event overlapping `date`, moving them to `target_date`.
    OnDate {
        date: NaiveDate,
        target_calendar: String,
        target_date: NaiveDate,
    },
    /// Copy every event overlapping `from..=to`; `from` lands on
    /// `target_date`.
    Between {
        from: NaiveDate,
        to: NaiveDate,
        target_calendar: String,
        target_date: NaiveDate,
    },
}

impl CopyRequest {
    /// Name of the calendar receiving the copies.
    pub fn target_calendar(&self) -> &str {
        match self {
            Self::Event {
                target_calendar, ..
            }
            | Self::OnDate {
                target_calendar, ..
            }
            | Self::Between {
                target_calendar, ..
            } => target_calendar,
        }
    }
}

/// Builds the copies a request describes and checks them against the target.
///
/// Returns the new events; the caller commits them to the target calendar.
pub fn copy(
    request: &CopyRequest,
    source: CalendarView<'_>,
    target: CalendarView<'_>,
) -> CalendarResult<Vec<Event>> {
    let candidates = match request {
        CopyRequest::Event {
            subject,
            start,
            target_start,
            ..
        } => vec![copy_one(subject, *start, *target_start, source, target)?],
        CopyRequest::OnDate {
            date, target_date, ..
        } => copy_range(*date, *date, *target_date, source, target)?,
        CopyRequest::Between {
            from,
            to,
            target_date,
            ..
        } => copy_range(*from, *to, *target_date, source, target)?,
    };

    let count = candidates.len();
    let mut guard = DuplicateGuard::new(target.events);
    for candidate in candidates {
        guard.admit(candidate);
    }
    let copies = guard.finish().inspect_err(|err| {
        warn!(calendar = %request.target_calendar(), error = %err, "Copy rejected");
    })?;
    debug!(calendar = %request.target_calendar(), count, "Copies prepared");
    Ok(copies)
}

fn copy_one(
    subject: &str,
    start: NaiveDateTime,
    target_start: NaiveDateTime,
    source: CalendarView<'_>,
    target: CalendarView<'_>,
) -> CalendarResult<Event> {
    let original = locate(source.events, &EventLocator::new(subject, start), source.timezone)?;
    // Both instants are read in the source zone, then shown in the target's.
    let new_start = resolve_local(target_start, source.timezone)?;
    let new_end = new_start
        .checked_add_signed(original.duration())
        .ok_or_else(|| Violation::InvalidValue {
            field: "date-time",
            value: target_start.format(DATE_TIME_FORMAT).to_string(),
        })?;

    let mut draft = original.draft().with_series(None);
    draft.start = new_start.with_timezone(&target.timezone);
    draft.end = new_end.with_timezone(&target.timezone);
    draft.build()
}

fn copy_range(
    from: NaiveDate,
    to: NaiveDate,
    target_date: NaiveDate,
    source: CalendarView<'_>,
    target: CalendarView<'_>,
) -> CalendarResult<Vec<Event>> {
    let window = TimeWindow::for_dates(from, to, source.timezone)?;
    let selected = events_in(source.events, &window);
    if selected.is_empty() {
        debug!(%from, %to, "Nothing to copy");
        return Ok(Vec::new());
    }
    let shift = TimeDelta::days(target_date.signed_duration_since(from).num_days());

    let mut violations = Violations::new();
    let mut moved: Vec<(Option<SeriesId>, EventDraft)> = Vec::with_capacity(selected.len());
    for event in &selected {
        match retime(event, shift, target.timezone) {
            Ok(draft) => moved.push((event.series_id(), draft)),
            Err(found) => violations.extend(found),
        }
    }
    violations.into_result()?;

    // Source series whose copies would no longer fit within one day.
    let broken: HashSet<SeriesId> = moved
        .iter()
        .filter(|(_, draft)| draft.spans_multiple_days())
        .filter_map(|(series, _)| *series)
        .collect();
    let mut remap: HashMap<SeriesId, SeriesId> = HashMap::new();

    let mut copies = Vec::with_capacity(moved.len());
    for (series, draft) in moved {
        let series = series
            .filter(|id| !broken.contains(id))
            .map(|id| *remap.entry(id).or_default());
        copies.push(draft.with_series(series));
    }
    copies
        .into_iter()
        .map(EventDraft::build)
        .collect::<CalendarResult<Vec<_>>>()
}

/// Re-expresses an event in `tz` and moves it by whole days.
fn retime(event: &Event, shift: TimeDelta, tz: Tz) -> Result<EventDraft, Violations> {
    let moved = |instant: &DateTime<Tz>| {
        let local = instant.with_timezone(&tz).naive_local();
        local
            .checked_add_signed(shift)
            .ok_or_else(|| Violation::InvalidValue {
                field: "date",
                value: local.format(DATE_TIME_FORMAT).to_string(),
            })
            .and_then(|local| resolve_local(local, tz))
    };

    let mut violations = Violations::new();
    let start = moved(event.start()).map_err(|v| violations.push(v)).ok();
    let end = moved(event.end()).map_err(|v| violations.push(v)).ok();
    match (start, end) {
        (Some(start), Some(end)) => {
            let mut draft = event.draft().with_series(None);
            draft.start = start;
            draft.end = end;
            Ok(draft)
        }
        _ => Err(violations),
    }
}
