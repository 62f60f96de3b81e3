//! Editing and deleting events.
//!
//! An edit names an anchor event, a scope and one or more property changes:
//!
//! - [`EditScope::Single`] touches only the anchor.
//! - [`EditScope::Forward`] touches the anchor and every later occurrence of
//!   its series.
//! - [`EditScope::Series`] touches every occurrence of the anchor's series.
//!
//! An anchor that does not belong to a series is always edited alone.
//!
//! All changes for all selected occurrences are resolved and validated before
//! anything is committed. The result is a [`Replacement`]: the events to take
//! out of the calendar and the events to put in their place.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeDelta};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CalendarError, CalendarResult, Violation, Violations};
use crate::event::{Event, EventDraft, EventProperty, EventSet, EventStatus, SeriesId};
use crate::guard::DuplicateGuard;
use crate::time::{DATE_TIME_FORMAT, parse_date_time, resolve_local};

/// Which occurrences an edit or delete applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditScope {
    Single,
    Forward,
    Series,
}

impl fmt::Display for EditScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Single => "single",
            Self::Forward => "forward",
            Self::Series => "series",
        };
        f.write_str(name)
    }
}

impl FromStr for EditScope {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" | "event" => Ok(Self::Single),
            "forward" | "events" => Ok(Self::Forward),
            "series" => Ok(Self::Series),
            _ => Err(CalendarError::unsupported("edit scope", s)),
        }
    }
}

/// Identifies the anchor event by subject and local start, optionally end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLocator {
    pub subject: String,
    pub start: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDateTime>,
}

impl EventLocator {
    pub fn new(subject: impl Into<String>, start: NaiveDateTime) -> Self {
        Self {
            subject: subject.into(),
            start,
            end: None,
        }
    }

    /// Builder method to pin the end time as well.
    pub fn ending(mut self, end: NaiveDateTime) -> Self {
        self.end = Some(end);
        self
    }
}

impl fmt::Display for EventLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' at {}", self.subject, self.start.format(DATE_TIME_FORMAT))?;
        if let Some(end) = self.end {
            write!(f, " to {}", end.format(DATE_TIME_FORMAT))?;
        }
        Ok(())
    }
}

/// One requested property change, value still in text form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyEdit {
    pub property: EventProperty,
    pub value: String,
}

impl PropertyEdit {
    pub fn new(property: EventProperty, value: impl Into<String>) -> Self {
        Self {
            property,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditRequest {
    pub scope: EditScope,
    pub target: EventLocator,
    pub edits: Vec<PropertyEdit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub scope: EditScope,
    pub target: EventLocator,
}

/// Events to take out of a set and the events to put in their place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replacement {
    pub removed: Vec<Event>,
    pub added: Vec<Event>,
}

impl Replacement {
    /// Commits the replacement, removing before inserting.
    pub fn apply(self, events: &mut EventSet) {
        for event in &self.removed {
            events.remove(event);
        }
        events.extend(self.added);
    }
}

/// A property change resolved against the anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Change {
    Subject(String),
    ShiftStart(TimeDelta),
    ShiftEnd(TimeDelta),
    Description(String),
    Location(String),
    Status(EventStatus),
}

/// Finds the single event a locator names.
pub fn locate<'a>(
    existing: &'a EventSet,
    locator: &EventLocator,
    tz: Tz,
) -> CalendarResult<&'a Event> {
    let start = resolve_local(locator.start, tz)?;
    let end = locator.end.map(|end| resolve_local(end, tz)).transpose()?;

    let matches: Vec<&Event> = existing
        .iter()
        .filter(|e| e.subject() == locator.subject && *e.start() == start)
        .filter(|e| end.is_none_or(|end| *e.end() == end))
        .collect();

    match matches.as_slice() {
        [] => Err(CalendarError::not_found("event", locator.to_string())),
        [event] => Ok(*event),
        many => Err(Violation::AmbiguousEvent {
            subject: locator.subject.clone(),
            start: locator.start,
            matches: many.len(),
        }
        .into()),
    }
}

/// Lists the events a scope selects around `anchor`, in set order.
pub fn select(existing: &EventSet, anchor: &Event, scope: EditScope) -> Vec<Event> {
    match (scope, anchor.series_id()) {
        (EditScope::Single, _) | (_, None) => vec![anchor.clone()],
        (EditScope::Forward, Some(id)) => existing
            .iter()
            .filter(|e| e.series_id() == Some(id) && e.start() >= anchor.start())
            .cloned()
            .collect(),
        (EditScope::Series, Some(id)) => existing
            .iter()
            .filter(|e| e.series_id() == Some(id))
            .cloned()
            .collect(),
    }
}

/// Applies the requested changes to the selected occurrences.
///
/// Returns the replacement to commit; the existing set is left untouched.
pub fn edit(request: &EditRequest, existing: &EventSet, tz: Tz) -> CalendarResult<Replacement> {
    if request.edits.is_empty() {
        return Err(Violation::NoChanges.into());
    }
    let anchor = locate(existing, &request.target, tz)?;
    let changes = resolve_changes(&request.edits, anchor, tz)?;
    let selected = select(existing, anchor, request.scope);
    let series_id = series_after_edit(existing, anchor, request.scope);

    debug!(
        anchor = %anchor,
        scope = %request.scope,
        selected = selected.len(),
        changes = changes.len(),
        "Editing events"
    );

    let mut violations = Violations::new();
    let mut drafts = Vec::with_capacity(selected.len());
    for event in &selected {
        match apply_changes(event, &changes, series_id, tz) {
            Ok(draft) => drafts.push(draft),
            Err(found) => violations.extend(found),
        }
    }

    let mut guard = DuplicateGuard::replacing(existing, &selected);
    guard.reject(violations);
    for draft in drafts {
        guard.admit(draft.into_event_unchecked());
    }
    let added = guard.finish().inspect_err(|err| {
        warn!(anchor = %request.target, scope = %request.scope, error = %err, "Edit rejected");
    })?;

    Ok(Replacement {
        removed: selected,
        added,
    })
}

/// Removes the selected occurrences.
pub fn delete(request: &DeleteRequest, existing: &EventSet, tz: Tz) -> CalendarResult<Replacement> {
    let anchor = locate(existing, &request.target, tz)?;
    let removed = select(existing, anchor, request.scope);
    debug!(anchor = %anchor, scope = %request.scope, count = removed.len(), "Deleting events");
    Ok(Replacement {
        removed,
        added: Vec::new(),
    })
}

/// The series id the edited occurrences end up with.
///
/// A forward edit that leaves earlier occurrences behind splits the series.
fn series_after_edit(existing: &EventSet, anchor: &Event, scope: EditScope) -> Option<SeriesId> {
    let current = anchor.series_id();
    match (scope, current) {
        (EditScope::Forward, Some(id)) => {
            let earlier_remain = existing
                .iter()
                .take_while(|e| e.start() < anchor.start())
                .any(|e| e.series_id() == Some(id));
            if earlier_remain {
                Some(SeriesId::new())
            } else {
                current
            }
        }
        _ => current,
    }
}

/// Parses the text values and turns time edits into wall-clock shifts
/// relative to the anchor.
fn resolve_changes(edits: &[PropertyEdit], anchor: &Event, tz: Tz) -> Result<Vec<Change>, Violations> {
    let mut violations = Violations::new();
    let mut changes = Vec::with_capacity(edits.len());
    for edit in edits {
        let change = match edit.property {
            EventProperty::Subject => Ok(Change::Subject(edit.value.clone())),
            EventProperty::Description => Ok(Change::Description(edit.value.clone())),
            EventProperty::Location => Ok(Change::Location(edit.value.clone())),
            EventProperty::Status => edit.value.parse().map(Change::Status),
            EventProperty::Start => parse_date_time(&edit.value)
                .map(|value| Change::ShiftStart(value - anchor.start().with_timezone(&tz).naive_local())),
            EventProperty::End => parse_date_time(&edit.value)
                .map(|value| Change::ShiftEnd(value - anchor.end().with_timezone(&tz).naive_local())),
        };
        match change {
            Ok(change) => changes.push(change),
            Err(violation) => violations.push(violation),
        }
    }
    if violations.is_empty() {
        Ok(changes)
    } else {
        Err(violations)
    }
}

/// Builds the proposed replacement for one occurrence.
fn apply_changes(
    event: &Event,
    changes: &[Change],
    series_id: Option<SeriesId>,
    tz: Tz,
) -> Result<EventDraft, Violations> {
    let mut violations = Violations::new();
    let mut draft = event.draft().with_series(series_id);
    for change in changes {
        match change {
            Change::Subject(subject) => draft.subject = subject.clone(),
            Change::Description(text) => draft.description = text.clone(),
            Change::Location(text) => draft.location = text.clone(),
            Change::Status(status) => draft.status = *status,
            Change::ShiftStart(delta) => match shift(&draft.start, *delta, tz) {
                Ok(start) => draft.start = start,
                Err(violation) => violations.push(violation),
            },
            Change::ShiftEnd(delta) => match shift(&draft.end, *delta, tz) {
                Ok(end) => draft.end = end,
                Err(violation) => violations.push(violation),
            },
        }
    }
    violations.extend(draft.violations());
    if violations.is_empty() {
        Ok(draft)
    } else {
        Err(violations)
    }
}

/// Moves an instant's wall-clock time in `tz` by `delta`.
fn shift(instant: &DateTime<Tz>, delta: TimeDelta, tz: Tz) -> Result<DateTime<Tz>, Violation> {
    let local = instant.with_timezone(&tz).naive_local();
    let moved = local
        .checked_add_signed(delta)
        .ok_or_else(|| Violation::InvalidValue {
            field: "date-time",
            value: format!("{} shifted by {}", local.format(DATE_TIME_FORMAT), delta),
        })?;
    resolve_local(moved, tz)
}
