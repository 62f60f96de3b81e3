//! A named calendar and the events it owns.
//!
//! Engines never mutate a calendar themselves: they receive a borrowed
//! [`CalendarView`] and return the events to add or remove. The calendar
//! commits the result only after the engine succeeded.

use chrono_tz::Tz;
use serde::Serialize;
use tracing::info;

use crate::create::{self, CreateRequest};
use crate::edit::{self, DeleteRequest, EditRequest};
use crate::error::CalendarResult;
use crate::event::{Event, EventSet};
use crate::query::{self, Query, QueryResult};

/// Read-only access to one calendar's events and zone for the duration of a
/// single engine call.
#[derive(Debug, Clone, Copy)]
pub struct CalendarView<'a> {
    pub events: &'a EventSet,
    pub timezone: Tz,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Calendar {
    name: String,
    timezone: Tz,
    events: EventSet,
}

impl Calendar {
    pub fn new(name: impl Into<String>, timezone: Tz) -> Self {
        Self {
            name: name.into(),
            timezone,
            events: EventSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn events(&self) -> &EventSet {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn view(&self) -> CalendarView<'_> {
        CalendarView {
            events: &self.events,
            timezone: self.timezone,
        }
    }

    /// Creates one event or series; returns what was added.
    pub fn create_events(&mut self, request: &CreateRequest) -> CalendarResult<Vec<Event>> {
        let created = create::create(request, &self.events, self.timezone)?;
        self.events.extend(created.iter().cloned());
        info!(calendar = %self.name, count = created.len(), "Events created");
        Ok(created)
    }

    /// Edits events; returns the replacements now in the calendar.
    pub fn edit_events(&mut self, request: &EditRequest) -> CalendarResult<Vec<Event>> {
        let replacement = edit::edit(request, &self.events, self.timezone)?;
        let added = replacement.added.clone();
        replacement.apply(&mut self.events);
        info!(calendar = %self.name, count = added.len(), scope = %request.scope, "Events edited");
        Ok(added)
    }

    /// Deletes events; returns what was removed.
    pub fn delete_events(&mut self, request: &DeleteRequest) -> CalendarResult<Vec<Event>> {
        let replacement = edit::delete(request, &self.events, self.timezone)?;
        let removed = replacement.removed.clone();
        replacement.apply(&mut self.events);
        info!(calendar = %self.name, count = removed.len(), scope = %request.scope, "Events deleted");
        Ok(removed)
    }

    pub fn query(&self, request: &Query) -> CalendarResult<QueryResult> {
        query::query(request, &self.events, self.timezone)
    }

    /// Adds events already checked against this calendar.
    pub(crate) fn commit(&mut self, events: Vec<Event>) {
        self.events.extend(events);
    }

    pub(crate) fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Stored events keep their instants and zones.
    pub(crate) fn set_timezone(&mut self, timezone: Tz) {
        self.timezone = timezone;
    }
}
