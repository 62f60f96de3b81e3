//! Structured requests accepted by a
//! [`CalendarCollection`](crate::collection::CalendarCollection), and the
//! outcomes it reports back.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::collection::CalendarProperty;
use crate::copy::CopyRequest;
use crate::create::CreateRequest;
use crate::edit::{DeleteRequest, EditRequest};
use crate::event::Event;
use crate::query::{Availability, Query, QueryResult};

/// One operation against the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateCalendar {
        name: String,
        timezone: Tz,
    },
    EditCalendar {
        name: String,
        property: CalendarProperty,
        value: String,
    },
    UseCalendar {
        name: String,
    },
    CreateEvent(CreateRequest),
    EditEvent(EditRequest),
    DeleteEvent(DeleteRequest),
    CopyEvents(CopyRequest),
    Query(Query),
}

impl Request {
    /// Short operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateCalendar { .. } => "create_calendar",
            Self::EditCalendar { .. } => "edit_calendar",
            Self::UseCalendar { .. } => "use_calendar",
            Self::CreateEvent(_) => "create_event",
            Self::EditEvent(_) => "edit_event",
            Self::DeleteEvent(_) => "delete_event",
            Self::CopyEvents(_) => "copy_events",
            Self::Query(_) => "query",
        }
    }

    /// Returns true for requests that never change state.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Query(_))
    }
}

/// What a successful request did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    CalendarCreated { name: String, timezone: Tz },
    CalendarEdited { name: String },
    CalendarSelected { name: String },
    EventsCreated { events: Vec<Event> },
    EventsEdited { events: Vec<Event> },
    EventsDeleted { events: Vec<Event> },
    EventsCopied { calendar: String, events: Vec<Event> },
    Events { events: Vec<Event> },
    Status { availability: Availability },
}

impl From<QueryResult> for Outcome {
    fn from(result: QueryResult) -> Self {
        match result {
            QueryResult::Events(events) => Self::Events { events },
            QueryResult::Status(availability) => Self::Status { availability },
        }
    }
}
