//! Core types: events, recurrence, calendars, create/edit/copy/query engines

pub mod calendar;
pub mod collection;
pub mod copy;
pub mod create;
pub mod edit;
pub mod error;
pub mod event;
pub mod guard;
pub mod query;
pub mod recurrence;
pub mod request;
pub mod time;
pub mod tracing;

pub use calendar::{Calendar, CalendarView};
pub use collection::{CalendarCollection, CalendarProperty};
pub use copy::CopyRequest;
pub use create::{CreateRequest, CreateStrategy, EventSpan};
pub use edit::{DeleteRequest, EditRequest, EditScope, EventLocator, PropertyEdit, Replacement};
pub use error::{CalendarError, CalendarResult, ErrorKind, Violation, Violations};
pub use event::{
    Event, EventDetails, EventDraft, EventProperty, EventSet, EventStatus, SeriesId,
};
pub use guard::{DuplicateGuard, would_duplicate};
pub use query::{Availability, Query, QueryResult};
pub use recurrence::{Anchor, Recurrence, Termination, Weekdays};
pub use request::{Outcome, Request};
pub use time::{
    DATE_FORMAT, DATE_TIME_FORMAT, TimeWindow, parse_date, parse_date_time, parse_timezone,
};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
