//! Event types for calendar events.
//!
//! This module provides the core event value and its companions:
//! - [`Event`]: an immutable, validated occurrence
//! - [`EventDraft`]: the proposed field values an event is built from
//! - [`SeriesId`]: the identifier shared by occurrences of one series
//! - [`EventStatus`], [`EventProperty`], [`EventDetails`]
//!
//! Two events are the same event when their subject, start and end match.
//! Series membership, description, location and status do not take part in
//! identity, which is what duplicate detection and lookups rely on.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CalendarError, CalendarResult, Violation, Violations};
use crate::time::{ALL_DAY_END, ALL_DAY_START, format_local};

/// The events of one calendar, ordered by start, end, then subject.
pub type EventSet = BTreeSet<Event>;

/// Identifier grouping the occurrences of one recurring series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesId(Uuid);

impl SeriesId {
    /// Creates a fresh series identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SeriesId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SeriesId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Status of an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Tentative => "tentative",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = Violation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Ok(Self::Confirmed),
            "tentative" => Ok(Self::Tentative),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(Violation::InvalidValue {
                field: "status",
                value: s.to_string(),
            }),
        }
    }
}

/// An editable event property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventProperty {
    Subject,
    Start,
    End,
    Description,
    Location,
    Status,
}

impl EventProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Start => "start",
            Self::End => "end",
            Self::Description => "description",
            Self::Location => "location",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for EventProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventProperty {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "subject" => Ok(Self::Subject),
            "start" => Ok(Self::Start),
            "end" => Ok(Self::End),
            "description" => Ok(Self::Description),
            "location" => Ok(Self::Location),
            "status" => Ok(Self::Status),
            _ => Err(CalendarError::unsupported("event property", s)),
        }
    }
}

/// Optional free-text details attached at creation time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventDetails {
    pub description: String,
    pub location: String,
    pub status: EventStatus,
}

/// Proposed field values for an event, validated as a whole by
/// [`EventDraft::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub subject: String,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
    pub series_id: Option<SeriesId>,
    pub description: String,
    pub location: String,
    pub status: EventStatus,
}

impl EventDraft {
    /// Creates a draft with default details and no series.
    pub fn new(subject: impl Into<String>, start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        Self {
            subject: subject.into(),
            start,
            end,
            series_id: None,
            description: String::new(),
            location: String::new(),
            status: EventStatus::default(),
        }
    }

    /// Builder method to attach details.
    pub fn with_details(mut self, details: &EventDetails) -> Self {
        self.description = details.description.clone();
        self.location = details.location.clone();
        self.status = details.status;
        self
    }

    /// Builder method to set series membership.
    pub fn with_series(mut self, series_id: Option<SeriesId>) -> Self {
        self.series_id = series_id;
        self
    }

    /// Returns true if start and end fall on different local dates.
    pub fn spans_multiple_days(&self) -> bool {
        self.start.date_naive() != self.end.date_naive()
    }

    /// Collects every rule the draft breaks.
    pub fn violations(&self) -> Violations {
        let mut violations = Violations::new();
        if self.subject.trim().is_empty() {
            violations.push(Violation::EmptySubject);
        }
        if self.end <= self.start {
            violations.push(Violation::EndNotAfterStart {
                start: self.start.naive_local(),
                end: self.end.naive_local(),
            });
        }
        if self.series_id.is_some() && self.spans_multiple_days() {
            violations.push(Violation::SpansMultipleDays {
                subject: self.subject.clone(),
                start: self.start.naive_local(),
                end: self.end.naive_local(),
            });
        }
        violations
    }

    /// Validates the draft and turns it into an event.
    pub fn build(self) -> CalendarResult<Event> {
        self.violations().into_result()?;
        Ok(self.into_event_unchecked())
    }

    /// Converts a draft already known to be valid.
    pub(crate) fn into_event_unchecked(self) -> Event {
        Event {
            subject: self.subject,
            start: self.start,
            end: self.end,
            series_id: self.series_id,
            description: self.description,
            location: self.location,
            status: self.status,
        }
    }
}

/// A single calendar occurrence.
///
/// Events are immutable: changing a property means building a new event from
/// [`Event::draft`] and replacing the old one in its [`EventSet`].
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    subject: String,
    start: DateTime<Tz>,
    end: DateTime<Tz>,
    #[serde(skip_serializing_if = "Option::is_none")]
    series_id: Option<SeriesId>,
    description: String,
    location: String,
    status: EventStatus,
}

impl Event {
    /// Creates a validated standalone event with default details.
    pub fn new(
        subject: impl Into<String>,
        start: DateTime<Tz>,
        end: DateTime<Tz>,
    ) -> CalendarResult<Self> {
        EventDraft::new(subject, start, end).build()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn start(&self) -> &DateTime<Tz> {
        &self.start
    }

    pub fn end(&self) -> &DateTime<Tz> {
        &self.end
    }

    pub fn series_id(&self) -> Option<SeriesId> {
        self.series_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    /// Returns true if this event belongs to a series.
    pub fn is_recurring(&self) -> bool {
        self.series_id.is_some()
    }

    /// Returns true if the event covers a whole local day.
    pub fn is_all_day(&self) -> bool {
        self.start.date_naive() == self.end.date_naive()
            && self.start.time() == ALL_DAY_START
            && self.end.time() == ALL_DAY_END
    }

    /// Returns the absolute duration of the event.
    pub fn duration(&self) -> TimeDelta {
        self.end.signed_duration_since(self.start)
    }

    /// Checks if the event is in progress at the given instant.
    ///
    /// The start is inclusive and the end exclusive.
    pub fn is_active_at(&self, instant: DateTime<Utc>) -> bool {
        self.start.with_timezone(&Utc) <= instant && instant < self.end.with_timezone(&Utc)
    }

    /// Returns the proposed values an edited copy starts from.
    pub fn draft(&self) -> EventDraft {
        EventDraft {
            subject: self.subject.clone(),
            start: self.start,
            end: self.end,
            series_id: self.series_id,
            description: self.description.clone(),
            location: self.location.clone(),
            status: self.status,
        }
    }

    /// The violation reported when this event collides with another.
    pub(crate) fn duplicate_violation(&self) -> Violation {
        Violation::Duplicate {
            subject: self.subject.clone(),
            start: self.start.naive_local(),
            end: self.end.naive_local(),
        }
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.subject == other.subject && self.start == other.start && self.end == other.end
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.subject.hash(state);
        self.start.naive_utc().hash(state);
        self.end.naive_utc().hash(state);
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.end.cmp(&other.end))
            .then_with(|| self.subject.cmp(&other.subject))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' from {} to {}",
            self.subject,
            format_local(&self.start),
            format_local(&self.end)
        )
    }
}
