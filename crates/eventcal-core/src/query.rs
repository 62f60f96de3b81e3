//! Read-only event queries.
//!
//! Every query reduces to a half-open [`TimeWindow`]: an event overlaps the
//! window when it starts before the window ends and ends after the window
//! starts.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::CalendarResult;
use crate::event::{Event, EventSet};
use crate::time::{TimeWindow, resolve_local};

/// A read-only request against one calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    /// Events overlapping one local day.
    OnDate { date: NaiveDate },
    /// Events overlapping `[start, end)`.
    Between {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// Whether any event is in progress at an instant.
    StatusAt { at: NaiveDateTime },
}

/// Busy if any event is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Busy,
    Available,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => f.write_str("busy"),
            Self::Available => f.write_str("available"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum QueryResult {
    Events(Vec<Event>),
    Status(Availability),
}

/// Returns the events overlapping `window`, in set order.
pub fn events_in(events: &EventSet, window: &TimeWindow) -> Vec<Event> {
    events
        .iter()
        .take_while(|e| e.start().with_timezone(&Utc) < window.end)
        .filter(|e| window.overlaps(e.start(), e.end()))
        .cloned()
        .collect()
}

/// Events overlapping a local day in `tz`.
pub fn events_on(events: &EventSet, date: NaiveDate, tz: Tz) -> CalendarResult<Vec<Event>> {
    let window = TimeWindow::for_date(date, tz)?;
    Ok(events_in(events, &window))
}

/// Events overlapping the local interval `[start, end)` in `tz`.
pub fn events_between(
    events: &EventSet,
    start: NaiveDateTime,
    end: NaiveDateTime,
    tz: Tz,
) -> CalendarResult<Vec<Event>> {
    let window = TimeWindow::from_local(start, end, tz)?;
    Ok(events_in(events, &window))
}

/// Availability at an absolute instant.
pub fn availability_at(events: &EventSet, instant: DateTime<Utc>) -> Availability {
    let busy = events
        .iter()
        .take_while(|e| e.start().with_timezone(&Utc) <= instant)
        .any(|e| e.is_active_at(instant));
    if busy {
        Availability::Busy
    } else {
        Availability::Available
    }
}

/// Availability at a local date-time in `tz`.
pub fn status_at(events: &EventSet, at: NaiveDateTime, tz: Tz) -> CalendarResult<Availability> {
    let instant = resolve_local(at, tz)?.with_timezone(&Utc);
    Ok(availability_at(events, instant))
}

/// Runs a query against a calendar's events.
pub fn query(query: &Query, events: &EventSet, tz: Tz) -> CalendarResult<QueryResult> {
    trace!(?query, timezone = %tz, "Running query");
    match *query {
        Query::OnDate { date } => events_on(events, date, tz).map(QueryResult::Events),
        Query::Between { start, end } => {
            events_between(events, start, end, tz).map(QueryResult::Events)
        }
        Query::StatusAt { at } => status_at(events, at, tz).map(QueryResult::Status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const NY: Tz = Tz::America__New_York;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        date(2025, 5, d).and_hms_opt(h, m, 0).unwrap()
    }

    fn event(subject: &str, start: NaiveDateTime, end: NaiveDateTime) -> Event {
        Event::new(
            subject,
            resolve_local(start, NY).unwrap(),
            resolve_local(end, NY).unwrap(),
        )
        .unwrap()
    }

    fn subjects(events: &[Event]) -> Vec<&str> {
        events.iter().map(Event::subject).collect()
    }

    fn sample() -> EventSet {
        [
            event("Late night", at(4, 22, 0), at(5, 0, 0)),
            event("Standup", at(5, 9, 0), at(5, 10, 0)),
            event("Lunch", at(5, 12, 0), at(5, 13, 0)),
            event("Review", at(5, 14, 0), at(5, 15, 0)),
            event("Overnight", at(5, 23, 0), at(6, 1, 0)),
        ]
        .into_iter()
        .collect()
    }

    mod on_date {
        use super::*;

        #[test]
        fn returns_overlapping_events_in_order() {
            let events = events_on(&sample(), date(2025, 5, 5), NY).unwrap();
            assert_eq!(
                subjects(&events),
                vec!["Standup", "Lunch", "Review", "Overnight"]
            );
        }

        #[test]
        fn event_ending_at_midnight_belongs_to_previous_day() {
            let events = events_on(&sample(), date(2025, 5, 4), NY).unwrap();
            assert_eq!(subjects(&events), vec!["Late night"]);
        }

        #[test]
        fn spill_over_is_included_next_day() {
            let events = events_on(&sample(), date(2025, 5, 6), NY).unwrap();
            assert_eq!(subjects(&events), vec!["Overnight"]);
        }

        #[test]
        fn empty_day() {
            assert!(events_on(&sample(), date(2025, 5, 10), NY).unwrap().is_empty());
        }

        #[test]
        fn day_is_read_in_the_requested_zone() {
            // 09:00 New York is 14:00 in London.
            let events = events_on(&sample(), date(2025, 5, 5), Tz::Europe__London).unwrap();
            assert!(subjects(&events).contains(&"Standup"));
            // 22:00-00:00 New York on the 4th is 03:00-05:00 London on the 5th.
            assert!(subjects(&events).contains(&"Late night"));
        }
    }

    mod between {
        use super::*;

        #[test]
        fn boundaries_are_half_open() {
            let events = events_between(&sample(), at(5, 10, 0), at(5, 14, 0), NY).unwrap();
            assert_eq!(subjects(&events), vec!["Lunch"]);
        }

        #[test]
        fn partial_overlap_counts() {
            let events = events_between(&sample(), at(5, 9, 30), at(5, 12, 30), NY).unwrap();
            assert_eq!(subjects(&events), vec!["Standup", "Lunch"]);
        }

        #[test]
        fn reversed_range_is_invalid() {
            let err = events_between(&sample(), at(5, 14, 0), at(5, 10, 0), NY).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    mod status {
        use super::*;

        #[test]
        fn busy_inside_available_at_end() {
            let events = sample();
            assert_eq!(status_at(&events, at(5, 14, 30), NY).unwrap(), Availability::Busy);
            assert_eq!(status_at(&events, at(5, 14, 0), NY).unwrap(), Availability::Busy);
            assert_eq!(status_at(&events, at(5, 15, 0), NY).unwrap(), Availability::Available);
            assert_eq!(status_at(&events, at(5, 11, 0), NY).unwrap(), Availability::Available);
        }

        #[test]
        fn long_event_started_earlier_is_busy() {
            assert_eq!(status_at(&sample(), at(6, 0, 30), NY).unwrap(), Availability::Busy);
        }

        #[test]
        fn nonexistent_local_time_is_invalid() {
            let gap = date(2025, 3, 9).and_hms_opt(2, 30, 0).unwrap();
            assert!(status_at(&sample(), gap, NY).is_err());
        }
    }

    #[test]
    fn dispatch() {
        let events = sample();
        let result = query(&Query::StatusAt { at: at(5, 9, 15) }, &events, NY).unwrap();
        assert_eq!(result, QueryResult::Status(Availability::Busy));

        let result = query(&Query::OnDate { date: date(2025, 5, 4) }, &events, NY).unwrap();
        match result {
            QueryResult::Events(found) => assert_eq!(found.len(), 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn query_serde() {
        let query: Query =
            serde_json::from_str(r#"{"kind":"on_date","date":"2025-05-05"}"#).unwrap();
        assert_eq!(query, Query::OnDate { date: date(2025, 5, 5) });
    }
}
