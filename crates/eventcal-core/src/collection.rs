//! Named calendars and the active-calendar pointer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::calendar::Calendar;
use crate::copy::{self, CopyRequest};
use crate::error::{CalendarError, CalendarResult, Violation};
use crate::event::Event;
use crate::request::{Outcome, Request};
use crate::time::parse_timezone;

/// An editable calendar property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarProperty {
    Name,
    Timezone,
}

impl fmt::Display for CalendarProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Timezone => f.write_str("timezone"),
        }
    }
}

impl FromStr for CalendarProperty {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "timezone" => Ok(Self::Timezone),
            _ => Err(CalendarError::unsupported("calendar property", s)),
        }
    }
}

/// Every calendar of a session, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct CalendarCollection {
    calendars: BTreeMap<String, Calendar>,
    active: Option<String>,
}

impl CalendarCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }

    /// Calendars in name order.
    pub fn calendars(&self) -> impl Iterator<Item = &Calendar> {
        self.calendars.values()
    }

    pub fn calendar(&self, name: &str) -> CalendarResult<&Calendar> {
        self.calendars
            .get(name)
            .ok_or_else(|| CalendarError::not_found("calendar", name))
    }

    fn calendar_mut(&mut self, name: &str) -> CalendarResult<&mut Calendar> {
        self.calendars
            .get_mut(name)
            .ok_or_else(|| CalendarError::not_found("calendar", name))
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// The calendar event operations apply to.
    pub fn active(&self) -> CalendarResult<&Calendar> {
        let name = self.active_name().ok_or_else(no_active_calendar)?;
        self.calendar(name)
    }

    pub fn active_mut(&mut self) -> CalendarResult<&mut Calendar> {
        let name = self.active.clone().ok_or_else(no_active_calendar)?;
        self.calendar_mut(&name)
    }

    pub fn create_calendar(&mut self, name: &str, timezone: Tz) -> CalendarResult<&Calendar> {
        let name = validate_name(name)?;
        if self.calendars.contains_key(name) {
            return Err(CalendarError::naming_conflict(name));
        }
        info!(calendar = %name, timezone = %timezone, "Calendar created");
        Ok(self
            .calendars
            .entry(name.to_string())
            .or_insert_with(|| Calendar::new(name, timezone)))
    }

    /// Renames a calendar or changes its timezone.
    ///
    /// A rename keeps the calendar active if it was. A timezone change only
    /// affects how later requests read wall-clock times.
    pub fn edit_calendar(
        &mut self,
        name: &str,
        property: CalendarProperty,
        value: &str,
    ) -> CalendarResult<&Calendar> {
        self.calendar(name)?;
        match property {
            CalendarProperty::Name => {
                let new_name = validate_name(value)?;
                if new_name == name {
                    return self.calendar(name);
                }
                if self.calendars.contains_key(new_name) {
                    return Err(CalendarError::naming_conflict(new_name));
                }
                let mut calendar = self
                    .calendars
                    .remove(name)
                    .ok_or_else(|| CalendarError::not_found("calendar", name))?;
                calendar.rename(new_name);
                self.calendars.insert(new_name.to_string(), calendar);
                if self.active.as_deref() == Some(name) {
                    self.active = Some(new_name.to_string());
                }
                info!(from = %name, to = %new_name, "Calendar renamed");
                self.calendar(new_name)
            }
            CalendarProperty::Timezone => {
                let timezone = parse_timezone(value)?;
                self.calendar_mut(name)?.set_timezone(timezone);
                info!(calendar = %name, timezone = %timezone, "Calendar timezone changed");
                self.calendar(name)
            }
        }
    }

    pub fn use_calendar(&mut self, name: &str) -> CalendarResult<&Calendar> {
        self.calendar(name)?;
        self.active = Some(name.to_string());
        debug!(calendar = %name, "Calendar in use");
        self.calendar(name)
    }

    /// Copies from the active calendar into the request's target calendar.
    pub fn copy(&mut self, request: &CopyRequest) -> CalendarResult<Vec<Event>> {
        let target_name = request.target_calendar();
        let copies = {
            let source = self.active()?.view();
            let target = self.calendar(target_name)?.view();
            copy::copy(request, source, target)?
        };
        let target = self.calendar_mut(target_name)?;
        target.commit(copies.clone());
        info!(calendar = %target_name, count = copies.len(), "Events copied");
        Ok(copies)
    }

    /// Runs one structured request.
    pub fn execute(&mut self, request: Request) -> CalendarResult<Outcome> {
        if request.is_read_only() {
            trace!(op = request.name(), "Executing query");
        } else {
            debug!(op = request.name(), "Executing request");
        }
        let outcome: Outcome = match request {
            Request::CreateCalendar { name, timezone } => {
                self.create_calendar(&name, timezone)?;
                Outcome::CalendarCreated { name, timezone }
            }
            Request::EditCalendar {
                name,
                property,
                value,
            } => {
                let calendar = self.edit_calendar(&name, property, &value)?;
                Outcome::CalendarEdited {
                    name: calendar.name().to_string(),
                }
            }
            Request::UseCalendar { name } => {
                self.use_calendar(&name)?;
                Outcome::CalendarSelected { name }
            }
            Request::CreateEvent(create) => Outcome::EventsCreated {
                events: self.active_mut()?.create_events(&create)?,
            },
            Request::EditEvent(edit) => Outcome::EventsEdited {
                events: self.active_mut()?.edit_events(&edit)?,
            },
            Request::DeleteEvent(delete) => Outcome::EventsDeleted {
                events: self.active_mut()?.delete_events(&delete)?,
            },
            Request::CopyEvents(copy) => {
                let events = self.copy(&copy)?;
                Outcome::EventsCopied {
                    calendar: copy.target_calendar().to_string(),
                    events,
                }
            }
            Request::Query(query) => self.active()?.query(&query)?.into(),
        };
        Ok(outcome)
    }
}

fn no_active_calendar() -> CalendarError {
    CalendarError::not_found("calendar", "no calendar in use")
}

fn validate_name(name: &str) -> CalendarResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Violation::InvalidValue {
            field: "calendar name",
            value: name.to_string(),
        }
        .into());
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create::CreateRequest;
    use crate::error::ErrorKind;
    use crate::query::{Availability, Query};
    use chrono::{NaiveDate, NaiveDateTime};

    const NY: Tz = Tz::America__New_York;
    const LONDON: Tz = Tz::Europe__London;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        date(d).and_hms_opt(h, m, 0).unwrap()
    }

    fn collection() -> CalendarCollection {
        let mut calendars = CalendarCollection::new();
        calendars.create_calendar("work", NY).unwrap();
        calendars.create_calendar("home", LONDON).unwrap();
        calendars.use_calendar("work").unwrap();
        calendars
    }

    mod calendars {
        use super::*;

        #[test]
        fn names_are_unique() {
            let mut calendars = collection();
            let err = calendars.create_calendar("work", LONDON).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NamingConflict);
            assert_eq!(calendars.len(), 2);
        }

        #[test]
        fn blank_name_is_invalid() {
            let mut calendars = CalendarCollection::new();
            let err = calendars.create_calendar("  ", NY).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }

        #[test]
        fn rename_rekeys_and_keeps_active() {
            let mut calendars = collection();
            calendars
                .edit_calendar("work", CalendarProperty::Name, "office")
                .unwrap();
            assert!(calendars.calendar("work").is_err());
            assert_eq!(calendars.active_name(), Some("office"));
            assert_eq!(calendars.active().unwrap().name(), "office");
        }

        #[test]
        fn rename_onto_existing_name_conflicts() {
            let mut calendars = collection();
            let err = calendars
                .edit_calendar("work", CalendarProperty::Name, "home")
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NamingConflict);
            assert!(calendars.calendar("work").is_ok());
        }

        #[test]
        fn timezone_edit_validates_zone() {
            let mut calendars = collection();
            calendars
                .edit_calendar("work", CalendarProperty::Timezone, "Asia/Tokyo")
                .unwrap();
            assert_eq!(calendars.calendar("work").unwrap().timezone(), Tz::Asia__Tokyo);

            let err = calendars
                .edit_calendar("work", CalendarProperty::Timezone, "Nowhere/Land")
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }

        #[test]
        fn unknown_calendar_or_property() {
            let mut calendars = collection();
            assert_eq!(
                calendars.use_calendar("gym").unwrap_err().kind(),
                ErrorKind::NotFound
            );
            assert_eq!(
                "colour".parse::<CalendarProperty>().unwrap_err().kind(),
                ErrorKind::Unsupported
            );
        }

        #[test]
        fn event_operations_need_an_active_calendar() {
            let mut calendars = CalendarCollection::new();
            calendars.create_calendar("work", NY).unwrap();
            let err = calendars
                .execute(Request::CreateEvent(CreateRequest::all_day("Holiday", date(5))))
                .unwrap_err();
            assert_eq!(err.to_string(), "calendar not found: no calendar in use");
        }
    }

    mod execute {
        use super::*;

        #[test]
        fn create_then_query() {
            let mut calendars = collection();
            let outcome = calendars
                .execute(Request::CreateEvent(CreateRequest::timed(
                    "Standup",
                    at(5, 9, 0),
                    at(5, 9, 15),
                )))
                .unwrap();
            assert!(matches!(outcome, Outcome::EventsCreated { ref events } if events.len() == 1));

            let outcome = calendars
                .execute(Request::Query(Query::StatusAt { at: at(5, 9, 5) }))
                .unwrap();
            assert_eq!(
                outcome,
                Outcome::Status {
                    availability: Availability::Busy
                }
            );
        }

        #[test]
        fn copy_commits_into_target_only() {
            let mut calendars = collection();
            calendars
                .execute(Request::CreateEvent(CreateRequest::timed(
                    "Standup",
                    at(5, 9, 0),
                    at(5, 9, 15),
                )))
                .unwrap();

            let request = CopyRequest::OnDate {
                date: date(5),
                target_calendar: "home".to_string(),
                target_date: date(6),
            };
            let outcome = calendars.execute(Request::CopyEvents(request.clone())).unwrap();
            assert!(matches!(outcome, Outcome::EventsCopied { ref calendar, .. } if calendar == "home"));
            assert_eq!(calendars.calendar("home").unwrap().len(), 1);
            assert_eq!(calendars.calendar("work").unwrap().len(), 1);

            let home = calendars.calendar("home").unwrap();
            let copied = home.events().iter().next().unwrap();
            assert_eq!(copied.start().naive_local(), at(6, 14, 0));

            // Copying the same day again collides with the first copy.
            let err = calendars.execute(Request::CopyEvents(request)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Duplicate);
            assert_eq!(calendars.calendar("home").unwrap().len(), 1);
        }

        #[test]
        fn copy_to_unknown_calendar_is_not_found() {
            let mut calendars = collection();
            let request = CopyRequest::OnDate {
                date: date(5),
                target_calendar: "gym".to_string(),
                target_date: date(6),
            };
            let err = calendars.execute(Request::CopyEvents(request)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);
        }

        #[test]
        fn edit_calendar_reports_new_name() {
            let mut calendars = collection();
            let outcome = calendars
                .execute(Request::EditCalendar {
                    name: "home".to_string(),
                    property: CalendarProperty::Name,
                    value: "house".to_string(),
                })
                .unwrap();
            assert_eq!(
                outcome,
                Outcome::CalendarEdited {
                    name: "house".to_string()
                }
            );
        }
    }
}
