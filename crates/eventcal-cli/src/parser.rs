//! Command-language parser.
//!
//! One command per line. Subjects and values containing spaces are wrapped
//! in double quotes; dates are `YYYY-MM-DD`, date-times `YYYY-MM-DDThh:mm`,
//! weekdays the letters `MTWRFSU`. Blank lines and lines starting with `#`
//! are ignored.

use std::path::PathBuf;

use eventcal_core::{
    CopyRequest, CreateRequest, DeleteRequest, EditRequest, EditScope, EventDetails,
    EventLocator, EventProperty, EventSpan, PropertyEdit, Query, Recurrence, Request, Violation,
    Weekdays, parse_date, parse_date_time, parse_timezone,
};

use crate::error::{CliError, CliResult};

/// A parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A request for the calendar collection.
    Core(Request),
    /// Write the active calendar to a file.
    Export { file: PathBuf },
    /// End the session.
    Exit,
}

/// Parses one line. Returns `None` for blank lines and comments.
pub fn parse_line(line: &str) -> CliResult<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let tokens = tokenize(line)?;
    let words: Vec<&str> = tokens.iter().map(String::as_str).collect();
    LineParser { line }.command(&words).map(Some)
}

/// Splits a line on whitespace, keeping double-quoted runs together.
pub fn tokenize(line: &str) -> CliResult<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;

    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quoted {
        return Err(CliError::parse(line, "unterminated quote"));
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

struct LineParser<'a> {
    line: &'a str,
}

impl LineParser<'_> {
    fn fail(&self, reason: impl Into<String>) -> CliError {
        CliError::parse(self.line, reason)
    }

    fn command(&self, words: &[&str]) -> CliResult<Command> {
        let request = match words {
            ["exit"] => return Ok(Command::Exit),
            ["export", "cal", file] => {
                return Ok(Command::Export {
                    file: PathBuf::from(file),
                });
            }
            ["create", "calendar", "--name", name, "--timezone", zone] => Request::CreateCalendar {
                name: name.to_string(),
                timezone: parse_timezone(zone)?,
            },
            ["edit", "calendar", "--name", name, "--property", property, value] => {
                Request::EditCalendar {
                    name: name.to_string(),
                    property: property.parse()?,
                    value: value.to_string(),
                }
            }
            ["use", "calendar", "--name", name] => Request::UseCalendar {
                name: name.to_string(),
            },
            ["create", "event", subject, rest @ ..] => {
                Request::CreateEvent(self.create_event(subject, rest)?)
            }
            ["edit", scope @ ("event" | "events" | "series"), property, subject, rest @ ..] => {
                Request::EditEvent(self.edit_event(scope, property, subject, rest)?)
            }
            ["delete", scope @ ("event" | "events" | "series"), subject, rest @ ..] => {
                Request::DeleteEvent(DeleteRequest {
                    scope: scope.parse()?,
                    target: self.locator(subject, rest)?,
                })
            }
            ["print", "events", "on", date] => Request::Query(Query::OnDate {
                date: parse_date(date)?,
            }),
            ["print", "events", "from", start, "to", end] => Request::Query(Query::Between {
                start: parse_date_time(start)?,
                end: parse_date_time(end)?,
            }),
            ["show", "status", "on", at] => Request::Query(Query::StatusAt {
                at: parse_date_time(at)?,
            }),
            ["copy", "event", subject, "on", start, "--target", calendar, "to", target] => {
                Request::CopyEvents(CopyRequest::Event {
                    subject: subject.to_string(),
                    start: parse_date_time(start)?,
                    target_calendar: calendar.to_string(),
                    target_start: parse_date_time(target)?,
                })
            }
            ["copy", "events", "on", date, "--target", calendar, "to", target] => {
                Request::CopyEvents(CopyRequest::OnDate {
                    date: parse_date(date)?,
                    target_calendar: calendar.to_string(),
                    target_date: parse_date(target)?,
                })
            }
            [
                "copy",
                "events",
                "between",
                from,
                "and",
                to,
                "--target",
                calendar,
                "to",
                target,
            ] => Request::CopyEvents(CopyRequest::Between {
                from: parse_date(from)?,
                to: parse_date(to)?,
                target_calendar: calendar.to_string(),
                target_date: parse_date(target)?,
            }),
            _ => return Err(self.fail("unrecognised command")),
        };
        Ok(Command::Core(request))
    }

    fn create_event(&self, subject: &str, rest: &[&str]) -> CliResult<CreateRequest> {
        let (span, tail) = match rest {
            ["from", start, "to", end, tail @ ..] => (
                EventSpan::Timed {
                    start: parse_date_time(start)?,
                    end: parse_date_time(end)?,
                },
                tail,
            ),
            ["on", date, tail @ ..] => (
                EventSpan::AllDay {
                    date: parse_date(date)?,
                },
                tail,
            ),
            _ => return Err(self.fail("expected 'from <start> to <end>' or 'on <date>'")),
        };

        let (recurrence, options) = match tail {
            ["repeats", days, "for", count, "times", options @ ..] => {
                let weekdays: Weekdays = days.parse()?;
                let count = count.parse::<u32>().map_err(|_| Violation::InvalidValue {
                    field: "repeat count",
                    value: count.to_string(),
                })?;
                (Some(Recurrence::times(weekdays, count)), options)
            }
            ["repeats", days, "until", last, options @ ..] => {
                let weekdays: Weekdays = days.parse()?;
                (Some(Recurrence::until(weekdays, parse_date(last)?)), options)
            }
            ["repeats", ..] => {
                return Err(self.fail("expected 'repeats <days> for <N> times' or 'repeats <days> until <date>'"));
            }
            options => (None, options),
        };

        Ok(CreateRequest {
            subject: subject.to_string(),
            span,
            recurrence,
            details: self.details(options)?,
        })
    }

    fn details(&self, mut options: &[&str]) -> CliResult<EventDetails> {
        let mut details = EventDetails::default();
        loop {
            options = match options {
                [] => return Ok(details),
                ["--description", value, rest @ ..] => {
                    details.description = value.to_string();
                    rest
                }
                ["--location", value, rest @ ..] => {
                    details.location = value.to_string();
                    rest
                }
                ["--status", value, rest @ ..] => {
                    details.status = value.parse()?;
                    rest
                }
                [option, ..] => return Err(self.fail(format!("unexpected '{}'", option))),
            };
        }
    }

    fn edit_event(
        &self,
        scope: &str,
        property: &str,
        subject: &str,
        rest: &[&str],
    ) -> CliResult<EditRequest> {
        let Some(with) = rest.iter().position(|w| *w == "with") else {
            return Err(self.fail("expected 'with <value>'"));
        };
        let (locator, value) = rest.split_at(with);
        let value = &value[1..];
        if value.is_empty() {
            return Err(self.fail("missing value after 'with'"));
        }
        let property: EventProperty = property.parse()?;
        Ok(EditRequest {
            scope: scope.parse()?,
            target: self.locator(subject, locator)?,
            edits: vec![PropertyEdit::new(property, value.join(" "))],
        })
    }

    fn locator(&self, subject: &str, rest: &[&str]) -> CliResult<EventLocator> {
        match rest {
            ["from", start] => Ok(EventLocator::new(subject, parse_date_time(start)?)),
            ["from", start, "to", end] => {
                Ok(EventLocator::new(subject, parse_date_time(start)?).ending(parse_date_time(end)?))
            }
            _ => Err(self.fail("expected 'from <start>' or 'from <start> to <end>'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use chrono_tz::Tz;
    use eventcal_core::{CalendarError, CalendarProperty, ErrorKind, EventStatus, Termination};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    fn request(line: &str) -> Request {
        match parse_line(line).unwrap() {
            Some(Command::Core(request)) => request,
            other => panic!("expected a request, got {:?}", other),
        }
    }

    fn kind(line: &str) -> Option<ErrorKind> {
        match parse_line(line).unwrap_err() {
            CliError::Calendar(err) => Some(err.kind()),
            _ => None,
        }
    }

    mod tokenizing {
        use super::*;

        #[test]
        fn splits_on_whitespace() {
            assert_eq!(
                tokenize("print  events\ton 2025-05-05").unwrap(),
                vec!["print", "events", "on", "2025-05-05"]
            );
        }

        #[test]
        fn keeps_quoted_runs() {
            assert_eq!(
                tokenize(r#"create event "Team sync" on 2025-05-05"#).unwrap(),
                vec!["create", "event", "Team sync", "on", "2025-05-05"]
            );
        }

        #[test]
        fn empty_quotes_are_a_token() {
            assert_eq!(tokenize(r#"a "" b"#).unwrap(), vec!["a", "", "b"]);
        }

        #[test]
        fn unterminated_quote_is_rejected() {
            let err = tokenize(r#"create event "Team sync on 2025-05-05"#).unwrap_err();
            assert!(err.to_string().ends_with("unterminated quote"));
        }
    }

    mod calendars {
        use super::*;

        #[test]
        fn create_calendar() {
            assert_eq!(
                request("create calendar --name work --timezone America/New_York"),
                Request::CreateCalendar {
                    name: "work".to_string(),
                    timezone: Tz::America__New_York,
                }
            );
        }

        #[test]
        fn unknown_timezone_is_a_validation_error() {
            assert_eq!(
                kind("create calendar --name work --timezone Mars/Olympus"),
                Some(ErrorKind::Validation)
            );
        }

        #[test]
        fn edit_calendar() {
            assert_eq!(
                request("edit calendar --name work --property timezone Europe/Paris"),
                Request::EditCalendar {
                    name: "work".to_string(),
                    property: CalendarProperty::Timezone,
                    value: "Europe/Paris".to_string(),
                }
            );
        }

        #[test]
        fn unknown_calendar_property_is_unsupported() {
            assert_eq!(
                kind("edit calendar --name work --property colour red"),
                Some(ErrorKind::Unsupported)
            );
        }

        #[test]
        fn use_calendar() {
            assert_eq!(
                request(r#"use calendar --name "my work""#),
                Request::UseCalendar {
                    name: "my work".to_string(),
                }
            );
        }
    }

    mod creating {
        use super::*;

        fn create(line: &str) -> CreateRequest {
            match request(line) {
                Request::CreateEvent(create) => create,
                other => panic!("expected a create request, got {:?}", other),
            }
        }

        #[test]
        fn timed_event() {
            assert_eq!(
                create(r#"create event "Team sync" from 2025-05-05T10:00 to 2025-05-05T11:00"#),
                CreateRequest::timed("Team sync", at(2025, 5, 5, 10, 0), at(2025, 5, 5, 11, 0))
            );
        }

        #[test]
        fn all_day_event() {
            assert_eq!(
                create("create event Holiday on 2025-07-04"),
                CreateRequest::all_day("Holiday", date(2025, 7, 4))
            );
        }

        #[test]
        fn repeat_count() {
            let request =
                create("create event Gym from 2025-05-05T07:00 to 2025-05-05T08:00 repeats MWF for 6 times");
            let recurrence = request.recurrence.unwrap();
            assert_eq!(recurrence.weekdays.to_string(), "MWF");
            assert_eq!(recurrence.termination, Termination::Times(6));
        }

        #[test]
        fn repeat_until() {
            let request = create("create event Yoga on 2025-05-06 repeats TR until 2025-05-31");
            assert_eq!(
                request.recurrence.unwrap().termination,
                Termination::Until(date(2025, 5, 31))
            );
        }

        #[test]
        fn details() {
            let request = create(
                r#"create event Review on 2025-05-06 --location "Room 4" --status tentative --description "Q2 numbers""#,
            );
            assert_eq!(request.details.location, "Room 4");
            assert_eq!(request.details.description, "Q2 numbers");
            assert_eq!(request.details.status, EventStatus::Tentative);
        }

        #[test]
        fn details_after_repeat_clause() {
            let request =
                create("create event Yoga on 2025-05-06 repeats TR for 2 times --location Studio");
            assert!(request.recurrence.is_some());
            assert_eq!(request.details.location, "Studio");
        }

        #[test]
        fn bad_date_time_is_a_validation_error() {
            assert_eq!(
                kind("create event Gym from 2025-05-05 to 2025-05-05T08:00"),
                Some(ErrorKind::Validation)
            );
        }

        #[test]
        fn bad_weekdays_are_a_validation_error() {
            assert_eq!(
                kind("create event Gym on 2025-05-05 repeats MXF for 3 times"),
                Some(ErrorKind::Validation)
            );
        }

        #[test]
        fn bad_repeat_count_is_a_validation_error() {
            assert_eq!(
                kind("create event Gym on 2025-05-05 repeats MWF for many times"),
                Some(ErrorKind::Validation)
            );
        }

        #[test]
        fn incomplete_repeat_clause_is_a_parse_error() {
            let err = parse_line("create event Gym on 2025-05-05 repeats MWF").unwrap_err();
            assert!(matches!(err, CliError::Parse { .. }));
        }

        #[test]
        fn unknown_option_is_a_parse_error() {
            let err = parse_line("create event Gym on 2025-05-05 --colour red").unwrap_err();
            assert!(err.to_string().contains("unexpected '--colour'"));
        }
    }

    mod editing {
        use super::*;

        fn edit(line: &str) -> EditRequest {
            match request(line) {
                Request::EditEvent(edit) => edit,
                other => panic!("expected an edit request, got {:?}", other),
            }
        }

        #[test]
        fn single_event() {
            let request = edit(
                r#"edit event location Gym from 2025-05-07T07:00 to 2025-05-07T08:00 with "Main hall""#,
            );
            assert_eq!(request.scope, EditScope::Single);
            assert_eq!(
                request.target,
                EventLocator::new("Gym", at(2025, 5, 7, 7, 0)).ending(at(2025, 5, 7, 8, 0))
            );
            assert_eq!(
                request.edits,
                vec![PropertyEdit::new(EventProperty::Location, "Main hall")]
            );
        }

        #[test]
        fn forward_and_series() {
            let forward = edit("edit events subject Gym from 2025-05-07T07:00 with Swim");
            assert_eq!(forward.scope, EditScope::Forward);
            assert_eq!(forward.target, EventLocator::new("Gym", at(2025, 5, 7, 7, 0)));

            let series = edit("edit series start Gym from 2025-05-07T07:00 with 2025-05-07T06:30");
            assert_eq!(series.scope, EditScope::Series);
            assert_eq!(series.edits[0].property, EventProperty::Start);
        }

        #[test]
        fn unquoted_value_words_are_joined() {
            let request = edit("edit event description Gym from 2025-05-07T07:00 with bring a towel");
            assert_eq!(request.edits[0].value, "bring a towel");
        }

        #[test]
        fn unknown_property_is_unsupported() {
            assert_eq!(
                kind("edit event colour Gym from 2025-05-07T07:00 with red"),
                Some(ErrorKind::Unsupported)
            );
        }

        #[test]
        fn missing_value_is_a_parse_error() {
            let err = parse_line("edit event subject Gym from 2025-05-07T07:00 with").unwrap_err();
            assert!(matches!(err, CliError::Parse { .. }));
        }
    }

    mod other_commands {
        use super::*;

        #[test]
        fn delete() {
            assert_eq!(
                request("delete series Gym from 2025-05-07T07:00"),
                Request::DeleteEvent(DeleteRequest {
                    scope: EditScope::Series,
                    target: EventLocator::new("Gym", at(2025, 5, 7, 7, 0)),
                })
            );
        }

        #[test]
        fn queries() {
            assert_eq!(
                request("print events on 2025-05-05"),
                Request::Query(Query::OnDate {
                    date: date(2025, 5, 5)
                })
            );
            assert_eq!(
                request("print events from 2025-05-05T09:00 to 2025-05-06T09:00"),
                Request::Query(Query::Between {
                    start: at(2025, 5, 5, 9, 0),
                    end: at(2025, 5, 6, 9, 0),
                })
            );
            assert_eq!(
                request("show status on 2025-05-05T09:30"),
                Request::Query(Query::StatusAt {
                    at: at(2025, 5, 5, 9, 30)
                })
            );
        }

        #[test]
        fn copies() {
            assert_eq!(
                request("copy event Standup on 2025-05-05T09:00 --target london to 2025-05-06T14:00"),
                Request::CopyEvents(CopyRequest::Event {
                    subject: "Standup".to_string(),
                    start: at(2025, 5, 5, 9, 0),
                    target_calendar: "london".to_string(),
                    target_start: at(2025, 5, 6, 14, 0),
                })
            );
            assert_eq!(
                request("copy events on 2025-05-05 --target london to 2025-05-12"),
                Request::CopyEvents(CopyRequest::OnDate {
                    date: date(2025, 5, 5),
                    target_calendar: "london".to_string(),
                    target_date: date(2025, 5, 12),
                })
            );
            assert_eq!(
                request("copy events between 2025-05-05 and 2025-05-09 --target london to 2025-06-02"),
                Request::CopyEvents(CopyRequest::Between {
                    from: date(2025, 5, 5),
                    to: date(2025, 5, 9),
                    target_calendar: "london".to_string(),
                    target_date: date(2025, 6, 2),
                })
            );
        }

        #[test]
        fn export_and_exit() {
            assert_eq!(
                parse_line("export cal out.ics").unwrap(),
                Some(Command::Export {
                    file: PathBuf::from("out.ics")
                })
            );
            assert_eq!(parse_line("  exit ").unwrap(), Some(Command::Exit));
        }

        #[test]
        fn blank_lines_and_comments_are_skipped() {
            assert_eq!(parse_line("   ").unwrap(), None);
            assert_eq!(parse_line("# setup").unwrap(), None);
        }

        #[test]
        fn unknown_command() {
            let err = parse_line("print calendars").unwrap_err();
            assert_eq!(
                err.to_string(),
                "invalid command 'print calendars': unrecognised command"
            );
        }

        #[test]
        fn calendar_errors_keep_their_kind() {
            let err = parse_line("print events on 05/05/2025").unwrap_err();
            assert!(matches!(err, CliError::Calendar(CalendarError::Validation(_))));
        }
    }
}
