//! Calendar export to CSV and iCalendar files.
//!
//! The CSV layout follows the Google Calendar import columns. The `.ics`
//! output has one VEVENT per event with times in UTC.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use eventcal_core::{CalendarError, Event, EventStatus};
use icalendar::{Component, EventLike, Property, ValueType};
use serde::Serialize;
use tracing::info;

use crate::error::CliResult;

const CSV_HEADERS: [&str; 9] = [
    "Subject",
    "Start Date",
    "Start Time",
    "End Date",
    "End Time",
    "All Day Event",
    "Description",
    "Location",
    "Private",
];

const CSV_DATE: &str = "%m/%d/%Y";
const CSV_TIME: &str = "%I:%M %p";
const ICS_DATE: &str = "%Y%m%d";
const ICS_DATE_TIME: &str = "%Y%m%dT%H%M%SZ";

/// File format of an export, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Ics,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> CliResult<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("ics") => Ok(Self::Ics),
            _ => Err(CalendarError::unsupported("export format", path.display().to_string()).into()),
        }
    }
}

/// Writes `events` to `path` and returns the absolute path of the file.
pub fn export(calendar_name: &str, events: &[Event], path: &Path) -> CliResult<PathBuf> {
    let format = ExportFormat::from_path(path)?;
    let file = File::create(path)?;
    match format {
        ExportFormat::Csv => write_csv(events, file)?,
        ExportFormat::Ics => write_ics(calendar_name, events, file)?,
    }
    let written = std::fs::canonicalize(path)?;
    info!(
        calendar = %calendar_name,
        path = %written.display(),
        count = events.len(),
        "Exported calendar"
    );
    Ok(written)
}

#[derive(Serialize)]
struct CsvRow<'a> {
    subject: &'a str,
    start_date: String,
    start_time: String,
    end_date: String,
    end_time: String,
    all_day: &'static str,
    description: &'a str,
    location: &'a str,
    private: &'static str,
}

impl<'a> CsvRow<'a> {
    fn new(event: &'a Event) -> Self {
        let all_day = event.is_all_day();
        let time = |t: &chrono::DateTime<chrono_tz::Tz>| {
            if all_day {
                String::new()
            } else {
                t.format(CSV_TIME).to_string()
            }
        };
        Self {
            subject: event.subject(),
            start_date: event.start().format(CSV_DATE).to_string(),
            start_time: time(event.start()),
            end_date: event.end().format(CSV_DATE).to_string(),
            end_time: time(event.end()),
            all_day: if all_day { "True" } else { "False" },
            description: event.description(),
            location: event.location(),
            private: "False",
        }
    }
}

/// Writes events as Google Calendar CSV.
pub fn write_csv<W: io::Write>(events: &[Event], out: W) -> CliResult<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);
    writer.write_record(CSV_HEADERS)?;
    for event in events {
        writer.serialize(CsvRow::new(event))?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes events as an iCalendar document.
pub fn write_ics<W: io::Write>(calendar_name: &str, events: &[Event], mut out: W) -> CliResult<()> {
    out.write_all(ics_document(calendar_name, events).as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Builds the iCalendar text for a set of events.
pub fn ics_document(calendar_name: &str, events: &[Event]) -> String {
    let mut calendar = icalendar::Calendar::new();
    calendar.append_property(Property::new("X-WR-CALNAME", calendar_name));
    for (index, event) in events.iter().enumerate() {
        calendar.push(ics_event(index, event));
    }
    calendar.done().to_string()
}

fn ics_event(index: usize, event: &Event) -> icalendar::Event {
    let start = event.start().with_timezone(&Utc);
    let mut ics = icalendar::Event::new();
    ics.uid(&format!("{}-{}@eventcal", start.format(ICS_DATE_TIME), index));
    ics.summary(event.subject());

    if event.is_all_day() {
        let mut dtstart = Property::new("DTSTART", event.start().format(ICS_DATE).to_string());
        dtstart.append_parameter(ValueType::Date);
        ics.append_property(dtstart);
        let next_day = event.start().date_naive() + chrono::Days::new(1);
        let mut dtend = Property::new("DTEND", next_day.format(ICS_DATE).to_string());
        dtend.append_parameter(ValueType::Date);
        ics.append_property(dtend);
    } else {
        ics.add_property("DTSTART", start.format(ICS_DATE_TIME).to_string());
        let end = event.end().with_timezone(&Utc);
        ics.add_property("DTEND", end.format(ICS_DATE_TIME).to_string());
    }

    if !event.description().is_empty() {
        ics.description(event.description());
    }
    if !event.location().is_empty() {
        ics.location(event.location());
    }
    let status = match event.status() {
        EventStatus::Confirmed => "CONFIRMED",
        EventStatus::Tentative => "TENTATIVE",
        EventStatus::Cancelled => "CANCELLED",
    };
    ics.add_property("STATUS", status);
    ics.done()
}
