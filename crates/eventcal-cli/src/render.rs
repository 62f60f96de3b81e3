//! Console output for command outcomes.
//!
//! Text output is meant for people at a prompt; JSON output serialises the
//! [`Outcome`] as-is so scripts can consume headless runs.

use eventcal_core::time::{DATE_FORMAT, format_local};
use eventcal_core::{Event, EventStatus, Outcome};
use serde::{Deserialize, Serialize};

use crate::error::CliResult;

/// How outcomes are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON document per outcome.
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

/// Renders an outcome in the requested format.
pub fn render(outcome: &Outcome, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Text => Ok(render_text(outcome)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(outcome)?),
    }
}

/// Renders an outcome as human-readable text.
pub fn render_text(outcome: &Outcome) -> String {
    match outcome {
        Outcome::CalendarCreated { name, timezone } => {
            format!("Created calendar '{}' ({})", name, timezone)
        }
        Outcome::CalendarEdited { name } => format!("Updated calendar '{}'", name),
        Outcome::CalendarSelected { name } => format!("Using calendar '{}'", name),
        Outcome::EventsCreated { events } => with_heading("Created", "", events),
        Outcome::EventsEdited { events } => with_heading("Updated", "", events),
        Outcome::EventsDeleted { events } => with_heading("Deleted", "", events),
        Outcome::EventsCopied { calendar, events } => {
            with_heading("Copied", &format!(" to '{}'", calendar), events)
        }
        Outcome::Events { events } if events.is_empty() => "No events.".to_string(),
        Outcome::Events { events } => event_lines(events),
        Outcome::Status { availability } => availability.to_string(),
    }
}

fn with_heading(verb: &str, suffix: &str, events: &[Event]) -> String {
    let noun = if events.len() == 1 { "event" } else { "events" };
    let heading = format!("{} {} {}{}", verb, events.len(), noun, suffix);
    if events.is_empty() {
        heading
    } else {
        format!("{}:\n{}", heading, event_lines(events))
    }
}

fn event_lines(events: &[Event]) -> String {
    let mut out = String::new();
    for (i, event) in events.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&event_line(event));
    }
    out
}

/// Formats one event as a bullet line.
pub fn event_line(event: &Event) -> String {
    let mut line = if event.is_all_day() {
        format!(
            "- {}: {} (all day)",
            event.subject(),
            event.start().format(DATE_FORMAT)
        )
    } else {
        format!(
            "- {}: {} to {}",
            event.subject(),
            format_local(event.start()),
            format_local(event.end())
        )
    };
    if !event.location().is_empty() {
        line.push_str(&format!(" @ {}", event.location()));
    }
    if event.status() != EventStatus::Confirmed {
        line.push_str(&format!(" [{}]", event.status()));
    }
    line
}
