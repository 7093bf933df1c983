//! CSV, JSON and iCalendar exports of the current event list.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use shared_types::{ApprovalStatus, CalendarEvent, EventType, UserSummary};

use crate::error::{CalendarError, CalendarResult};

const CSV_HEADER: [&str; 8] = [
    "Date",
    "Time",
    "Title",
    "Event Type",
    "Status",
    "User Name",
    "User Email",
    "User Role",
];

const ICAL_PRODID: &str = "-//Job Portal//Admin Calendar//EN";
const ICAL_LINE_LIMIT: usize = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Ical,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Ical => "ics",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::Ical => "text/calendar",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "ics" | "ical" | "icalendar" => Ok(ExportFormat::Ical),
            other => Err(CalendarError::Export(format!(
                "unsupported export format '{}'",
                other
            ))),
        }
    }
}

/// Serialize `events` in `format`. An empty list is [`CalendarError::NoData`].
pub fn export(events: &[CalendarEvent], format: ExportFormat) -> CalendarResult<String> {
    match format {
        ExportFormat::Csv => to_csv(events),
        ExportFormat::Json => to_json(events),
        ExportFormat::Ical => to_ical(events, Utc::now()),
    }
}

/// Suggested file name, e.g. `calendar-events-2024-05-01.csv`
pub fn file_name(format: ExportFormat, today: DateTime<Utc>) -> String {
    format!(
        "calendar-events-{}.{}",
        today.format("%Y-%m-%d"),
        format.extension()
    )
}

pub fn to_csv(events: &[CalendarEvent]) -> CalendarResult<String> {
    ensure_not_empty(events)?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for event in events {
        let user = event.user();
        writer.write_record([
            event.start.format("%Y-%m-%d").to_string(),
            event.start.format("%H:%M").to_string(),
            event.title.clone(),
            event.event_type.label().to_string(),
            event.status().as_str().to_string(),
            user.map(|u| u.name.clone()).unwrap_or_default(),
            user.and_then(|u| u.email.clone()).unwrap_or_default(),
            user.map(|u| u.role.as_str().to_string()).unwrap_or_default(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CalendarError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CalendarError::Export(e.to_string()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonRow<'a> {
    title: &'a str,
    date: String,
    #[serde(rename = "type")]
    event_type: EventType,
    status: ApprovalStatus,
    user: Option<&'a UserSummary>,
    resume_url: Option<&'a str>,
}

pub fn to_json(events: &[CalendarEvent]) -> CalendarResult<String> {
    ensure_not_empty(events)?;

    let rows: Vec<JsonRow<'_>> = events
        .iter()
        .map(|event| JsonRow {
            title: &event.title,
            date: event.start.to_rfc3339(),
            event_type: event.event_type,
            status: event.status(),
            user: event.user(),
            resume_url: event.resume_url(),
        })
        .collect();

    Ok(serde_json::to_string_pretty(&rows)?)
}

/// RFC 5545 calendar with one `VEVENT` per event, each lasting one hour
pub fn to_ical(events: &[CalendarEvent], stamp: DateTime<Utc>) -> CalendarResult<String> {
    ensure_not_empty(events)?;

    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", ICAL_PRODID),
        "CALSCALE:GREGORIAN".to_string(),
    ];

    for event in events {
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}@admin-calendar", escape_text(&event.id)));
        lines.push(format!("DTSTAMP:{}", ical_time(stamp)));
        lines.push(format!("DTSTART:{}", ical_time(event.start)));
        lines.push(format!("DTEND:{}", ical_time(event.start + Duration::hours(1))));
        lines.push(format!("SUMMARY:{}", escape_text(&event.title)));
        lines.push(format!("CATEGORIES:{}", event.event_type.label()));
        lines.push(format!("DESCRIPTION:{}", escape_text(&description(event))));
        lines.push("END:VEVENT".to_string());
    }
    lines.push("END:VCALENDAR".to_string());

    let mut out = String::new();
    for line in lines {
        for folded in fold_line(&line) {
            out.push_str(&folded);
            out.push_str("\r\n");
        }
    }
    Ok(out)
}

fn ensure_not_empty(events: &[CalendarEvent]) -> CalendarResult<()> {
    if events.is_empty() {
        return Err(CalendarError::NoData);
    }
    Ok(())
}

fn description(event: &CalendarEvent) -> String {
    let mut parts = vec![format!("Status: {}", event.status().as_str())];
    if let Some(user) = event.user() {
        parts.push(format!("User: {} ({})", user.name, user.role.as_str()));
    }
    if let Some(job) = event.job() {
        parts.push(format!("Job: {}", job.title));
    }
    if let Some(url) = event.resume_url() {
        parts.push(format!("Resume: {}", url));
    }
    parts.join("\n")
}

fn ical_time(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

/// TEXT value escaping per RFC 5545 section 3.3.11
fn escape_text(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            ';' => escaped.push_str("\\;"),
            ',' => escaped.push_str("\\,"),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            other => escaped.push(other),
        }
    }
    escaped
}

/// Split a content line into chunks of at most 75 octets; continuations start with a space
fn fold_line(line: &str) -> Vec<String> {
    let mut folded = Vec::new();
    let mut current = String::new();

    for c in line.chars() {
        if current.len() + c.len_utf8() > ICAL_LINE_LIMIT {
            folded.push(std::mem::take(&mut current));
            current.push(' ');
        }
        current.push(c);
    }
    folded.push(current);
    folded
}
