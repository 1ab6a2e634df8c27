use chrono::Duration;

use crate::models::{Appointment, Pet};

/// Single-event iCalendar document. Times are floating (no `Z`), so calendar
/// apps show the clinic's wall-clock time.
pub fn generate_ics(appt: &Appointment, pet: Option<&Pet>, clinic_name: &str) -> String {
    let dtstart = appt.start_date_time.format("%Y%m%dT%H%M%S").to_string();
    let dtend = (appt.start_date_time + Duration::minutes(appt.effective_duration() as i64))
        .format("%Y%m%dT%H%M%S")
        .to_string();
    let dtstamp = appt.created_at.format("%Y%m%dT%H%M%SZ").to_string();
    let uid = format!("{}@vetclinic", appt.id);

    let summary = match pet {
        Some(p) => format!("{} appointment at {clinic_name}", p.name),
        None => format!("Appointment at {clinic_name}"),
    };
    let summary = escape_text(&summary);
    let description = escape_text(
        appt.reason
            .as_deref()
            .or(appt.notes.as_deref())
            .unwrap_or("No additional notes"),
    );

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//VetClinic//Appointments//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         STATUS:{status}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n",
        status = ics_status(appt),
    )
}

/// RFC 5545 TEXT escaping. Line breaks become a literal `\n`; bare CRs are dropped.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

fn ics_status(appt: &Appointment) -> &'static str {
    if appt.is_active() {
        "CONFIRMED"
    } else {
        "CANCELLED"
    }
}
