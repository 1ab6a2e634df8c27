//! Local-component date/time handling.
//!
//! Appointment date-times are stored and compared as naive wall-clock values
//! (year/month/day/hour/minute exactly as entered). Nothing here converts
//! through a timezone, so a value written as `2024-05-28 10:00` reads back as
//! `2024-05-28` / `10:00` on any host. Every path that extracts a date or a
//! time of day from an appointment goes through this module.

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";
pub const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses a strict `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    let s = s.trim();
    let well_formed = s.len() == 10
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        anyhow::bail!("invalid date (expected YYYY-MM-DD): {s}");
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .with_context(|| format!("invalid date (expected YYYY-MM-DD): {s}"))
}

/// Parses a 24-hour `HH:MM` time of day.
pub fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    let s = s.trim();
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("invalid time format: {s}"))?;
    if h.is_empty()
        || h.len() > 2
        || m.len() != 2
        || !h.bytes().all(|b| b.is_ascii_digit())
        || !m.bytes().all(|b| b.is_ascii_digit())
    {
        anyhow::bail!("invalid time format: {s}");
    }
    let hour: u32 = h
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = m
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| anyhow::anyhow!("time out of range: {s}"))
}

pub fn minutes_since_midnight(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// `"HH:MM"`, the slot value sent to and accepted from clients.
pub fn slot_value(t: NaiveTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

/// 12-hour display label: `09:00` → `9:00 AM`, `00:00` → `12:00 AM`.
pub fn slot_label(t: NaiveTime) -> String {
    let (pm, hour12) = t.hour12();
    let suffix = if pm { "PM" } else { "AM" };
    format!("{hour12}:{:02} {suffix}", t.minute())
}

pub fn to_storage(dt: &NaiveDateTime) -> String {
    dt.format(STORAGE_FORMAT).to_string()
}

pub fn from_storage(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, STORAGE_FORMAT)
        .with_context(|| format!("invalid stored date-time: {s}"))
}

/// Date key used to select a day's appointments in storage.
pub fn storage_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn combine(date: NaiveDate, time: NaiveTime) -> NaiveDateTime {
    date.and_time(time)
}
