// Date cells: parsing what the sheets contain and formatting for display.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use roster_sync::ids::EPOCH_YEAR;
use roster_sync::{Cell, SequentialId};

pub const DISPLAY_DATE: &str = "%d/%m/%Y";
pub const ISO_DATE: &str = "%Y-%m-%d";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[ISO_DATE, DISPLAY_DATE];

#[derive(Debug, Clone, Copy)]
pub enum Clock {
    System,
    #[cfg(test)]
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            #[cfg(test)]
            Clock::Fixed(t) => *t,
        }
    }

    pub fn millis(&self) -> i64 {
        self.now().timestamp_millis()
    }

    /// A time-seeded id for new rows.
    pub fn fresh_id(&self) -> SequentialId {
        let now = self.now();
        let years = (now.year() - EPOCH_YEAR).max(0) as u32;
        SequentialId::fresh(years, now.timestamp_millis().max(0) as u64)
    }
}

/// Spreadsheet serial day numbers count from 1899-12-30.
pub fn from_serial(serial: f64) -> Option<NaiveDateTime> {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    if !serial.is_finite() {
        return None;
    }
    let millis = (serial * 86_400_000.0).round() as i64;
    base.checked_add_signed(Duration::milliseconds(millis))
}

/// Parses a date written as text. Values with an explicit offset are brought
/// to `tz`; the others are taken as already local.
pub fn parse_text(s: &str, tz: &FixedOffset) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(tz).naive_local());
    }
    for f in DATETIME_FORMATS {
        if let Ok(d) = NaiveDateTime::parse_from_str(s, f) {
            return Some(d);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// The local date and time held by a cell, if it holds one.
pub fn cell_datetime(cell: &Cell, tz: &FixedOffset) -> Option<NaiveDateTime> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Number(n) => from_serial(*n),
        Cell::Text(s) => parse_text(s, tz),
        Cell::Empty => None,
    }
}

pub fn display_date(d: &NaiveDateTime) -> String {
    d.format(DISPLAY_DATE).to_string()
}

pub fn iso_date(d: &NaiveDateTime) -> String {
    d.format(ISO_DATE).to_string()
}

/// A session date entered as `YYYY-MM-DD`, stored at noon.
pub fn session_date(s: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(s.trim(), ISO_DATE)
        .ok()
        .and_then(|d| d.and_hms_opt(12, 0, 0))
}
