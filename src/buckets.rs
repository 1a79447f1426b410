use chrono::{Datelike, NaiveDate};
use thiserror::Error;

/// Marker returned when a stored or submitted date cannot be bucketed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparseable date {0:?} (expected YYYY-MM-DD)")]
pub struct InvalidDate(pub String);

/// Parses a canonical `YYYY-MM-DD` calendar date.
///
/// Only the zero-padded ISO form is accepted so that the string form of every
/// stored date sorts chronologically.
pub fn parse_date(date: &str) -> Result<NaiveDate, InvalidDate> {
    let t = date.trim();
    if t.len() != 10 {
        return Err(InvalidDate(date.to_string()));
    }
    NaiveDate::parse_from_str(t, "%Y-%m-%d").map_err(|_| InvalidDate(date.to_string()))
}

pub fn month_key(date: &str) -> Result<String, InvalidDate> {
    let d = parse_date(date)?;
    Ok(month_key_of(d))
}

pub fn month_key_of(d: NaiveDate) -> String {
    format!("{:04}-{:02}", d.year(), d.month())
}

/// Semester 1 is July..=December, semester 2 is January..=June, both bound to
/// the calendar year that contains the months: `2024-S1`, `2025-S2`.
pub fn semester_key(date: &str) -> Result<String, InvalidDate> {
    let d = parse_date(date)?;
    Ok(semester_key_of(d))
}

pub fn semester_key_of(d: NaiveDate) -> String {
    format!("{:04}-S{}", d.year(), semester_of_month(d.month()))
}

fn semester_of_month(month: u32) -> u8 {
    if (7..=12).contains(&month) {
        1
    } else {
        2
    }
}
