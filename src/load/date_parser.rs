use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static HEADER_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2})$").expect("date header regex"));

/// Parse an upstream `M/D/YY` column header (e.g. `3/13/20`) into a date.
/// Two-digit years are taken as 20YY.
pub fn parse_header_date(s: &str) -> Option<NaiveDate> {
    let caps = HEADER_DATE.captures(s.trim())?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(2000 + year, month, day)
}

/// Inverse of [`parse_header_date`], for writing fixtures and mirrors.
pub fn format_header_date(d: NaiveDate) -> String {
    d.format("%-m/%-d/%y").to_string()
}
