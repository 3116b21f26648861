use chrono::NaiveDate;
use regex::{Captures, Regex};

lazy_static::lazy_static! {
    static ref ISO_DATE: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
    static ref ISO_PREFIX: Regex = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})(?:$|[T\s])").unwrap();
    static ref ISO_ANYWHERE: Regex = Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap();
    static ref MONTH_FIRST: Regex = Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b"
    ).unwrap();
    static ref DAY_FIRST: Regex = Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?\s+(\d{4})\b"
    ).unwrap();
}

/// Strict `YYYY-MM-DD` calendar date, as accepted in request paths.
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    if !ISO_DATE.is_match(text) {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Parses the date formats the source site uses: ISO dates and timestamps,
/// `January 18, 2026` and `18 Jan 2026`, with or without a weekday.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Some(caps) = ISO_PREFIX.captures(raw) {
        return from_numeric(&caps);
    }
    find_date(raw)
}

/// First recognizable date anywhere in `text`.
pub fn find_date(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = MONTH_FIRST.captures(text) {
        if let Some(date) = ymd(&caps[3], &caps[1], &caps[2]) {
            return Some(date);
        }
    }
    if let Some(caps) = DAY_FIRST.captures(text) {
        if let Some(date) = ymd(&caps[3], &caps[2], &caps[1]) {
            return Some(date);
        }
    }
    ISO_ANYWHERE.captures(text).and_then(|caps| from_numeric(&caps))
}

fn from_numeric(caps: &Captures) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    )
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month_number(month)?, day.parse().ok()?)
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.get(..3)?.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
