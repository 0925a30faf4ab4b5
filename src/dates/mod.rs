//! Calendar arithmetic shared by the financial model and the lifecycle store.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Renders a date as its ISO `YYYY-MM-DD` key.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Parses an ISO `YYYY-MM-DD` key back into a date.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), DATE_KEY_FORMAT).ok()
}

/// Inclusive day count of a date range. Never returns less than 1, even for
/// inverted ranges.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
    ((end - start).num_days() + 1).max(1)
}

/// Shifts a date by `months`, clamping the day-of-month to the last valid
/// day of the target month (Jan 31 + 1 month lands on Feb 28/29).
pub fn add_months_clamped(date: NaiveDate, months: i32) -> NaiveDate {
    let mut year = date.year();
    let mut month = date.month() as i32 + months;
    while month > 12 {
        month -= 12;
        year += 1;
    }
    while month < 1 {
        month += 12;
        year -= 1;
    }
    let day = date.day().min(days_in_month(year, month as u32));
    NaiveDate::from_ymd_opt(year, month as u32, day).unwrap_or(date)
}

/// Numeric-sortable form of an ISO date key: digits only, so
/// `2025-12-01` becomes `20251201`. Returns `None` for empty or malformed
/// input; a `None` serial never satisfies an overlap comparison.
pub fn date_key_serial(key: &str) -> Option<i64> {
    let digits: String = key.trim().chars().filter(|c| *c != '-').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Raw-key overlap test on date serials: `a.start < b.end && a.end > b.start`.
/// A pair involving an unparseable key never overlaps.
pub fn serial_ranges_overlap(
    a_start: &str,
    a_end: &str,
    b_start: &str,
    b_end: &str,
) -> bool {
    match (
        date_key_serial(a_start),
        date_key_serial(a_end),
        date_key_serial(b_start),
        date_key_serial(b_end),
    ) {
        (Some(a_start), Some(a_end), Some(b_start), Some(b_end)) => {
            a_start < b_end && a_end > b_start
        }
        _ => false,
    }
}

/// Partitions the inclusive range into calendar-week blocks. Each block runs
/// from its first day through the following Sunday, or the range end if that
/// comes sooner.
pub fn weekly_blocks(start: NaiveDate, end: NaiveDate) -> Vec<Vec<NaiveDate>> {
    let mut blocks = Vec::new();
    if end < start {
        return blocks;
    }
    let mut day = start;
    let mut block = Vec::new();
    while day <= end {
        block.push(day);
        if day.weekday() == Weekday::Sun {
            blocks.push(std::mem::take(&mut block));
        }
        day += Duration::days(1);
    }
    if !block.is_empty() {
        blocks.push(block);
    }
    blocks
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 28).unwrap());
    (first_next - Duration::days(1)).day()
}
