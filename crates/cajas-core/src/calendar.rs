//! Lima local-time helpers.
//!
//! Timestamps are stored in UTC. Business days, report months and
//! comprobante issue dates are Lima days (UTC-5, no DST), so range queries
//! convert local boundaries back to UTC instants.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

/// Peru has no daylight saving time: always UTC-5.
const LIMA_OFFSET_SECS: i32 = -5 * 3600;

fn lima_offset() -> FixedOffset {
    FixedOffset::east_opt(LIMA_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Converts a UTC timestamp to Lima local time.
pub fn lima_time(at: DateTime<Utc>) -> DateTime<FixedOffset> {
    at.with_timezone(&lima_offset())
}

/// The Lima calendar date of an instant.
pub fn lima_date(at: DateTime<Utc>) -> NaiveDate {
    lima_time(at).date_naive()
}

/// UTC instant of Lima midnight at the start of `date`.
pub fn lima_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    // Fixed offsets never produce ambiguous or missing local times
    lima_offset()
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// `[start, end)` of a Lima day, in UTC.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = lima_midnight(date);
    (start, start + Duration::days(1))
}

/// `[start, end)` of a Lima calendar month, in UTC. `None` for an invalid
/// month.
pub fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((lima_midnight(first), lima_midnight(next)))
}

/// `[start, end)` of a Lima calendar year, in UTC.
pub fn year_bounds(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let next = NaiveDate::from_ymd_opt(year + 1, 1, 1)?;
    Some((lima_midnight(first), lima_midnight(next)))
}

/// First day of the month `months_back` months before the month of `today`.
pub fn months_ago(today: NaiveDate, months_back: u32) -> NaiveDate {
    let total = today.year() * 12 + today.month0() as i32 - months_back as i32;
    let (year, month0) = (total.div_euclid(12), total.rem_euclid(12));
    NaiveDate::from_ymd_opt(year, month0 as u32 + 1, 1).unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lima_date_crosses_midnight() {
        let at = Utc.with_ymd_and_hms(2025, 3, 15, 3, 0, 0).unwrap();
        assert_eq!(lima_date(at), NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        let at = Utc.with_ymd_and_hms(2025, 3, 15, 5, 0, 0).unwrap();
        assert_eq!(lima_date(at), NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
    }

    #[test]
    fn test_day_bounds() {
        let (start, end) = day_bounds(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 14, 5, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 3, 15, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_month_bounds_december() {
        let (start, end) = month_bounds(2024, 12).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 5, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 5, 0, 0).unwrap());
        assert!(month_bounds(2024, 13).is_none());
    }

    #[test]
    fn test_year_bounds() {
        let (start, end) = year_bounds(2025).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 1, 1, 5, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_months_ago() {
        let today = NaiveDate::from_ymd_opt(2025, 2, 20).unwrap();
        assert_eq!(months_ago(today, 0), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(months_ago(today, 5), NaiveDate::from_ymd_opt(2024, 9, 1).unwrap());
        assert_eq!(months_ago(today, 14), NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
    }
}
