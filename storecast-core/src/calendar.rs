//! Calendar-month arithmetic.
//!
//! Forecasts live on a monthly grid: every forecast date is the first day of
//! a calendar month. Historical dates may fall anywhere inside a month; only
//! their month matters when computing where a forecast starts.

use chrono::{Datelike, Months, NaiveDate};

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Add `months` calendar months to `date`.
///
/// The day of month is clamped to the last day of the target month
/// (Jan 31 + 1 month = Feb 29 in a leap year). Returns `None` on overflow.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Absolute month index (`year * 12 + month0`) used for span arithmetic.
pub fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

/// Number of calendar months in the inclusive range `start..=end`.
///
/// Returns 0 when `end` falls in a month before `start`.
pub fn month_span(start: NaiveDate, end: NaiveDate) -> usize {
    let span = month_index(end) - month_index(start) + 1;
    usize::try_from(span).unwrap_or(0)
}

/// True when `b` is the calendar month immediately after `a`.
pub fn is_next_month(a: NaiveDate, b: NaiveDate) -> bool {
    month_index(b) - month_index(a) == 1
}

/// Short display label, e.g. `Jan-2024`.
pub fn month_label(date: NaiveDate) -> String {
    date.format("%b-%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_start_truncates_day() {
        assert_eq!(month_start(d(2023, 12, 15)), d(2023, 12, 1));
        assert_eq!(month_start(d(2024, 2, 1)), d(2024, 2, 1));
    }

    #[test]
    fn add_months_crosses_year_boundary() {
        assert_eq!(add_months(d(2023, 12, 1), 1), Some(d(2024, 1, 1)));
        assert_eq!(add_months(d(2023, 11, 1), 14), Some(d(2025, 1, 1)));
    }

    #[test]
    fn add_months_clamps_day() {
        assert_eq!(add_months(d(2024, 1, 31), 1), Some(d(2024, 2, 29)));
        assert_eq!(add_months(d(2023, 1, 31), 1), Some(d(2023, 2, 28)));
    }

    #[test]
    fn month_span_is_inclusive() {
        assert_eq!(month_span(d(2024, 1, 1), d(2024, 3, 1)), 3);
        assert_eq!(month_span(d(2024, 1, 1), d(2024, 1, 20)), 1);
        assert_eq!(month_span(d(2023, 11, 1), d(2024, 2, 1)), 4);
        assert_eq!(month_span(d(2024, 3, 1), d(2024, 1, 1)), 0);
    }

    #[test]
    fn next_month_detection() {
        assert!(is_next_month(d(2023, 12, 1), d(2024, 1, 1)));
        assert!(!is_next_month(d(2023, 12, 1), d(2024, 2, 1)));
        assert!(!is_next_month(d(2024, 1, 1), d(2024, 1, 1)));
    }

    #[test]
    fn label_format() {
        assert_eq!(month_label(d(2024, 3, 1)), "Mar-2024");
    }
}
