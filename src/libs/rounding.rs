//! Billed-duration rounding.
//!
//! Billing never under-charges a partial interval: elapsed minutes are
//! rounded up to the next multiple of the configured interval. An interval
//! of zero (or less) disables rounding.

use chrono::NaiveDateTime;

/// Rounds `raw_minutes` up to the next multiple of `interval`.
///
/// ```
/// use billable::libs::rounding::round_duration;
///
/// assert_eq!(round_duration(47, 15), 60);
/// assert_eq!(round_duration(15, 15), 15);
/// assert_eq!(round_duration(0, 15), 0);
/// assert_eq!(round_duration(7, 0), 7);
/// ```
pub fn round_duration(raw_minutes: i64, interval: i64) -> i64 {
    let raw_minutes = raw_minutes.max(0);
    if interval <= 0 || raw_minutes == 0 {
        return raw_minutes;
    }

    let intervals = (raw_minutes - 1) / interval + 1;
    // Saturates at i64::MAX
    intervals.checked_mul(interval).unwrap_or(i64::MAX)
}

/// Whole minutes from `start` to `end`, floored. A clock that went backwards yields 0.
pub fn elapsed_minutes(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    (end - start).num_seconds().max(0) / 60
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn rounds_up_to_interval() {
        assert_eq!(round_duration(0, 15), 0);
        assert_eq!(round_duration(1, 15), 15);
        assert_eq!(round_duration(15, 15), 15);
        assert_eq!(round_duration(16, 15), 30);
        assert_eq!(round_duration(47, 15), 60);
        assert_eq!(round_duration(61, 60), 120);
        assert_eq!(round_duration(47, i64::MAX), i64::MAX);
        assert_eq!(round_duration(47, i64::MAX - 10), i64::MAX - 10);
        assert_eq!(round_duration(i64::MAX, i64::MAX), i64::MAX);
        assert_eq!(round_duration(i64::MAX - 5, i64::MAX - 10), i64::MAX);
    }

    #[test]
    fn zero_or_negative_interval_disables_rounding() {
        assert_eq!(round_duration(23, 0), 23);
        assert_eq!(round_duration(23, -5), 23);
    }

    #[test]
    fn negative_raw_minutes_clamp_to_zero() {
        assert_eq!(round_duration(-3, 15), 0);
        assert_eq!(round_duration(-3, 0), 0);
    }

    #[test]
    fn rounding_is_idempotent() {
        for raw in 0..200 {
            let once = round_duration(raw, 6);
            assert_eq!(round_duration(once, 6), once);
        }
    }

    #[test]
    fn elapsed_minutes_floors_partial_minutes() {
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        assert_eq!(elapsed_minutes(start, start + Duration::seconds(59)), 0);
        assert_eq!(elapsed_minutes(start, start + Duration::seconds(47 * 60 + 59)), 47);
        assert_eq!(elapsed_minutes(start, start - Duration::minutes(5)), 0);
    }
}
