//! Period-over-period comparison.

use chrono::{DateTime, TimeDelta, Utc};
use tutorhub_core::TimeWindow;

/// Relative change from `previous` to `current`, in percent.
///
/// A zero baseline never divides: no change at all is `0`, growth from
/// nothing is `100`. Otherwise the result is signed and unclamped.
pub fn percent_change(previous: f64, current: f64) -> f64 {
    if previous == 0.0 {
        if current > 0.0 { 100.0 } else { 0.0 }
    } else {
        (current - previous) / previous * 100.0
    }
}

/// A metric measured over two adjacent, equal-length windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub current: f64,
    pub previous: f64,
    pub percent_change: f64,
}

impl Comparison {
    pub fn of(current: f64, previous: f64) -> Self {
        Self {
            current,
            previous,
            percent_change: percent_change(previous, current),
        }
    }
}

/// The current window and the one immediately before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonWindows {
    pub current: TimeWindow,
    pub previous: TimeWindow,
}

impl ComparisonWindows {
    /// `[now - days, now)` and `[now - 2*days, now - days)`.
    pub fn trailing(now: DateTime<Utc>, days: u32) -> Self {
        let span = TimeDelta::days(i64::from(days));
        let boundary = now - span;
        Self {
            current: TimeWindow::between(boundary, now),
            previous: TimeWindow::between(boundary - span, boundary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_zero_baseline() {
        assert_eq!(percent_change(0.0, 0.0), 0.0);
        assert_eq!(percent_change(0.0, 5.0), 100.0);
    }

    #[test]
    fn test_signed_unclamped() {
        assert_eq!(percent_change(50.0, 100.0), 100.0);
        assert_eq!(percent_change(200.0, 100.0), -50.0);
        assert_eq!(percent_change(10.0, 45.0), 350.0);
        assert_eq!(percent_change(10.0, 0.0), -100.0);
    }

    #[test]
    fn test_comparison_of() {
        let c = Comparison::of(125.0, 100.0);
        assert_eq!(c.current, 125.0);
        assert_eq!(c.previous, 100.0);
        assert_eq!(c.percent_change, 25.0);
    }

    #[test]
    fn test_trailing_windows_are_adjacent() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let windows = ComparisonWindows::trailing(now, 30);

        assert_eq!(windows.current.until, Some(now));
        assert_eq!(windows.current.since, windows.previous.until);
        assert_eq!(
            windows.previous.since,
            Some(Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap())
        );
    }
}
