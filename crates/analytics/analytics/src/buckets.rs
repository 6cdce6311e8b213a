//! Time-bucket generation.
//!
//! Buckets are produced by walking backwards from "today", never by asking
//! the store which keys exist, so a chart axis has no gaps however sparse
//! the data is.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tutorhub_core::{BucketKey, Granularity, Period};

/// How a period keyword maps to a bucket window.
///
/// The two policies only disagree on `month`: growth-style charts show the
/// last 30 days, usage charts show the last 6 months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowPolicy {
    /// User growth and revenue charts.
    Growth,
    /// Asset usage charts.
    Usage,
}

impl WindowPolicy {
    /// Returns the bucket window for `period` under this policy.
    pub fn window(&self, period: Period) -> BucketWindow {
        match (self, period) {
            (_, Period::Week) => BucketWindow::days(7),
            (WindowPolicy::Growth, Period::Month) => BucketWindow::days(30),
            (WindowPolicy::Usage, Period::Month) => BucketWindow::months(6),
            (_, Period::Year) => BucketWindow::months(12),
        }
    }
}

/// A fixed number of buckets of one granularity, ending at the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketWindow {
    pub granularity: Granularity,
    pub len: usize,
}

impl BucketWindow {
    pub fn days(len: usize) -> Self {
        Self {
            granularity: Granularity::Day,
            len,
        }
    }

    pub fn months(len: usize) -> Self {
        Self {
            granularity: Granularity::Month,
            len,
        }
    }

    /// Generates the buckets ending with the one containing `today`.
    pub fn generate(&self, today: NaiveDate) -> BucketSequence {
        let buckets = (0..self.len)
            .rev()
            .map(|back| {
                let start = match self.granularity {
                    Granularity::Day => today - TimeDelta::days(back as i64),
                    Granularity::Month => months_before(today, back),
                };
                Bucket::starting(start, self.granularity)
            })
            .collect();
        BucketSequence::new(self.granularity, buckets)
    }

    /// Generates the buckets ending with the one containing `now` (UTC).
    pub fn generate_at(&self, now: DateTime<Utc>) -> BucketSequence {
        self.generate(now.date_naive())
    }
}

/// First day of the month `back` months before the month of `date`.
fn months_before(date: NaiveDate, back: usize) -> NaiveDate {
    let index = date.year() * 12 + date.month0() as i32 - back as i32;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// One slot on a chart axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub key: BucketKey,
    pub label: String,
    pub start: NaiveDate,
}

impl Bucket {
    fn starting(start: NaiveDate, granularity: Granularity) -> Self {
        Self {
            key: BucketKey::from_date(start, granularity),
            label: start.format(granularity.label_format()).to_string(),
            start,
        }
    }
}

/// A dense, chronologically ordered run of buckets.
#[derive(Debug, Clone)]
pub struct BucketSequence {
    granularity: Granularity,
    buckets: Vec<Bucket>,
    index: HashMap<BucketKey, usize>,
}

impl BucketSequence {
    fn new(granularity: Granularity, buckets: Vec<Bucket>) -> Self {
        let index = buckets
            .iter()
            .enumerate()
            .map(|(i, b)| (b.key.clone(), i))
            .collect();
        Self {
            granularity,
            buckets,
            index,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Position of `key` on the axis, if it is inside the window.
    pub fn index_of(&self, key: &BucketKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn keys(&self) -> Vec<BucketKey> {
        self.buckets.iter().map(|b| b.key.clone()).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.buckets.iter().map(|b| b.label.clone()).collect()
    }

    /// Midnight UTC at the start of the first bucket.
    ///
    /// This is the lower bound fetchers restrict their queries to.
    pub fn since(&self) -> Option<DateTime<Utc>> {
        self.buckets
            .first()
            .map(|b| b.start.and_time(NaiveTime::MIN).and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_growth_window_lengths() {
        let today = date(2024, 3, 7);
        assert_eq!(WindowPolicy::Growth.window(Period::Week).generate(today).len(), 7);
        assert_eq!(WindowPolicy::Growth.window(Period::Month).generate(today).len(), 30);
        assert_eq!(WindowPolicy::Growth.window(Period::Year).generate(today).len(), 12);
    }

    #[test]
    fn test_usage_month_is_six_months() {
        let window = WindowPolicy::Usage.window(Period::Month);
        assert_eq!(window, BucketWindow::months(6));

        let seq = window.generate(date(2024, 3, 7));
        let keys: Vec<_> = seq.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["2023-10", "2023-11", "2023-12", "2024-01", "2024-02", "2024-03"]);
    }

    #[test]
    fn test_week_ends_today() {
        let seq = BucketWindow::days(7).generate(date(2024, 3, 7));
        let keys = seq.keys();

        assert_eq!(keys.first().unwrap().as_str(), "2024-03-01");
        assert_eq!(keys.last().unwrap().as_str(), "2024-03-07");
        assert_eq!(seq.labels().last().unwrap(), "Mar 7");
    }

    #[test]
    fn test_day_buckets_cross_year_boundary() {
        let seq = BucketWindow::days(3).generate(date(2024, 1, 1));
        let keys: Vec<_> = seq.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["2023-12-30", "2023-12-31", "2024-01-01"]);
    }

    #[test]
    fn test_year_labels() {
        let seq = BucketWindow::months(12).generate(date(2024, 3, 31));
        let labels = seq.labels();

        assert_eq!(labels.first().unwrap(), "Apr 2023");
        assert_eq!(labels.last().unwrap(), "Mar 2024");
    }

    #[test]
    fn test_keys_unique_and_ordered() {
        for period in [Period::Week, Period::Month, Period::Year] {
            for policy in [WindowPolicy::Growth, WindowPolicy::Usage] {
                let seq = policy.window(period).generate(date(2024, 2, 29));
                let keys = seq.keys();
                let labels: HashSet<_> = seq.labels().into_iter().collect();

                assert!(keys.windows(2).all(|w| w[0] < w[1]), "{period} keys out of order");
                assert_eq!(labels.len(), seq.len(), "{period} labels not unique");
            }
        }
    }

    #[test]
    fn test_since_is_midnight_of_first_bucket() {
        let seq = BucketWindow::months(2).generate(date(2024, 3, 15));
        let since = seq.since().unwrap();
        assert_eq!(since.to_rfc3339(), "2024-02-01T00:00:00+00:00");
    }

    #[test]
    fn test_index_of_outside_window() {
        let seq = BucketWindow::days(7).generate(date(2024, 3, 7));
        assert_eq!(seq.index_of(&BucketKey::new("2024-03-04")), Some(3));
        assert_eq!(seq.index_of(&BucketKey::new("2024-03-08")), None);
    }
}
