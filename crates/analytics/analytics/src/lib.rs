//! # TutorHub Analytics
//!
//! The analytics aggregation engine behind the admin dashboard: time-bucketed
//! growth, usage and revenue series, period-over-period dashboard cards,
//! top-N rankings and the recent-activity feed.
//!
//! ```rust,ignore
//! use tutorhub_analytics::{AnalyticsApi, AnalyticsConfig};
//! use tutorhub_core::Period;
//!
//! let api = AnalyticsApi::new(store, AnalyticsConfig::default());
//! let chart = api.user_growth(Period::Week).await?;
//! assert_eq!(chart.labels.len(), 7);
//! ```

pub mod activity;
pub mod align;
pub mod buckets;
pub mod compare;
pub mod fetcher;
pub mod ranking;

mod api;
mod stats;

pub use activity::ActivityRecord;
pub use api::*;
pub use buckets::{BucketSequence, BucketWindow, WindowPolicy};
pub use compare::{Comparison, percent_change};
pub use stats::*;

use serde::{Deserialize, Serialize};
use tutorhub_core::ActivityKind;

/// Analytics engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Ranking size when the request gives no usable `limit`.
    pub default_limit: usize,
    /// Feed size when the request gives no usable `limit`.
    pub default_recent_limit: usize,
    /// Upper bound for any requested limit.
    pub max_limit: usize,
    /// Length in days of each dashboard comparison window.
    pub comparison_window_days: u32,
    /// Activity kinds merged into the recent-activity feed.
    pub activity_kinds: Vec<ActivityKind>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            default_recent_limit: 10,
            max_limit: 100,
            comparison_window_days: 30,
            activity_kinds: ActivityKind::ALL.to_vec(),
        }
    }
}

impl AnalyticsConfig {
    /// Creates a new config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default ranking size.
    pub fn default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Sets the default feed size.
    pub fn default_recent_limit(mut self, limit: usize) -> Self {
        self.default_recent_limit = limit;
        self
    }

    /// Sets the limit cap.
    pub fn max_limit(mut self, limit: usize) -> Self {
        self.max_limit = limit;
        self
    }

    /// Sets the comparison window length.
    pub fn comparison_window_days(mut self, days: u32) -> Self {
        self.comparison_window_days = days;
        self
    }

    /// Sets which activity kinds the feed includes.
    pub fn activity_kinds(mut self, kinds: impl Into<Vec<ActivityKind>>) -> Self {
        self.activity_kinds = kinds.into();
        self
    }

    /// Resolves a raw ranking `limit` parameter.
    pub fn resolve_limit(&self, raw: Option<&str>) -> usize {
        self.resolve(raw, self.default_limit)
    }

    /// Resolves a raw feed `limit` parameter.
    pub fn resolve_recent_limit(&self, raw: Option<&str>) -> usize {
        self.resolve(raw, self.default_recent_limit)
    }

    // Missing, unparsable and non-positive values fall back to the default;
    // oversized values are clamped rather than rejected.
    fn resolve(&self, raw: Option<&str>, default: usize) -> usize {
        match raw.and_then(|v| v.trim().parse::<i64>().ok()) {
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX).min(self.max_limit),
            _ => default.min(self.max_limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.default_limit, 5);
        assert_eq!(config.default_recent_limit, 10);
        assert_eq!(config.activity_kinds.len(), 5);
    }

    #[test]
    fn test_resolve_limit_permissive() {
        let config = AnalyticsConfig::new();
        assert_eq!(config.resolve_limit(Some("3")), 3);
        assert_eq!(config.resolve_limit(Some("-2")), 5);
        assert_eq!(config.resolve_limit(Some("0")), 5);
        assert_eq!(config.resolve_limit(Some("lots")), 5);
        assert_eq!(config.resolve_limit(None), 5);
        assert_eq!(config.resolve_recent_limit(None), 10);
    }

    #[test]
    fn test_resolve_limit_clamps() {
        let config = AnalyticsConfig::new().max_limit(20);
        assert_eq!(config.resolve_limit(Some("500")), 20);
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: AnalyticsConfig =
            serde_json::from_str(r#"{"default_limit": 8, "activity_kinds": ["asset_purchase"]}"#)
                .unwrap();
        assert_eq!(config.default_limit, 8);
        assert_eq!(config.max_limit, 100);
        assert_eq!(config.activity_kinds, vec![ActivityKind::AssetPurchase]);
    }
}
