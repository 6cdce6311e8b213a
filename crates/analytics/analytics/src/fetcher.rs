//! Metric fetching.
//!
//! Thin layer over [`MetricStore`] that scopes queries to a bucket window
//! and attributes storage failures to the series being fetched.

use crate::buckets::BucketSequence;
use std::sync::Arc;
use tutorhub_core::{
    Activity, ActivityKind, AnalyticsError, AnalyticsResult, EntityAggregate, MetricQuery,
    MetricStore, RankingQuery, SparsePoint, TimeWindow,
};

/// A named sparse series as returned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseSeries {
    pub name: String,
    pub points: Vec<SparsePoint>,
}

impl SparseSeries {
    pub fn new(name: impl Into<String>, points: Vec<SparsePoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }
}

/// Issues aggregate queries against a metric store.
#[derive(Clone)]
pub struct MetricFetcher {
    store: Arc<dyn MetricStore>,
}

impl MetricFetcher {
    /// Creates a fetcher over `store`.
    pub fn new(store: Arc<dyn MetricStore>) -> Self {
        Self { store }
    }

    /// Gets the underlying store.
    pub fn store(&self) -> &dyn MetricStore {
        self.store.as_ref()
    }

    /// Fetches `query` grouped by the granularity of `buckets`, restricted
    /// to events at or after the start of the first bucket.
    pub async fn bucketed(
        &self,
        series: &str,
        query: MetricQuery,
        buckets: &BucketSequence,
    ) -> AnalyticsResult<SparseSeries> {
        let window = match buckets.since() {
            Some(since) => TimeWindow::since(since),
            None => return Ok(SparseSeries::new(series, Vec::new())),
        };
        let query = query.window(window);

        let points = self
            .store
            .aggregate_by_bucket(&query, buckets.granularity())
            .await
            .map_err(|e| attribute(series, e))?;

        tracing::debug!(
            series,
            source = %query.source,
            points = points.len(),
            buckets = buckets.len(),
            "Fetched bucketed metric"
        );
        Ok(SparseSeries::new(series, points))
    }

    /// Fetches a single aggregate over the query's own window.
    pub async fn total(&self, series: &str, query: &MetricQuery) -> AnalyticsResult<f64> {
        self.store
            .aggregate_total(query)
            .await
            .map_err(|e| attribute(series, e))
    }

    /// Fetches per-entity aggregates for a ranking.
    pub async fn by_entity(
        &self,
        series: &str,
        query: &RankingQuery,
    ) -> AnalyticsResult<Vec<EntityAggregate>> {
        self.store
            .aggregate_by_entity(query)
            .await
            .map_err(|e| attribute(series, e))
    }

    /// Fetches the latest activities of one kind.
    pub async fn recent(&self, kind: ActivityKind, limit: usize) -> AnalyticsResult<Vec<Activity>> {
        self.store
            .recent_activities(kind, limit)
            .await
            .map_err(|e| attribute(kind.as_str(), e))
    }
}

/// Turns a raw storage error into a fetch failure for `series`.
fn attribute(series: &str, err: AnalyticsError) -> AnalyticsError {
    match err {
        AnalyticsError::Database { message } => {
            tracing::error!(series, error = %message, "Metric fetch failed");
            AnalyticsError::fetch_failed(series, message)
        }
        other => other,
    }
}
