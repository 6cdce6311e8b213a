//! Core traits for TutorHub analytics.
//!
//! This module defines the interfaces the analytics engine consumes: the
//! storage layer it reads aggregates from and the clock it measures time
//! windows against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

use crate::error::AnalyticsResult;
use crate::types::{
    Activity, ActivityKind, EntityAggregate, Granularity, MetricQuery, RankingQuery, SparsePoint,
};

/// Trait for metric stores (database backends).
///
/// Stores answer read-only aggregate queries over the tables owned by the
/// CRUD side of the platform. Implementations must never mutate state from
/// these methods, and must report query failures as errors rather than as
/// empty results.
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Aggregates `query` grouped by bucket key.
    ///
    /// Only buckets with at least one matching event are returned, in no
    /// particular order.
    async fn aggregate_by_bucket(
        &self,
        query: &MetricQuery,
        granularity: Granularity,
    ) -> AnalyticsResult<Vec<SparsePoint>>;

    /// Aggregates `query` over its whole window into a single value.
    async fn aggregate_total(&self, query: &MetricQuery) -> AnalyticsResult<f64>;

    /// Counts purchases grouped by asset or category, with display labels.
    ///
    /// Results come back in store order (ascending entity id), unsorted by value.
    async fn aggregate_by_entity(&self, query: &RankingQuery)
    -> AnalyticsResult<Vec<EntityAggregate>>;

    /// Returns the most recent `limit` activities of one kind, newest first.
    async fn recent_activities(
        &self,
        kind: ActivityKind,
        limit: usize,
    ) -> AnalyticsResult<Vec<Activity>>;

    /// Checks that the store is reachable.
    async fn health_check(&self) -> AnalyticsResult<()> {
        Ok(())
    }
}

/// Source of "now" for window computations.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a settable instant, for tests and replays.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<RwLock<DateTime<Utc>>>,
}

impl FixedClock {
    /// Creates a clock that always reports `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(RwLock::new(now)),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut guard) = self.now.write() {
            *guard = now;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.read().map(|guard| *guard).unwrap_or_else(|e| *e.into_inner())
    }
}
