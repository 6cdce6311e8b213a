//! # TutorHub Core
//!
//! This crate provides the foundational types and traits for TutorHub
//! analytics. It defines the query and result types exchanged with the
//! data store, the `AnalyticsError` taxonomy, and the `MetricStore` trait
//! that storage adapters implement.

pub mod error;
pub mod records;
pub mod traits;
pub mod types;

// Re-export commonly used items at the crate root
pub use error::{AnalyticsError, AnalyticsResult};
pub use traits::{Clock, FixedClock, MetricStore, SystemClock};
pub use types::{
    Activity, ActivityKind, Aggregate, AssetTier, BucketKey, DimensionFilter, EntityAggregate,
    EntityGrouping, Granularity, MetricQuery, MetricSource, Period, RankingQuery, SparsePoint,
    TimeWindow, UserRole,
};
