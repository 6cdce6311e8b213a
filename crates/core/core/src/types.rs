//! Core data types for TutorHub analytics.
//!
//! These types describe what the analytics engine asks of the data store
//! (metric queries, ranking queries, activity kinds) and what it gets back
//! (sparse bucket points, entity aggregates, activities). All of them are
//! transient; nothing here is ever written back to storage.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reporting period requested by a chart endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Year,
}

impl Period {
    /// Parses a period keyword, falling back to `Month` for anything
    /// missing or unrecognised.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or_default()
    }

    /// Returns the keyword for this period.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

impl std::str::FromStr for Period {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Width of a time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Month,
}

impl Granularity {
    /// The strftime pattern that truncates a timestamp to a bucket key.
    ///
    /// Chrono and SQLite's `strftime` agree on both patterns, so storage
    /// adapters can group by exactly the keys the engine generates.
    pub fn key_format(&self) -> &'static str {
        match self {
            Granularity::Day => "%Y-%m-%d",
            Granularity::Month => "%Y-%m",
        }
    }

    /// The chrono pattern for human-readable bucket labels.
    pub fn label_format(&self) -> &'static str {
        match self {
            Granularity::Day => "%b %-d",
            Granularity::Month => "%b %Y",
        }
    }
}

/// A timestamp truncated to day (`2024-03-07`) or month (`2024-03`).
///
/// Keys of the same granularity order chronologically when compared as
/// strings, which is what the derived `Ord` does.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketKey(String);

impl BucketKey {
    /// Wraps a key produced elsewhere (e.g. by a storage adapter).
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Truncates a timestamp to its bucket key.
    pub fn from_timestamp(ts: DateTime<Utc>, granularity: Granularity) -> Self {
        Self::from_date(ts.date_naive(), granularity)
    }

    /// Truncates a calendar date to its bucket key.
    pub fn from_date(date: NaiveDate, granularity: Granularity) -> Self {
        Self(date.format(granularity.key_format()).to_string())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Platform role of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Tutor,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Tutor => "tutor",
            UserRole::Admin => "admin",
        }
    }
}

/// Pricing tier of a purchasable asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetTier {
    Free,
    Premium,
}

impl AssetTier {
    pub fn is_free(&self) -> bool {
        matches!(self, AssetTier::Free)
    }

    pub fn from_is_free(is_free: bool) -> Self {
        if is_free { AssetTier::Free } else { AssetTier::Premium }
    }
}

/// The kind of event a metric is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricSource {
    UserRegistrations,
    AssetPurchases,
    DiaryPages,
    ForumPosts,
    AwardGrants,
    ChatMessages,
}

impl MetricSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricSource::UserRegistrations => "user_registrations",
            MetricSource::AssetPurchases => "asset_purchases",
            MetricSource::DiaryPages => "diary_pages",
            MetricSource::ForumPosts => "forum_posts",
            MetricSource::AwardGrants => "award_grants",
            MetricSource::ChatMessages => "chat_messages",
        }
    }
}

impl fmt::Display for MetricSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate function applied per bucket or window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    /// Number of matching events.
    Count,
    /// Sum of the events' numeric value (purchase price).
    Sum,
}

/// Optional dimension restricting which events are aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "dimension", content = "value", rename_all = "snake_case")]
pub enum DimensionFilter {
    /// Users with the given role.
    Role(UserRole),
    /// Purchases of free or premium assets.
    AssetTier(AssetTier),
    /// Purchases of assets in the given category.
    Category(i64),
}

impl DimensionFilter {
    /// Whether this filter can be applied to events from `source`.
    pub fn applies_to(&self, source: MetricSource) -> bool {
        match self {
            DimensionFilter::Role(_) => source == MetricSource::UserRegistrations,
            DimensionFilter::AssetTier(_) | DimensionFilter::Category(_) => {
                source == MetricSource::AssetPurchases
            }
        }
    }
}

impl fmt::Display for DimensionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionFilter::Role(role) => write!(f, "role={}", role.as_str()),
            DimensionFilter::AssetTier(tier) => write!(f, "is_free={}", tier.is_free()),
            DimensionFilter::Category(id) => write!(f, "category_id={id}"),
        }
    }
}

/// Half-open time window `[since, until)`; a missing bound is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeWindow {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// The whole history.
    pub fn all_time() -> Self {
        Self::default()
    }

    /// Everything at or after `since`.
    pub fn since(since: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: None,
        }
    }

    /// Everything in `[since, until)`.
    pub fn between(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: Some(until),
        }
    }

    /// Whether `ts` falls inside the window.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.since.is_none_or(|since| ts >= since) && self.until.is_none_or(|until| ts < until)
    }
}

/// A grouped aggregate over one metric source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricQuery {
    pub source: MetricSource,
    pub aggregate: Aggregate,
    pub filter: Option<DimensionFilter>,
    pub window: TimeWindow,
}

impl MetricQuery {
    /// Counts events from `source`.
    pub fn count(source: MetricSource) -> Self {
        Self {
            source,
            aggregate: Aggregate::Count,
            filter: None,
            window: TimeWindow::all_time(),
        }
    }

    /// Sums the value of events from `source`.
    pub fn sum(source: MetricSource) -> Self {
        Self {
            aggregate: Aggregate::Sum,
            ..Self::count(source)
        }
    }

    /// Restricts the query to one dimension value.
    pub fn filter(mut self, filter: DimensionFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Restricts the query to a time window.
    pub fn window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }
}

/// One non-empty bucket of a sparse series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparsePoint {
    pub key: BucketKey,
    pub value: f64,
}

impl SparsePoint {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: BucketKey::new(key),
            value,
        }
    }
}

/// Entity that purchases are grouped by for rankings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityGrouping {
    Asset,
    Category,
}

/// Purchase counts grouped by entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingQuery {
    pub grouping: EntityGrouping,
    pub window: TimeWindow,
}

impl RankingQuery {
    pub fn new(grouping: EntityGrouping) -> Self {
        Self {
            grouping,
            window: TimeWindow::all_time(),
        }
    }

    pub fn window(mut self, window: TimeWindow) -> Self {
        self.window = window;
        self
    }
}

/// An aggregate value for one entity, with its display label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityAggregate {
    pub entity_id: i64,
    pub label: String,
    pub value: f64,
}

impl EntityAggregate {
    pub fn new(entity_id: i64, label: impl Into<String>, value: f64) -> Self {
        Self {
            entity_id,
            label: label.into(),
            value,
        }
    }
}

/// Kinds of user activity surfaced in the recent-activity feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    AssetPurchase,
    DiaryPage,
    ForumPost,
    AwardGrant,
    ChatMessage,
}

impl ActivityKind {
    /// Every activity kind, in display order.
    pub const ALL: [ActivityKind; 5] = [
        ActivityKind::DiaryPage,
        ActivityKind::ForumPost,
        ActivityKind::AssetPurchase,
        ActivityKind::AwardGrant,
        ActivityKind::ChatMessage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::AssetPurchase => "asset_purchase",
            ActivityKind::DiaryPage => "diary_page",
            ActivityKind::ForumPost => "forum_post",
            ActivityKind::AwardGrant => "award_grant",
            ActivityKind::ChatMessage => "chat_message",
        }
    }

    /// Chart label used by the activity distribution.
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::AssetPurchase => "Asset Purchases",
            ActivityKind::DiaryPage => "Diary Pages",
            ActivityKind::ForumPost => "Forum Posts",
            ActivityKind::AwardGrant => "Awards",
            ActivityKind::ChatMessage => "Chat Messages",
        }
    }

    /// The metric source counting events of this kind.
    pub fn source(&self) -> MetricSource {
        match self {
            ActivityKind::AssetPurchase => MetricSource::AssetPurchases,
            ActivityKind::DiaryPage => MetricSource::DiaryPages,
            ActivityKind::ForumPost => MetricSource::ForumPosts,
            ActivityKind::AwardGrant => MetricSource::AwardGrants,
            ActivityKind::ChatMessage => MetricSource::ChatMessages,
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user activity, carrying only the fields its kind needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Activity {
    AssetPurchase {
        id: i64,
        user: String,
        asset: String,
        price: f64,
        at: DateTime<Utc>,
    },
    DiaryPage {
        id: i64,
        user: String,
        diary: String,
        at: DateTime<Utc>,
    },
    ForumPost {
        id: i64,
        user: String,
        title: String,
        at: DateTime<Utc>,
    },
    AwardGrant {
        id: i64,
        user: String,
        award: String,
        at: DateTime<Utc>,
    },
    ChatMessage {
        id: i64,
        user: String,
        recipient: String,
        at: DateTime<Utc>,
    },
}

impl Activity {
    pub fn kind(&self) -> ActivityKind {
        match self {
            Activity::AssetPurchase { .. } => ActivityKind::AssetPurchase,
            Activity::DiaryPage { .. } => ActivityKind::DiaryPage,
            Activity::ForumPost { .. } => ActivityKind::ForumPost,
            Activity::AwardGrant { .. } => ActivityKind::AwardGrant,
            Activity::ChatMessage { .. } => ActivityKind::ChatMessage,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Activity::AssetPurchase { id, .. }
            | Activity::DiaryPage { id, .. }
            | Activity::ForumPost { id, .. }
            | Activity::AwardGrant { id, .. }
            | Activity::ChatMessage { id, .. } => *id,
        }
    }

    /// Display name of the acting user.
    pub fn user(&self) -> &str {
        match self {
            Activity::AssetPurchase { user, .. }
            | Activity::DiaryPage { user, .. }
            | Activity::ForumPost { user, .. }
            | Activity::AwardGrant { user, .. }
            | Activity::ChatMessage { user, .. } => user,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Activity::AssetPurchase { at, .. }
            | Activity::DiaryPage { at, .. }
            | Activity::ForumPost { at, .. }
            | Activity::AwardGrant { at, .. }
            | Activity::ChatMessage { at, .. } => *at,
        }
    }

    /// One-line, human-readable description of the activity.
    pub fn summary(&self) -> String {
        match self {
            Activity::AssetPurchase { asset, price, .. } if *price > 0.0 => {
                format!("Purchased {asset} for {price:.2}")
            }
            Activity::AssetPurchase { asset, .. } => format!("Unlocked free asset {asset}"),
            Activity::DiaryPage { diary, .. } => format!("Wrote a new page in {diary}"),
            Activity::ForumPost { title, .. } => format!("Posted \"{title}\" in the forum"),
            Activity::AwardGrant { award, .. } => format!("Received the {award} award"),
            Activity::ChatMessage { recipient, .. } => format!("Sent a message to {recipient}"),
        }
    }
}
