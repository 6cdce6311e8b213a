//! # TutorHub Memory Store
//!
//! An in-memory metric store for TutorHub analytics, primarily intended
//! for testing and local development.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tutorhub_store_memory::MemoryStore;
//!
//! let store = MemoryStore::new();
//! store.insert_user(UserRecord::new(1, "Ada", UserRole::Student, Utc::now())).await;
//! let api = AnalyticsApi::new(Arc::new(store), AnalyticsConfig::default());
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tutorhub_core::records::{
    AssetRecord, AwardRecord, CategoryRecord, ChatMessageRecord, DiaryPageRecord,
    ForumPostRecord, PurchaseRecord, UserRecord,
};
use tutorhub_core::{
    Activity, ActivityKind, Aggregate, AnalyticsError, AnalyticsResult, AssetTier, BucketKey,
    DimensionFilter, EntityAggregate, EntityGrouping, Granularity, MetricQuery, MetricSource,
    MetricStore, RankingQuery, SparsePoint, UserRole,
};

/// In-memory storage for a single table, keyed and ordered by id.
type Table<T> = Arc<RwLock<BTreeMap<i64, T>>>;

/// In-memory metric store.
///
/// Data is lost when the process exits. Failures can be injected per
/// metric source to exercise error paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: Table<UserRecord>,
    categories: Table<CategoryRecord>,
    assets: Table<AssetRecord>,
    purchases: Table<PurchaseRecord>,
    diary_pages: Table<DiaryPageRecord>,
    forum_posts: Table<ForumPostRecord>,
    awards: Table<AwardRecord>,
    chat_messages: Table<ChatMessageRecord>,
    failures: Arc<RwLock<Failures>>,
}

#[derive(Debug, Default)]
struct Failures {
    all: Option<String>,
    sources: HashMap<MetricSource, String>,
}

/// The fields of one event that queries filter and aggregate on.
struct Event {
    at: DateTime<Utc>,
    value: f64,
    role: Option<UserRole>,
    tier: Option<AssetTier>,
    category_id: Option<i64>,
}

impl Event {
    fn matches(&self, filter: Option<&DimensionFilter>) -> bool {
        match filter {
            None => true,
            Some(DimensionFilter::Role(role)) => self.role == Some(*role),
            Some(DimensionFilter::AssetTier(tier)) => self.tier == Some(*tier),
            Some(DimensionFilter::Category(id)) => self.category_id == Some(*id),
        }
    }

    fn weight(&self, aggregate: Aggregate) -> f64 {
        match aggregate {
            Aggregate::Count => 1.0,
            Aggregate::Sum => self.value,
        }
    }
}

impl MemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all stored data and injected failures.
    pub async fn clear(&self) {
        self.users.write().await.clear();
        self.categories.write().await.clear();
        self.assets.write().await.clear();
        self.purchases.write().await.clear();
        self.diary_pages.write().await.clear();
        self.forum_posts.write().await.clear();
        self.awards.write().await.clear();
        self.chat_messages.write().await.clear();
        *self.failures.write().await = Failures::default();
    }

    pub async fn insert_user(&self, user: UserRecord) {
        self.users.write().await.insert(user.id, user);
    }

    pub async fn insert_category(&self, category: CategoryRecord) {
        self.categories.write().await.insert(category.id, category);
    }

    pub async fn insert_asset(&self, asset: AssetRecord) {
        self.assets.write().await.insert(asset.id, asset);
    }

    pub async fn insert_purchase(&self, purchase: PurchaseRecord) {
        self.purchases.write().await.insert(purchase.id, purchase);
    }

    pub async fn insert_diary_page(&self, page: DiaryPageRecord) {
        self.diary_pages.write().await.insert(page.id, page);
    }

    pub async fn insert_forum_post(&self, post: ForumPostRecord) {
        self.forum_posts.write().await.insert(post.id, post);
    }

    pub async fn insert_award(&self, award: AwardRecord) {
        self.awards.write().await.insert(award.id, award);
    }

    pub async fn insert_chat_message(&self, message: ChatMessageRecord) {
        self.chat_messages.write().await.insert(message.id, message);
    }

    /// Makes every query fail with `message`.
    pub async fn fail_all(&self, message: impl Into<String>) {
        self.failures.write().await.all = Some(message.into());
    }

    /// Makes queries over `source` fail with `message`.
    pub async fn fail_source(&self, source: MetricSource, message: impl Into<String>) {
        self.failures
            .write()
            .await
            .sources
            .insert(source, message.into());
    }

    /// Returns the number of users stored.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    async fn check(&self, source: Option<MetricSource>) -> AnalyticsResult<()> {
        let failures = self.failures.read().await;
        if let Some(message) = &failures.all {
            return Err(AnalyticsError::database(message.clone()));
        }
        match source.and_then(|s| failures.sources.get(&s)) {
            Some(message) => Err(AnalyticsError::database(message.clone())),
            None => Ok(()),
        }
    }

    async fn user_name(&self, id: i64) -> String {
        self.users
            .read()
            .await
            .get(&id)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| format!("User #{id}"))
    }

    async fn events(&self, query: &MetricQuery) -> AnalyticsResult<Vec<Event>> {
        self.check(Some(query.source)).await?;
        if let Some(filter) = &query.filter {
            if !filter.applies_to(query.source) {
                return Err(AnalyticsError::internal(format!(
                    "filter {filter} does not apply to {}",
                    query.source
                )));
            }
        }

        let plain = |at: DateTime<Utc>| Event {
            at,
            value: 0.0,
            role: None,
            tier: None,
            category_id: None,
        };

        let events: Vec<Event> = match query.source {
            MetricSource::UserRegistrations => self
                .users
                .read()
                .await
                .values()
                .map(|u| Event {
                    role: Some(u.role),
                    ..plain(u.created_at)
                })
                .collect(),
            MetricSource::AssetPurchases => {
                let assets = self.assets.read().await;
                let purchases = self.purchases.read().await;
                let events = purchases
                    .values()
                    .map(|p| {
                        let asset = assets.get(&p.asset_id);
                        Event {
                            value: p.price,
                            tier: asset.map(|a| AssetTier::from_is_free(a.is_free)),
                            category_id: asset.and_then(|a| a.category_id),
                            ..plain(p.created_at)
                        }
                    })
                    .collect();
                events
            }
            MetricSource::DiaryPages => self
                .diary_pages
                .read()
                .await
                .values()
                .map(|r| plain(r.created_at))
                .collect(),
            MetricSource::ForumPosts => self
                .forum_posts
                .read()
                .await
                .values()
                .map(|r| plain(r.created_at))
                .collect(),
            MetricSource::AwardGrants => self
                .awards
                .read()
                .await
                .values()
                .map(|r| plain(r.created_at))
                .collect(),
            MetricSource::ChatMessages => self
                .chat_messages
                .read()
                .await
                .values()
                .map(|r| plain(r.created_at))
                .collect(),
        };

        Ok(events
            .into_iter()
            .filter(|e| query.window.contains(e.at) && e.matches(query.filter.as_ref()))
            .collect())
    }
}

#[async_trait]
impl MetricStore for MemoryStore {
    async fn aggregate_by_bucket(
        &self,
        query: &MetricQuery,
        granularity: Granularity,
    ) -> AnalyticsResult<Vec<SparsePoint>> {
        let mut buckets: BTreeMap<BucketKey, f64> = BTreeMap::new();
        for event in self.events(query).await? {
            *buckets
                .entry(BucketKey::from_timestamp(event.at, granularity))
                .or_default() += event.weight(query.aggregate);
        }

        Ok(buckets
            .into_iter()
            .map(|(key, value)| SparsePoint { key, value })
            .collect())
    }

    async fn aggregate_total(&self, query: &MetricQuery) -> AnalyticsResult<f64> {
        Ok(self
            .events(query)
            .await?
            .iter()
            .map(|e| e.weight(query.aggregate))
            .sum())
    }

    async fn aggregate_by_entity(
        &self,
        query: &RankingQuery,
    ) -> AnalyticsResult<Vec<EntityAggregate>> {
        self.check(Some(MetricSource::AssetPurchases)).await?;

        let assets = self.assets.read().await;
        let categories = self.categories.read().await;
        let mut grouped: BTreeMap<i64, EntityAggregate> = BTreeMap::new();

        for purchase in self.purchases.read().await.values() {
            if !query.window.contains(purchase.created_at) {
                continue;
            }
            let Some(asset) = assets.get(&purchase.asset_id) else {
                continue;
            };
            let (entity_id, label) = match query.grouping {
                EntityGrouping::Asset => (asset.id, asset.name.clone()),
                EntityGrouping::Category => {
                    let Some(category) = asset.category_id.and_then(|id| categories.get(&id))
                    else {
                        continue;
                    };
                    (category.id, category.name.clone())
                }
            };
            grouped
                .entry(entity_id)
                .or_insert_with(|| EntityAggregate::new(entity_id, label, 0.0))
                .value += 1.0;
        }

        Ok(grouped.into_values().collect())
    }

    async fn recent_activities(
        &self,
        kind: ActivityKind,
        limit: usize,
    ) -> AnalyticsResult<Vec<Activity>> {
        self.check(Some(kind.source())).await?;

        let mut activities = Vec::new();
        match kind {
            ActivityKind::AssetPurchase => {
                let assets = self.assets.read().await;
                for p in self.purchases.read().await.values() {
                    activities.push(Activity::AssetPurchase {
                        id: p.id,
                        user: self.user_name(p.user_id).await,
                        asset: assets
                            .get(&p.asset_id)
                            .map(|a| a.name.clone())
                            .unwrap_or_else(|| format!("Asset #{}", p.asset_id)),
                        price: p.price,
                        at: p.created_at,
                    });
                }
            }
            ActivityKind::DiaryPage => {
                for r in self.diary_pages.read().await.values() {
                    activities.push(Activity::DiaryPage {
                        id: r.id,
                        user: self.user_name(r.user_id).await,
                        diary: r.diary_title.clone(),
                        at: r.created_at,
                    });
                }
            }
            ActivityKind::ForumPost => {
                for r in self.forum_posts.read().await.values() {
                    activities.push(Activity::ForumPost {
                        id: r.id,
                        user: self.user_name(r.user_id).await,
                        title: r.title.clone(),
                        at: r.created_at,
                    });
                }
            }
            ActivityKind::AwardGrant => {
                for r in self.awards.read().await.values() {
                    activities.push(Activity::AwardGrant {
                        id: r.id,
                        user: self.user_name(r.user_id).await,
                        award: r.award_name.clone(),
                        at: r.created_at,
                    });
                }
            }
            ActivityKind::ChatMessage => {
                for r in self.chat_messages.read().await.values() {
                    activities.push(Activity::ChatMessage {
                        id: r.id,
                        user: self.user_name(r.sender_id).await,
                        recipient: self.user_name(r.recipient_id).await,
                        at: r.created_at,
                    });
                }
            }
        }

        activities.sort_by(|a, b| {
            b.timestamp()
                .cmp(&a.timestamp())
                .then_with(|| b.id().cmp(&a.id()))
        });
        activities.truncate(limit);
        Ok(activities)
    }

    async fn health_check(&self) -> AnalyticsResult<()> {
        self.check(None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tutorhub_core::TimeWindow;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_user(UserRecord::new(1, "Ada", UserRole::Student, at(1, 9))).await;
        store.insert_user(UserRecord::new(2, "Grace", UserRole::Student, at(1, 17))).await;
        store.insert_user(UserRecord::new(3, "Alan", UserRole::Tutor, at(3, 8))).await;
        store.insert_category(CategoryRecord::new(10, "Skins")).await;
        store.insert_asset(AssetRecord::new(100, "Ocean Skin", false, Some(10))).await;
        store.insert_asset(AssetRecord::new(101, "Starter Pack", true, None)).await;
        store.insert_purchase(PurchaseRecord::new(1, 1, 100, 4.5, at(2, 10))).await;
        store.insert_purchase(PurchaseRecord::new(2, 2, 100, 4.5, at(3, 11))).await;
        store.insert_purchase(PurchaseRecord::new(3, 2, 101, 0.0, at(3, 12))).await;
        store
    }

    #[tokio::test]
    async fn test_count_by_day_with_role_filter() {
        let store = seeded().await;
        let query = MetricQuery::count(MetricSource::UserRegistrations)
            .filter(DimensionFilter::Role(UserRole::Student));

        let points = store.aggregate_by_bucket(&query, Granularity::Day).await.unwrap();
        assert_eq!(points, vec![SparsePoint::new("2024-03-01", 2.0)]);
    }

    #[tokio::test]
    async fn test_sum_respects_window() {
        let store = seeded().await;
        let query = MetricQuery::sum(MetricSource::AssetPurchases)
            .window(TimeWindow::between(at(3, 0), at(4, 0)));

        assert_eq!(store.aggregate_total(&query).await.unwrap(), 4.5);
    }

    #[tokio::test]
    async fn test_tier_filter() {
        let store = seeded().await;
        let query = MetricQuery::count(MetricSource::AssetPurchases)
            .filter(DimensionFilter::AssetTier(AssetTier::Free));

        assert_eq!(store.aggregate_total(&query).await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_inapplicable_filter_rejected() {
        let store = seeded().await;
        let query = MetricQuery::count(MetricSource::DiaryPages)
            .filter(DimensionFilter::Role(UserRole::Tutor));

        assert!(store.aggregate_total(&query).await.is_err());
    }

    #[tokio::test]
    async fn test_group_by_category_skips_uncategorised() {
        let store = seeded().await;
        let rows = store
            .aggregate_by_entity(&RankingQuery::new(EntityGrouping::Category))
            .await
            .unwrap();

        assert_eq!(rows, vec![EntityAggregate::new(10, "Skins", 2.0)]);
    }

    #[tokio::test]
    async fn test_recent_purchases_newest_first() {
        let store = seeded().await;
        let activities = store
            .recent_activities(ActivityKind::AssetPurchase, 2)
            .await
            .unwrap();

        let ids: Vec<i64> = activities.iter().map(|a| a.id()).collect();
        assert_eq!(ids, vec![3, 2]);
        assert_eq!(activities[0].user(), "Grace");
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = seeded().await;
        store.fail_source(MetricSource::AssetPurchases, "disk on fire").await;

        let purchases = MetricQuery::count(MetricSource::AssetPurchases);
        let users = MetricQuery::count(MetricSource::UserRegistrations);

        assert!(matches!(
            store.aggregate_total(&purchases).await,
            Err(AnalyticsError::Database { .. })
        ));
        assert_eq!(store.aggregate_total(&users).await.unwrap(), 3.0);

        store.clear().await;
        assert_eq!(store.user_count().await, 0);
        assert!(store.health_check().await.is_ok());
    }
}
