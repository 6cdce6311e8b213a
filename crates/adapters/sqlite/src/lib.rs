//! # TutorHub SQLite Store
//!
//! A [`MetricStore`] backed by SQLite through `sqlx`. Every analytics query
//! is a single grouped `SELECT`; nothing here writes except the seeding
//! helpers and [`SqliteStore::migrate`].
//!
//! ```rust,ignore
//! let store = SqliteStore::connect("sqlite://tutorhub.db", 5).await?;
//! store.migrate().await?;
//! ```

mod schema;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tutorhub_core::records::{
    AssetRecord, AwardRecord, CategoryRecord, ChatMessageRecord, DiaryPageRecord,
    ForumPostRecord, PurchaseRecord, UserRecord,
};
use tutorhub_core::{
    Activity, ActivityKind, Aggregate, AnalyticsError, AnalyticsResult, DimensionFilter,
    EntityAggregate, EntityGrouping, Granularity, MetricQuery, MetricStore, RankingQuery,
    SparsePoint, TimeWindow,
};

fn db_error(err: sqlx::Error) -> AnalyticsError {
    AnalyticsError::database(err.to_string())
}

/// SQLite-backed metric store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens a pool on `url`, creating the database file if needed.
    ///
    /// In-memory databases are private to a connection, so they are
    /// always opened with a single connection that is never recycled.
    pub async fn connect(url: &str, max_connections: u32) -> AnalyticsResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_error)?
            .create_if_missing(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let mut pool = SqlitePoolOptions::new();
        pool = if in_memory {
            pool.max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            pool.max_connections(max_connections.max(1))
        };

        let pool = pool.connect_with(options).await.map_err(db_error)?;
        tracing::info!(url, in_memory, "connected to sqlite");
        Ok(Self { pool })
    }

    /// Creates the tables and indexes analytics reads, if missing.
    pub async fn migrate(&self) -> AnalyticsResult<()> {
        for statement in schema::MIGRATIONS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_error)?;
        }
        tracing::debug!(statements = schema::MIGRATIONS.len(), "sqlite schema ready");
        Ok(())
    }

    pub async fn insert_user(&self, user: &UserRecord) -> AnalyticsResult<()> {
        sqlx::query("INSERT INTO users (id, name, role, created_at) VALUES (?, ?, ?, ?)")
            .bind(user.id)
            .bind(&user.name)
            .bind(user.role.as_str())
            .bind(user.created_at.timestamp())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    pub async fn insert_category(&self, category: &CategoryRecord) -> AnalyticsResult<()> {
        sqlx::query("INSERT INTO categories (id, name) VALUES (?, ?)")
            .bind(category.id)
            .bind(&category.name)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    pub async fn insert_asset(&self, asset: &AssetRecord) -> AnalyticsResult<()> {
        sqlx::query("INSERT INTO assets (id, name, is_free, category_id) VALUES (?, ?, ?, ?)")
            .bind(asset.id)
            .bind(&asset.name)
            .bind(asset.is_free)
            .bind(asset.category_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    pub async fn insert_purchase(&self, purchase: &PurchaseRecord) -> AnalyticsResult<()> {
        sqlx::query(
            "INSERT INTO user_assets (id, user_id, asset_id, price, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(purchase.id)
        .bind(purchase.user_id)
        .bind(purchase.asset_id)
        .bind(purchase.price)
        .bind(purchase.created_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    pub async fn insert_diary_page(&self, page: &DiaryPageRecord) -> AnalyticsResult<()> {
        sqlx::query(
            "INSERT INTO diary_pages (id, user_id, diary_title, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(page.id)
        .bind(page.user_id)
        .bind(&page.diary_title)
        .bind(page.created_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    pub async fn insert_forum_post(&self, post: &ForumPostRecord) -> AnalyticsResult<()> {
        sqlx::query("INSERT INTO forum_posts (id, user_id, title, created_at) VALUES (?, ?, ?, ?)")
            .bind(post.id)
            .bind(post.user_id)
            .bind(&post.title)
            .bind(post.created_at.timestamp())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    pub async fn insert_award(&self, award: &AwardRecord) -> AnalyticsResult<()> {
        sqlx::query("INSERT INTO awards (id, user_id, award_name, created_at) VALUES (?, ?, ?, ?)")
            .bind(award.id)
            .bind(award.user_id)
            .bind(&award.award_name)
            .bind(award.created_at.timestamp())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    pub async fn insert_chat_message(&self, message: &ChatMessageRecord) -> AnalyticsResult<()> {
        sqlx::query(
            "INSERT INTO chat_messages (id, sender_id, recipient_id, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(message.id)
        .bind(message.sender_id)
        .bind(message.recipient_id)
        .bind(message.created_at.timestamp())
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }
}

fn aggregate_expr(query: &MetricQuery) -> &'static str {
    match (query.aggregate, query.source) {
        (Aggregate::Count, _) => "CAST(COUNT(*) AS REAL)",
        (Aggregate::Sum, tutorhub_core::MetricSource::AssetPurchases) => "TOTAL(e.price)",
        (Aggregate::Sum, _) => "0.0",
    }
}

fn push_window(qb: &mut QueryBuilder<'_, Sqlite>, window: &TimeWindow) {
    if let Some(since) = window.since {
        qb.push(" AND e.created_at >= ").push_bind(since.timestamp());
    }
    if let Some(until) = window.until {
        qb.push(" AND e.created_at < ").push_bind(until.timestamp());
    }
}

fn push_conditions(qb: &mut QueryBuilder<'_, Sqlite>, query: &MetricQuery) -> AnalyticsResult<()> {
    qb.push(" WHERE 1=1");
    push_window(qb, &query.window);

    if let Some(filter) = query.filter {
        if !filter.applies_to(query.source) {
            return Err(AnalyticsError::internal(format!(
                "filter {filter} does not apply to {}",
                query.source
            )));
        }
        match filter {
            DimensionFilter::Role(role) => {
                qb.push(" AND e.role = ").push_bind(role.as_str());
            }
            DimensionFilter::AssetTier(tier) => {
                qb.push(" AND a.is_free = ").push_bind(tier.is_free());
            }
            DimensionFilter::Category(id) => {
                qb.push(" AND a.category_id = ").push_bind(id);
            }
        }
    }
    Ok(())
}

fn to_utc(secs: i64) -> AnalyticsResult<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| AnalyticsError::internal(format!("timestamp {secs} out of range")))
}

#[async_trait]
impl MetricStore for SqliteStore {
    async fn aggregate_by_bucket(
        &self,
        query: &MetricQuery,
        granularity: Granularity,
    ) -> AnalyticsResult<Vec<SparsePoint>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT strftime(");
        qb.push_bind(granularity.key_format())
            .push(", e.created_at, 'unixepoch') AS bucket, ")
            .push(aggregate_expr(query))
            .push(" AS value FROM ")
            .push(schema::source_from(query.source));
        push_conditions(&mut qb, query)?;
        qb.push(" GROUP BY bucket ORDER BY bucket");

        let rows: Vec<(String, f64)> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|(key, value)| SparsePoint::new(key, value))
            .collect())
    }

    async fn aggregate_total(&self, query: &MetricQuery) -> AnalyticsResult<f64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
        qb.push(aggregate_expr(query))
            .push(" FROM ")
            .push(schema::source_from(query.source));
        push_conditions(&mut qb, query)?;

        let (total,): (f64,) = qb
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(total)
    }

    async fn aggregate_by_entity(
        &self,
        query: &RankingQuery,
    ) -> AnalyticsResult<Vec<EntityAggregate>> {
        let mut qb = QueryBuilder::<Sqlite>::new(match query.grouping {
            EntityGrouping::Asset => {
                "SELECT a.id, a.name, CAST(COUNT(*) AS REAL) \
                 FROM user_assets e JOIN assets a ON a.id = e.asset_id"
            }
            EntityGrouping::Category => {
                "SELECT c.id, c.name, CAST(COUNT(*) AS REAL) \
                 FROM user_assets e JOIN assets a ON a.id = e.asset_id \
                 JOIN categories c ON c.id = a.category_id"
            }
        });
        qb.push(" WHERE 1=1");
        push_window(&mut qb, &query.window);
        qb.push(match query.grouping {
            EntityGrouping::Asset => " GROUP BY a.id, a.name ORDER BY a.id",
            EntityGrouping::Category => " GROUP BY c.id, c.name ORDER BY c.id",
        });

        let rows: Vec<(i64, String, f64)> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(rows
            .into_iter()
            .map(|(id, label, value)| EntityAggregate::new(id, label, value))
            .collect())
    }

    async fn recent_activities(
        &self,
        kind: ActivityKind,
        limit: usize,
    ) -> AnalyticsResult<Vec<Activity>> {
        let mut qb = QueryBuilder::<Sqlite>::new(schema::recent_select(kind));
        qb.push(" ORDER BY e.created_at DESC, e.id DESC LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));

        let rows: Vec<(i64, String, String, f64, i64)> = qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.into_iter()
            .map(|(id, user, detail, price, created_at)| {
                let at = to_utc(created_at)?;
                Ok(match kind {
                    ActivityKind::AssetPurchase => Activity::AssetPurchase {
                        id,
                        user,
                        asset: detail,
                        price,
                        at,
                    },
                    ActivityKind::DiaryPage => Activity::DiaryPage {
                        id,
                        user,
                        diary: detail,
                        at,
                    },
                    ActivityKind::ForumPost => Activity::ForumPost {
                        id,
                        user,
                        title: detail,
                        at,
                    },
                    ActivityKind::AwardGrant => Activity::AwardGrant {
                        id,
                        user,
                        award: detail,
                        at,
                    },
                    ActivityKind::ChatMessage => Activity::ChatMessage {
                        id,
                        user,
                        recipient: detail,
                        at,
                    },
                })
            })
            .collect()
    }

    async fn health_check(&self) -> AnalyticsResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let store = SqliteStore::connect("sqlite::memory:", 5).await.unwrap();
        store.migrate().await.unwrap();
        store.migrate().await.unwrap();
        assert!(store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_queries_fail_without_schema() {
        let store = SqliteStore::connect("sqlite::memory:", 1).await.unwrap();
        let query = MetricQuery::count(tutorhub_core::MetricSource::UserRegistrations);

        let err = store.aggregate_total(&query).await.unwrap_err();
        assert!(err.is_storage_error());
    }
}
