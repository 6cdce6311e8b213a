//! Analytics API service.
//!
//! One method per analytics endpoint. Every call recomputes from the store;
//! independent fetches within a call run concurrently and the first failure
//! fails the whole call.

use crate::AnalyticsConfig;
use crate::activity::{ActivityRecord, assemble};
use crate::align::align_all;
use crate::buckets::WindowPolicy;
use crate::compare::{Comparison, ComparisonWindows};
use crate::fetcher::MetricFetcher;
use crate::ranking::rank;
use crate::stats::{ChartData, DashboardStats, LabeledValues, RevenueData};
use std::sync::Arc;
use tokio::task::JoinSet;
use tutorhub_core::{
    ActivityKind, AnalyticsError, AnalyticsResult, AssetTier, Clock, DimensionFilter,
    EntityGrouping, MetricQuery, MetricSource, MetricStore, Period, RankingQuery, SystemClock,
    TimeWindow, UserRole,
};

/// Analytics API service.
#[derive(Clone)]
pub struct AnalyticsApi {
    fetcher: MetricFetcher,
    clock: Arc<dyn Clock>,
    config: AnalyticsConfig,
}

impl AnalyticsApi {
    /// Creates a new analytics API over `store`, using wall-clock time.
    pub fn new(store: Arc<dyn MetricStore>, config: AnalyticsConfig) -> Self {
        Self::with_clock(store, Arc::new(SystemClock), config)
    }

    /// Creates a new analytics API with an explicit clock.
    pub fn with_clock(
        store: Arc<dyn MetricStore>,
        clock: Arc<dyn Clock>,
        config: AnalyticsConfig,
    ) -> Self {
        Self {
            fetcher: MetricFetcher::new(store),
            clock,
            config,
        }
    }

    /// Gets the configuration.
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Checks that the underlying store is reachable.
    pub async fn health(&self) -> AnalyticsResult<()> {
        self.fetcher.store().health_check().await
    }

    /// Dashboard cards: this window against the one before it.
    pub async fn dashboard(&self) -> AnalyticsResult<DashboardStats> {
        let windows =
            ComparisonWindows::trailing(self.clock.now(), self.config.comparison_window_days);

        let students = MetricQuery::count(MetricSource::UserRegistrations)
            .filter(DimensionFilter::Role(UserRole::Student));
        let tutors = MetricQuery::count(MetricSource::UserRegistrations)
            .filter(DimensionFilter::Role(UserRole::Tutor));
        let assets = MetricQuery::count(MetricSource::AssetPurchases);
        let revenue = MetricQuery::sum(MetricSource::AssetPurchases);

        let (students, tutors, assets, revenue) = tokio::try_join!(
            self.compare("students", students, windows),
            self.compare("tutors", tutors, windows),
            self.compare("assets", assets, windows),
            self.compare("revenue", revenue, windows),
        )?;

        tracing::info!(
            students = students.current,
            tutors = tutors.current,
            "Computed dashboard stats"
        );

        Ok(DashboardStats {
            students: students.into(),
            tutors: tutors.into(),
            assets: assets.into(),
            revenue: revenue.into(),
        })
    }

    async fn compare(
        &self,
        series: &str,
        query: MetricQuery,
        windows: ComparisonWindows,
    ) -> AnalyticsResult<Comparison> {
        let current = query.clone().window(windows.current);
        let previous = query.window(windows.previous);
        let (current, previous) = tokio::try_join!(
            self.fetcher.total(series, &current),
            self.fetcher.total(series, &previous),
        )?;
        Ok(Comparison::of(current, previous))
    }

    /// Student and tutor registrations per bucket.
    pub async fn user_growth(&self, period: Period) -> AnalyticsResult<ChartData> {
        let buckets = WindowPolicy::Growth
            .window(period)
            .generate_at(self.clock.now());

        let (students, tutors) = tokio::try_join!(
            self.fetcher.bucketed(
                "Students",
                MetricQuery::count(MetricSource::UserRegistrations)
                    .filter(DimensionFilter::Role(UserRole::Student)),
                &buckets,
            ),
            self.fetcher.bucketed(
                "Tutors",
                MetricQuery::count(MetricSource::UserRegistrations)
                    .filter(DimensionFilter::Role(UserRole::Tutor)),
                &buckets,
            ),
        )?;

        tracing::debug!(%period, buckets = buckets.len(), "Computed user growth");
        Ok(ChartData::from_series(
            buckets.labels(),
            align_all(&buckets, &[students, tutors]),
        ))
    }

    /// All-time event counts per activity kind.
    pub async fn activity_distribution(&self) -> AnalyticsResult<LabeledValues> {
        let mut tasks = JoinSet::new();
        for (position, kind) in ActivityKind::ALL.into_iter().enumerate() {
            let fetcher = self.fetcher.clone();
            tasks.spawn(async move {
                let query = MetricQuery::count(kind.source());
                let value = fetcher.total(kind.as_str(), &query).await?;
                Ok::<_, AnalyticsError>((position, kind, value))
            });
        }

        let mut counts = Vec::with_capacity(ActivityKind::ALL.len());
        while let Some(joined) = tasks.join_next().await {
            counts.push(joined.map_err(|e| AnalyticsError::internal(e.to_string()))??);
        }
        counts.sort_by_key(|(position, _, _)| *position);

        let mut distribution = LabeledValues::default();
        for (_, kind, value) in counts {
            distribution.push(kind.label(), value);
        }
        Ok(distribution)
    }

    /// Free and premium asset purchases per bucket.
    pub async fn asset_usage(&self, period: Period) -> AnalyticsResult<ChartData> {
        let buckets = WindowPolicy::Usage
            .window(period)
            .generate_at(self.clock.now());

        let (free, premium) = tokio::try_join!(
            self.fetcher.bucketed(
                "Free",
                MetricQuery::count(MetricSource::AssetPurchases)
                    .filter(DimensionFilter::AssetTier(AssetTier::Free)),
                &buckets,
            ),
            self.fetcher.bucketed(
                "Premium",
                MetricQuery::count(MetricSource::AssetPurchases)
                    .filter(DimensionFilter::AssetTier(AssetTier::Premium)),
                &buckets,
            ),
        )?;

        tracing::debug!(%period, buckets = buckets.len(), "Computed asset usage");
        Ok(ChartData::from_series(
            buckets.labels(),
            align_all(&buckets, &[free, premium]),
        ))
    }

    /// Most purchased assets.
    pub async fn top_assets(&self, limit: usize) -> AnalyticsResult<LabeledValues> {
        self.top(EntityGrouping::Asset, "top_assets", limit).await
    }

    /// Categories with the most purchases.
    pub async fn top_categories(&self, limit: usize) -> AnalyticsResult<LabeledValues> {
        self.top(EntityGrouping::Category, "top_categories", limit)
            .await
    }

    async fn top(
        &self,
        grouping: EntityGrouping,
        series: &str,
        limit: usize,
    ) -> AnalyticsResult<LabeledValues> {
        let query = RankingQuery::new(grouping).window(TimeWindow::all_time());
        let rows = self.fetcher.by_entity(series, &query).await?;
        let candidates = rows.len();
        let ranked = rank(rows, limit);

        tracing::debug!(series, limit, candidates, "Computed ranking");
        Ok(ranked.into())
    }

    /// Purchase revenue per bucket, with the total over the window.
    pub async fn revenue(&self, period: Period) -> AnalyticsResult<RevenueData> {
        let buckets = WindowPolicy::Growth
            .window(period)
            .generate_at(self.clock.now());

        let revenue = self
            .fetcher
            .bucketed("Revenue", MetricQuery::sum(MetricSource::AssetPurchases), &buckets)
            .await?;

        let series = align_all(&buckets, &[revenue]);
        let total_revenue = series.iter().map(|s| s.total()).sum();

        Ok(RevenueData {
            chart: ChartData::from_series(buckets.labels(), series).filled(),
            total_revenue,
        })
    }

    /// The latest activities across every configured kind.
    pub async fn recent_activities(&self, limit: usize) -> AnalyticsResult<Vec<ActivityRecord>> {
        let mut tasks = JoinSet::new();
        for kind in self.config.activity_kinds.iter().copied() {
            let fetcher = self.fetcher.clone();
            tasks.spawn(async move { fetcher.recent(kind, limit).await });
        }

        let mut batches = Vec::with_capacity(self.config.activity_kinds.len());
        while let Some(joined) = tasks.join_next().await {
            batches.push(joined.map_err(|e| AnalyticsError::internal(e.to_string()))??);
        }

        Ok(assemble(batches, limit))
    }
}
