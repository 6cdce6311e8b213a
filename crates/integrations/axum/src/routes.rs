//! Route mounting for the analytics endpoints.

use crate::extractor::AdminSession;
use crate::{ApiError, ApiResponse};
use axum::Router;
use axum::extract::{Query, State};
use axum::routing::get;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tutorhub_analytics::{
    ActivityRecord, AnalyticsApi, ChartData, DashboardStats, LabeledValues, RevenueData,
};
use tutorhub_core::Period;

/// Raw `?period=` parameter; anything unrecognised means `month`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeriodParams {
    pub period: Option<String>,
}

impl PeriodParams {
    pub fn period(&self) -> Period {
        Period::parse_or_default(self.period.as_deref())
    }
}

/// Raw `?limit=` parameter, resolved against the analytics config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitParams {
    pub limit: Option<String>,
}

/// Creates an Axum router with all analytics routes plus `/health`.
///
/// Wrap it in an [`AdminLayer`](crate::AdminLayer); every route except
/// `/health` requires an admin session.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .nest("/api", analytics_routes(api))
///     .layer(AdminLayer::new(authenticator));
/// ```
pub fn analytics_routes<S>(api: AnalyticsApi) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/analytics/dashboard", get(dashboard_handler))
        .route("/analytics/users/growth", get(user_growth_handler))
        .route("/analytics/activity/distribution", get(activity_distribution_handler))
        .route("/analytics/assets/usage", get(asset_usage_handler))
        .route("/analytics/assets/top", get(top_assets_handler))
        .route("/analytics/assets/categories/top", get(top_categories_handler))
        .route("/analytics/revenue", get(revenue_handler))
        .route("/analytics/activities/recent", get(recent_activities_handler))
        .with_state(api)
}

type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

async fn health_handler(State(api): State<AnalyticsApi>) -> ApiResult<serde_json::Value> {
    api.health()
        .await
        .map_err(ApiError::context("Storage is unavailable"))?;
    Ok(ApiResponse::ok(json!({ "status": "ok" })))
}

async fn dashboard_handler(
    _admin: AdminSession,
    State(api): State<AnalyticsApi>,
) -> ApiResult<DashboardStats> {
    let stats = api
        .dashboard()
        .await
        .map_err(ApiError::context("Failed to fetch dashboard stats"))?;
    Ok(ApiResponse::ok(stats))
}

async fn user_growth_handler(
    _admin: AdminSession,
    State(api): State<AnalyticsApi>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<ChartData> {
    let chart = api
        .user_growth(params.period())
        .await
        .map_err(ApiError::context("Failed to fetch user growth"))?;
    Ok(ApiResponse::ok(chart))
}

async fn activity_distribution_handler(
    _admin: AdminSession,
    State(api): State<AnalyticsApi>,
) -> ApiResult<LabeledValues> {
    let distribution = api
        .activity_distribution()
        .await
        .map_err(ApiError::context("Failed to fetch activity distribution"))?;
    Ok(ApiResponse::ok(distribution))
}

async fn asset_usage_handler(
    _admin: AdminSession,
    State(api): State<AnalyticsApi>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<ChartData> {
    let chart = api
        .asset_usage(params.period())
        .await
        .map_err(ApiError::context("Failed to fetch asset usage"))?;
    Ok(ApiResponse::ok(chart))
}

async fn top_assets_handler(
    _admin: AdminSession,
    State(api): State<AnalyticsApi>,
    Query(params): Query<LimitParams>,
) -> ApiResult<LabeledValues> {
    let limit = api.config().resolve_limit(params.limit.as_deref());
    let top = api
        .top_assets(limit)
        .await
        .map_err(ApiError::context("Failed to fetch top assets"))?;
    Ok(ApiResponse::ok(top))
}

async fn top_categories_handler(
    _admin: AdminSession,
    State(api): State<AnalyticsApi>,
    Query(params): Query<LimitParams>,
) -> ApiResult<LabeledValues> {
    let limit = api.config().resolve_limit(params.limit.as_deref());
    let top = api
        .top_categories(limit)
        .await
        .map_err(ApiError::context("Failed to fetch top categories"))?;
    Ok(ApiResponse::ok(top))
}

async fn revenue_handler(
    _admin: AdminSession,
    State(api): State<AnalyticsApi>,
    Query(params): Query<PeriodParams>,
) -> ApiResult<RevenueData> {
    let revenue = api
        .revenue(params.period())
        .await
        .map_err(ApiError::context("Failed to fetch revenue data"))?;
    Ok(ApiResponse::ok(revenue))
}

async fn recent_activities_handler(
    _admin: AdminSession,
    State(api): State<AnalyticsApi>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Vec<ActivityRecord>> {
    let limit = api.config().resolve_recent_limit(params.limit.as_deref());
    let activities = api
        .recent_activities(limit)
        .await
        .map_err(ApiError::context("Failed to fetch recent activities"))?;
    Ok(ApiResponse::ok(activities))
}
