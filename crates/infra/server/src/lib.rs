//! # TutorHub Analytics Server
//!
//! Standalone HTTP server exposing the admin analytics endpoints over a
//! configured metric store.

mod config;

pub use config::{
    AdminConfig, AppConfig, CONFIG_ENV, ConfigError, DatabaseConfig, LogFormat, ServerConfig,
    load_config,
};

use axum::Router;
use std::sync::Arc;
use tutorhub_analytics::AnalyticsApi;
use tutorhub_axum::{AdminLayer, StaticTokenAuthenticator, analytics_routes};
use tutorhub_core::{AnalyticsError, AnalyticsResult, MetricStore};
use tutorhub_store_memory::MemoryStore;
use tutorhub_store_sqlite::SqliteStore;

/// Opens the metric store named by `config`.
pub async fn connect_store(config: &DatabaseConfig) -> AnalyticsResult<Arc<dyn MetricStore>> {
    if config.is_memory_store() {
        tracing::warn!("Using the in-memory store; analytics will be empty");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = SqliteStore::connect(&config.url, config.max_connections).await?;
    if config.run_migrations {
        store.migrate().await?;
    }
    Ok(Arc::new(store))
}

/// The analytics server.
pub struct AnalyticsServer {
    /// Server configuration.
    pub config: AppConfig,
    store: Arc<dyn MetricStore>,
}

impl AnalyticsServer {
    /// Creates a server over an already opened store.
    pub fn new(config: AppConfig, store: Arc<dyn MetricStore>) -> Self {
        Self { config, store }
    }

    /// Creates a server, opening the store named in `config`.
    pub async fn from_config(config: AppConfig) -> AnalyticsResult<Self> {
        let store = connect_store(&config.database).await?;
        Ok(Self::new(config, store))
    }

    /// Builds the router with the admin guard applied.
    pub fn router(&self) -> Router {
        let api = AnalyticsApi::new(self.store.clone(), self.config.analytics.clone());
        analytics_routes(api).layer(self.admin_layer())
    }

    fn admin_layer(&self) -> AdminLayer {
        let admin = &self.config.admin;
        if !admin.enabled {
            tracing::warn!("Admin guard disabled; every request is treated as an admin");
            return AdminLayer::open();
        }

        let authenticator = StaticTokenAuthenticator::new(
            admin
                .api_tokens
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty()),
        );
        if authenticator.is_empty() {
            tracing::warn!("No admin API tokens configured; analytics endpoints will reject all requests");
        }
        AdminLayer::new(Arc::new(authenticator))
    }

    /// Binds the configured address and serves until the process stops.
    pub async fn run(&self) -> AnalyticsResult<()> {
        let address = self.config.server.bind_address();
        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .map_err(|e| AnalyticsError::config(format!("cannot bind {address}: {e}")))?;

        tracing::info!(%address, "Starting TutorHub analytics server");
        axum::serve(listener, self.router())
            .await
            .map_err(|e| AnalyticsError::internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{Duration, Utc};
    use serde_json::Value;
    use tower::ServiceExt;
    use tutorhub_core::UserRole;
    use tutorhub_core::records::{AssetRecord, PurchaseRecord, UserRecord};

    fn config(toml: &str) -> AppConfig {
        AppConfig::from_toml(toml).unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_from_config() {
        let server = AnalyticsServer::from_config(config("[database]\nurl = \"memory\"\n"))
            .await
            .unwrap();
        assert!(server.store.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_guard_without_tokens_rejects() {
        let server = AnalyticsServer::from_config(AppConfig::default()).await.unwrap();

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/analytics/assets/top")
                    .header("authorization", "Bearer anything")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // No tokens configured, so the guard rejects everything.
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_configured_token_reaches_sqlite() {
        let server = AnalyticsServer::from_config(config(
            "[database]\nurl = \"sqlite::memory:\"\n[admin]\napi_tokens = [\"s3cret\"]\n",
        ))
        .await
        .unwrap();

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/analytics/revenue?period=year")
                    .header("authorization", "Bearer s3cret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    async fn get_json(router: Router, uri: &str) -> Value {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_seeded_sqlite_store() {
        let store = SqliteStore::connect("sqlite::memory:", 1).await.unwrap();
        store.migrate().await.unwrap();
        let recently = Utc::now() - Duration::minutes(5);
        store
            .insert_user(&UserRecord::new(1, "Ada", UserRole::Student, recently))
            .await
            .unwrap();
        store
            .insert_asset(&AssetRecord::new(1, "Ocean Skin", false, None))
            .await
            .unwrap();
        store
            .insert_purchase(&PurchaseRecord::new(1, 1, 1, 2.5, recently))
            .await
            .unwrap();

        let server = AnalyticsServer::new(config("[admin]\nenabled = false\n"), Arc::new(store));

        let growth = get_json(server.router(), "/analytics/users/growth?period=week").await;
        let students: f64 = growth["data"]["datasets"][0]["data"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_f64)
            .sum();
        assert_eq!(growth["data"]["labels"].as_array().unwrap().len(), 7);
        assert_eq!(students, 1.0);

        let revenue = get_json(server.router(), "/analytics/revenue?period=week").await;
        assert_eq!(revenue["data"]["totalRevenue"], 2.5);

        let top = get_json(server.router(), "/analytics/assets/top").await;
        assert_eq!(top["data"]["labels"], serde_json::json!(["Ocean Skin"]));

        let recent = get_json(server.router(), "/analytics/activities/recent").await;
        assert_eq!(recent["data"][0]["user"], "Ada");
        assert_eq!(recent["data"][0]["summary"], "Purchased Ocean Skin for 2.50");
    }

    #[tokio::test]
    async fn test_disabled_guard() {
        let server = AnalyticsServer::new(
            config("[admin]\nenabled = false\n"),
            Arc::new(MemoryStore::new()),
        );

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .uri("/analytics/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
