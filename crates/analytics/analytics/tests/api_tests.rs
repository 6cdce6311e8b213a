#[cfg(test)]
mod api_tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::sync::Arc;
    use tutorhub_analytics::{AnalyticsApi, AnalyticsConfig};
    use tutorhub_core::records::{
        AssetRecord, AwardRecord, CategoryRecord, DiaryPageRecord, ForumPostRecord,
        PurchaseRecord, UserRecord,
    };
    use tutorhub_core::{ActivityKind, AnalyticsError, FixedClock, MetricSource, Period, UserRole};
    use tutorhub_store_memory::MemoryStore;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn api(store: &MemoryStore) -> AnalyticsApi {
        AnalyticsApi::with_clock(
            Arc::new(store.clone()),
            Arc::new(FixedClock::new(now())),
            AnalyticsConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_week_growth_single_registration() {
        let store = MemoryStore::new();
        let registered = Utc.with_ymd_and_hms(2024, 6, 12, 8, 30, 0).unwrap();
        store.insert_user(UserRecord::new(1, "Ada", UserRole::Student, registered)).await;

        let chart = api(&store).user_growth(Period::Week).await.unwrap();

        assert_eq!(chart.labels.len(), 7);
        assert_eq!(chart.labels[0], "Jun 9");
        assert_eq!(chart.labels[6], "Jun 15");
        assert_eq!(chart.datasets[0].label, "Students");
        assert_eq!(chart.datasets[0].data, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        assert_eq!(chart.datasets[1].data, vec![0.0; 7]);
    }

    #[tokio::test]
    async fn test_year_growth_spans_twelve_months() {
        let store = MemoryStore::new();
        let early = Utc.with_ymd_and_hms(2023, 7, 1, 0, 0, 0).unwrap();
        let too_early = Utc.with_ymd_and_hms(2023, 6, 30, 23, 59, 59).unwrap();
        store.insert_user(UserRecord::new(1, "Alan", UserRole::Tutor, early)).await;
        store.insert_user(UserRecord::new(2, "Kurt", UserRole::Tutor, too_early)).await;

        let chart = api(&store).user_growth(Period::Year).await.unwrap();

        assert_eq!(chart.labels.len(), 12);
        assert_eq!(chart.labels[0], "Jul 2023");
        assert_eq!(chart.labels[11], "Jun 2024");
        assert_eq!(chart.datasets[1].data[0], 1.0);
        assert_eq!(chart.datasets[1].data.iter().sum::<f64>(), 1.0);
    }

    #[tokio::test]
    async fn test_dashboard_percent_change() {
        let store = MemoryStore::new();
        for id in 1..=125 {
            store
                .insert_user(UserRecord::new(id, "s", UserRole::Student, now() - Duration::days(1)))
                .await;
        }
        for id in 126..=225 {
            store
                .insert_user(UserRecord::new(id, "s", UserRole::Student, now() - Duration::days(45)))
                .await;
        }

        let stats = api(&store).dashboard().await.unwrap();

        assert_eq!(stats.students.count, 125);
        assert_eq!(stats.students.previous_count, 100);
        assert_eq!(stats.students.percent_change, 25.0);
        assert_eq!(stats.tutors.count, 0);
        assert_eq!(stats.tutors.percent_change, 0.0);
    }

    #[tokio::test]
    async fn test_dashboard_window_boundaries() {
        let store = MemoryStore::new();
        store.insert_category(CategoryRecord::new(1, "Skins")).await;
        store.insert_asset(AssetRecord::new(1, "Ocean Skin", false, Some(1))).await;
        // Exactly 30 days ago belongs to the current window, 60 days ago to the previous one.
        store.insert_purchase(PurchaseRecord::new(1, 1, 1, 10.0, now() - Duration::days(30))).await;
        store.insert_purchase(PurchaseRecord::new(2, 1, 1, 4.0, now() - Duration::days(60))).await;
        store.insert_purchase(PurchaseRecord::new(3, 1, 1, 99.0, now())).await;

        let stats = api(&store).dashboard().await.unwrap();

        assert_eq!(stats.assets.count, 1);
        assert_eq!(stats.assets.previous_count, 1);
        assert_eq!(stats.revenue.amount, 10.0);
        assert_eq!(stats.revenue.previous_amount, 4.0);
        assert_eq!(stats.revenue.percent_change, 150.0);
    }

    async fn store_with_purchase_counts(counts: &[usize]) -> MemoryStore {
        let store = MemoryStore::new();
        let mut purchase_id = 0;
        for (index, count) in counts.iter().enumerate() {
            let asset_id = index as i64 + 1;
            store.insert_category(CategoryRecord::new(asset_id, format!("Category {asset_id}"))).await;
            store
                .insert_asset(AssetRecord::new(asset_id, format!("Asset {asset_id}"), false, Some(asset_id)))
                .await;
            for _ in 0..*count {
                purchase_id += 1;
                store
                    .insert_purchase(PurchaseRecord::new(purchase_id, 1, asset_id, 1.0, now()))
                    .await;
            }
        }
        store
    }

    #[tokio::test]
    async fn test_top_assets_ranking() {
        let store = store_with_purchase_counts(&[10, 50, 5, 30, 1]).await;

        let top = api(&store).top_assets(3).await.unwrap();

        assert_eq!(top.values, vec![50.0, 30.0, 10.0]);
        assert_eq!(top.labels, vec!["Asset 2", "Asset 4", "Asset 1"]);
        assert_eq!(top.colors.len(), 3);
    }

    #[tokio::test]
    async fn test_top_categories_limit_larger_than_rows() {
        let store = store_with_purchase_counts(&[3, 3, 7]).await;

        let top = api(&store).top_categories(5).await.unwrap();

        assert_eq!(top.labels, vec!["Category 3", "Category 1", "Category 2"]);
        assert_eq!(top.values, vec![7.0, 3.0, 3.0]);
    }

    #[tokio::test]
    async fn test_usage_month_uses_six_monthly_buckets() {
        let store = MemoryStore::new();
        store.insert_asset(AssetRecord::new(1, "Starter Pack", true, None)).await;
        store.insert_asset(AssetRecord::new(2, "Ocean Skin", false, None)).await;
        let may = Utc.with_ymd_and_hms(2024, 5, 20, 0, 0, 0).unwrap();
        store.insert_purchase(PurchaseRecord::new(1, 1, 1, 0.0, may)).await;
        store.insert_purchase(PurchaseRecord::new(2, 1, 2, 5.0, may)).await;
        store.insert_purchase(PurchaseRecord::new(3, 1, 2, 5.0, now())).await;

        let chart = api(&store).asset_usage(Period::Month).await.unwrap();

        assert_eq!(chart.labels, vec!["Jan 2024", "Feb 2024", "Mar 2024", "Apr 2024", "May 2024", "Jun 2024"]);
        assert_eq!(chart.datasets[0].label, "Free");
        assert_eq!(chart.datasets[0].data, vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(chart.datasets[1].label, "Premium");
        assert_eq!(chart.datasets[1].data, vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0]);
    }

    #[tokio::test]
    async fn test_revenue_total_matches_series() {
        let store = MemoryStore::new();
        store.insert_asset(AssetRecord::new(1, "Ocean Skin", false, None)).await;
        store.insert_purchase(PurchaseRecord::new(1, 1, 1, 2.5, now() - Duration::days(2))).await;
        store.insert_purchase(PurchaseRecord::new(2, 1, 1, 7.5, now())).await;
        store.insert_purchase(PurchaseRecord::new(3, 1, 1, 100.0, now() - Duration::days(90))).await;

        let revenue = api(&store).revenue(Period::Month).await.unwrap();

        assert_eq!(revenue.chart.labels.len(), 30);
        assert_eq!(revenue.total_revenue, 10.0);
        assert_eq!(revenue.chart.datasets[0].label, "Revenue");
        assert_eq!(revenue.chart.datasets[0].data[29], 7.5);
        assert!(revenue.chart.datasets[0].fill);
    }

    #[tokio::test]
    async fn test_empty_store_yields_zeros() {
        let store = MemoryStore::new();
        let api = api(&store);

        let growth = api.user_growth(Period::Month).await.unwrap();
        assert_eq!(growth.labels.len(), 30);
        assert!(growth.datasets.iter().all(|d| d.data.iter().all(|v| *v == 0.0)));

        let stats = api.dashboard().await.unwrap();
        assert_eq!(stats.students.count, 0);
        assert_eq!(stats.revenue.percent_change, 0.0);

        assert!(api.top_assets(5).await.unwrap().is_empty());
        assert!(api.recent_activities(10).await.unwrap().is_empty());
        assert_eq!(api.revenue(Period::Week).await.unwrap().total_revenue, 0.0);

        let distribution = api.activity_distribution().await.unwrap();
        assert_eq!(
            distribution.labels,
            vec!["Diary Pages", "Forum Posts", "Asset Purchases", "Awards", "Chat Messages"]
        );
        assert_eq!(distribution.values, vec![0.0; 5]);
    }

    #[tokio::test]
    async fn test_storage_failure_fails_whole_call() {
        let store = MemoryStore::new();
        store.fail_source(MetricSource::UserRegistrations, "connection lost").await;
        let api = api(&store);

        let err = api.user_growth(Period::Week).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::FetchFailed { .. }));
        assert!(err.to_string().contains("connection lost"));

        assert!(api.dashboard().await.is_err());
        assert!(api.asset_usage(Period::Week).await.is_ok());
    }

    #[tokio::test]
    async fn test_store_outage_fails_every_endpoint() {
        let store = MemoryStore::new();
        store.fail_all("database offline").await;
        let api = api(&store);

        assert!(api.health().await.is_err());
        assert!(api.dashboard().await.is_err());
        assert!(api.activity_distribution().await.is_err());
        assert!(api.top_categories(5).await.is_err());
        let err = api.revenue(Period::Year).await.unwrap_err();
        assert!(err.is_storage_error());
        assert!(err.to_string().contains("database offline"));
    }

    #[tokio::test]
    async fn test_recent_feed_merges_kinds() {
        let store = MemoryStore::new();
        store.insert_user(UserRecord::new(1, "Ada", UserRole::Student, now())).await;
        store.insert_asset(AssetRecord::new(1, "Ocean Skin", false, None)).await;

        let tie = now() - Duration::hours(1);
        store.insert_purchase(PurchaseRecord::new(3, 1, 1, 4.99, tie)).await;
        store
            .insert_diary_page(DiaryPageRecord {
                id: 5,
                user_id: 1,
                diary_title: "Maths".into(),
                created_at: tie,
            })
            .await;
        store
            .insert_forum_post(ForumPostRecord {
                id: 1,
                user_id: 1,
                title: "Hello".into(),
                created_at: now(),
            })
            .await;
        store
            .insert_award(AwardRecord {
                id: 9,
                user_id: 1,
                award_name: "Early Bird".into(),
                created_at: now() - Duration::days(3),
            })
            .await;

        let feed = api(&store).recent_activities(3).await.unwrap();

        let order: Vec<(ActivityKind, i64)> = feed.iter().map(|r| (r.kind, r.id)).collect();
        assert_eq!(
            order,
            vec![
                (ActivityKind::ForumPost, 1),
                (ActivityKind::DiaryPage, 5),
                (ActivityKind::AssetPurchase, 3),
            ]
        );
        assert_eq!(feed[2].summary, "Purchased Ocean Skin for 4.99");
        assert_eq!(feed[0].user, "Ada");
    }

    #[tokio::test]
    async fn test_recent_feed_respects_configured_kinds() {
        let store = MemoryStore::new();
        store
            .insert_forum_post(ForumPostRecord {
                id: 1,
                user_id: 1,
                title: "Hello".into(),
                created_at: now(),
            })
            .await;
        store.fail_source(MetricSource::ChatMessages, "chat service down").await;

        let api = AnalyticsApi::with_clock(
            Arc::new(store.clone()),
            Arc::new(FixedClock::new(now())),
            AnalyticsConfig::new().activity_kinds([ActivityKind::AssetPurchase]),
        );
        assert!(api.recent_activities(10).await.unwrap().is_empty());
    }
}
