//! Offline tests for mwsync-db pool configuration and row types.
//! These tests do not require a live database connection.

use mwsync_core::{AppConfig, Channel, Environment};
use mwsync_db::{ChannelRow, PoolConfig, SyncRunRow, SyncRunType, TriggerSource};
use std::path::PathBuf;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        channels_path: PathBuf::from("./config/channels.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        mws_endpoint: "https://mws.amazonservices.com".to_string(),
        mws_request_timeout_secs: 30,
        mws_user_agent: "ua".to_string(),
        import_cron: "0 */15 * * * *".to_string(),
        export_cron: "0 0 * * * *".to_string(),
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`SyncRunRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn sync_run_row_has_expected_fields() {
    use chrono::Utc;
    use uuid::Uuid;

    let row = SyncRunRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        channel_id: 3_i64,
        run_type: SyncRunType::ExportPricing.to_string(),
        trigger_source: TriggerSource::Scheduler.as_str().to_string(),
        status: "queued".to_string(),
        started_at: None,
        completed_at: None,
        records_processed: 0_i32,
        feed_submission_id: None,
        error_message: None,
        created_at: Utc::now(),
    };

    assert_eq!(row.run_type, "export_pricing");
    assert_eq!(row.trigger_source, "scheduler");
    assert!(row.feed_submission_id.is_none());
}

#[test]
fn run_types_match_the_table_check_constraint() {
    let names: Vec<&str> = [
        SyncRunType::ImportOrders,
        SyncRunType::ExportCatalog,
        SyncRunType::ExportPricing,
        SyncRunType::ExportInventory,
    ]
    .into_iter()
    .map(SyncRunType::as_str)
    .collect();

    assert_eq!(
        names,
        vec![
            "import_orders",
            "export_catalog",
            "export_pricing",
            "export_inventory"
        ]
    );
    assert_eq!(TriggerSource::Cli.as_str(), "cli");
}

#[test]
fn channel_row_converts_to_domain_channel() {
    use chrono::{TimeZone, Utc};

    let watermark = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let row = ChannelRow {
        id: 5,
        code: "amazon-us".to_string(),
        name: "Amazon US".to_string(),
        source: "amazon_mws".to_string(),
        merchant_id: "A1MERCHANT".to_string(),
        marketplace_id: "ATVPDKIKX0DER".to_string(),
        access_key: "AKIA".to_string(),
        secret_key: "s3cr3t-value".to_string(),
        currency_code: "USD".to_string(),
        default_uom: "Unit".to_string(),
        default_account_revenue: Some("4000".to_string()),
        default_account_expense: None,
        warehouse: "main".to_string(),
        last_order_import_time: watermark,
        last_product_export_time: None,
        is_active: true,
        created_at: watermark,
        updated_at: watermark,
    };

    let channel = Channel::from(row);
    assert_eq!(channel.id, 5);
    assert!(channel.is_amazon_mws());
    assert_eq!(channel.last_order_import_time, watermark);
    assert_eq!(channel.default_account_revenue.as_deref(), Some("4000"));
    let debug = format!("{channel:?}");
    assert!(!debug.contains("s3cr3t-value"), "{debug}");
}
