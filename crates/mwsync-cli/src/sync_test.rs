use super::*;

#[test]
fn export_catalog_command_becomes_a_selection() {
    let (channel, job, silent) = SyncCommands::ExportCatalog {
        channel: "amazon-us".to_string(),
        skus: vec!["MUG-1".to_string()],
        changed_only: false,
        silent: true,
    }
    .into_parts();

    assert_eq!(channel, "amazon-us");
    assert!(silent);
    assert_eq!(
        job,
        SyncJob::ExportCatalog(CatalogSelection {
            skus: vec!["MUG-1".to_string()],
            changed_only: false,
        })
    );
}

#[test]
fn jobs_map_to_run_types() {
    assert_eq!(SyncJob::Import.run_type(), SyncRunType::ImportOrders);
    assert_eq!(
        SyncJob::ExportCatalog(CatalogSelection::default()).run_type(),
        SyncRunType::ExportCatalog
    );
    assert_eq!(SyncJob::ExportPricing.run_type(), SyncRunType::ExportPricing);
    assert_eq!(
        SyncJob::ExportInventory.run_type(),
        SyncRunType::ExportInventory
    );
}

#[test]
fn import_command_keeps_the_silent_flag() {
    let (channel, job, silent) = SyncCommands::Import {
        channel: "amazon-uk".to_string(),
        silent: false,
    }
    .into_parts();

    assert_eq!(channel, "amazon-uk");
    assert_eq!(job, SyncJob::Import);
    assert!(!silent);
}

#[test]
fn run_counts_saturate() {
    assert_eq!(count(3), 3);
    assert_eq!(count(usize::MAX), i32::MAX);
}

#[test]
fn client_uses_channel_credentials_and_configured_endpoint() {
    use chrono::Utc;
    use mwsync_core::Environment;
    use std::path::PathBuf;

    let config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        channels_path: PathBuf::from("./config/channels.yaml"),
        db_max_connections: 1,
        db_min_connections: 1,
        db_acquire_timeout_secs: 1,
        mws_endpoint: "not a url".to_string(),
        mws_request_timeout_secs: 5,
        mws_user_agent: "mwsync-test".to_string(),
        import_cron: "0 */30 * * * *".to_string(),
        export_cron: "0 15 * * * *".to_string(),
    };
    let channel = Channel {
        id: 1,
        code: "amazon-us".to_string(),
        name: "Amazon US".to_string(),
        source: "amazon_mws".to_string(),
        merchant_id: "A1MERCHANT".to_string(),
        marketplace_id: "ATVPDKIKX0DER".to_string(),
        access_key: "AKIA".to_string(),
        secret_key: "secret".to_string(),
        currency_code: "USD".to_string(),
        default_uom: "Unit".to_string(),
        default_account_revenue: None,
        default_account_expense: None,
        warehouse: "main".to_string(),
        last_order_import_time: Utc::now(),
        last_product_export_time: None,
        is_active: true,
    };

    let err = build_client(&config, &channel)
        .err()
        .expect("invalid endpoint should be rejected");
    assert!(err.to_string().contains("amazon-us"));
}
