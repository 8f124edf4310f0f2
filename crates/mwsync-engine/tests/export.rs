mod common;

use chrono::{Duration, Utc};
use common::{completed, product, seeded_store, FakeMws};
use mwsync_core::CodeType;
use mwsync_engine::{CatalogSelection, EngineError, StoreError, SyncDriver};
use mwsync_mws::FeedType;
use rust_decimal::Decimal;

fn explicit(skus: &[&str]) -> CatalogSelection {
    CatalogSelection {
        skus: skus.iter().map(|s| (*s).to_string()).collect(),
        changed_only: false,
    }
}

#[tokio::test]
async fn explicit_sku_without_identifiers_is_an_error_when_interactive() {
    let (store, channel) = seeded_store();
    store.add_product(product("MUG-1", &[]));
    let api = FakeMws::default();
    let driver = SyncDriver::new(&store, &api, &channel).unwrap();

    let err = driver
        .run_export_catalog(&explicit(&["MUG-1"]), false)
        .await
        .unwrap_err();
    assert!(err.is_missing_metadata(), "{err}");
    assert!(err.to_string().contains("Amazon Product Identifiers"));
    assert_eq!(api.calls(), 0);
}

#[tokio::test]
async fn explicit_sku_without_identifiers_skips_silent_run() {
    let (store, channel) = seeded_store();
    store.add_product(product("MUG-1", &[]));
    let api = FakeMws::default();
    let driver = SyncDriver::new(&store, &api, &channel).unwrap();

    let outcome = driver
        .run_export_catalog(&explicit(&["MUG-1"]), true)
        .await
        .unwrap();
    assert!(outcome.is_skipped());
    assert_eq!(api.calls(), 0);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn unknown_explicit_sku_is_not_found() {
    let (store, channel) = seeded_store();
    let api = FakeMws::default();
    let driver = SyncDriver::new(&store, &api, &channel).unwrap();

    let err = driver
        .run_export_catalog(&explicit(&["NOPE"]), true)
        .await
        .unwrap_err();
    assert!(
        matches!(err, EngineError::Store(StoreError::NotFound { entity: "product", .. })),
        "{err}"
    );
}

#[tokio::test]
async fn catalog_export_sends_eligible_products_links_them_and_moves_watermark() {
    let (store, channel) = seeded_store();
    let listed = store.add_product(product("MUG-1", &[(CodeType::Asin, "B00MUG0001")]));
    store.add_product(product("MUG-2", &[]));
    let mut hidden = product("MUG-3", &[(CodeType::Upc, "012345678905")]);
    hidden.export_to_amazon = false;
    store.add_product(hidden);

    let api = FakeMws::default();
    let driver = SyncDriver::new(&store, &api, &channel).unwrap();
    let report = completed(
        driver
            .run_export_catalog(&CatalogSelection::default(), false)
            .await
            .unwrap(),
    );

    assert_eq!(report.feed_type, FeedType::Product);
    assert_eq!(report.messages, 1);
    assert!(report.submission.is_some());

    let submitted = api.submitted();
    assert_eq!(submitted.len(), 1);
    assert!(submitted[0].1.contains("<SKU>MUG-1</SKU>"));
    assert!(!submitted[0].1.contains("MUG-2"));
    assert!(!submitted[0].1.contains("MUG-3"));

    let linked: Vec<i64> = store
        .products()
        .iter()
        .filter(|p| p.is_linked_to(channel.id))
        .map(|p| p.id)
        .collect();
    assert_eq!(linked, vec![listed.id]);
    assert!(store
        .channel(channel.id)
        .unwrap()
        .last_product_export_time
        .is_some());
}

#[tokio::test]
async fn changed_only_export_sends_products_updated_after_last_export() {
    let (store, mut channel) = seeded_store();
    channel.last_product_export_time = Some(Utc::now() - Duration::minutes(30));
    store.add_product(product("MUG-1", &[(CodeType::Asin, "B00MUG0001")]));
    let mut fresh = product("MUG-2", &[(CodeType::Asin, "B00MUG0002")]);
    fresh.updated_at = Utc::now() - Duration::minutes(5);
    store.add_product(fresh);

    let api = FakeMws::default();
    let driver = SyncDriver::new(&store, &api, &channel).unwrap();
    let selection = CatalogSelection {
        skus: Vec::new(),
        changed_only: true,
    };
    let report = completed(driver.run_export_catalog(&selection, false).await.unwrap());

    assert_eq!(report.messages, 1);
    let submitted = api.submitted();
    assert!(submitted[0].1.contains("<SKU>MUG-2</SKU>"));
    assert!(!submitted[0].1.contains("MUG-1"));
}

#[tokio::test]
async fn empty_catalog_is_not_submitted() {
    let (store, channel) = seeded_store();
    let api = FakeMws::default();
    let driver = SyncDriver::new(&store, &api, &channel).unwrap();

    let report = completed(
        driver
            .run_export_catalog(&CatalogSelection::default(), false)
            .await
            .unwrap(),
    );
    assert_eq!(report.messages, 0);
    assert!(report.submission.is_none());
    assert_eq!(api.calls(), 0);
    assert!(store
        .channel(channel.id)
        .unwrap()
        .last_product_export_time
        .is_none());
}

#[tokio::test]
async fn rejected_catalog_feed_links_nothing() {
    let (store, channel) = seeded_store();
    store.add_product(product("MUG-1", &[(CodeType::Asin, "B00MUG0001")]));
    let api = FakeMws {
        reject_feeds: true,
        ..FakeMws::default()
    };
    let driver = SyncDriver::new(&store, &api, &channel).unwrap();

    let err = driver
        .run_export_catalog(&CatalogSelection::default(), false)
        .await
        .unwrap_err();
    match err {
        EngineError::FeedRejected { feed_type, code, .. } => {
            assert_eq!(feed_type, "_POST_PRODUCT_DATA_");
            assert_eq!(code, "InvalidFeedType");
        }
        other => panic!("expected FeedRejected, got {other}"),
    }
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn pricing_export_sends_only_linked_products() {
    let (store, channel) = seeded_store();
    let mut linked = product("MUG-1", &[(CodeType::Asin, "B00MUG0001")]);
    linked.channel_ids = vec![channel.id];
    store.add_product(linked);
    store.add_product(product("MUG-2", &[(CodeType::Asin, "B00MUG0002")]));

    let api = FakeMws::default();
    let driver = SyncDriver::new(&store, &api, &channel).unwrap();
    let report = completed(driver.run_export_pricing(false).await.unwrap());

    assert_eq!(report.feed_type, FeedType::Pricing);
    assert_eq!(report.messages, 1);
    let submitted = api.submitted();
    let (feed_type, document) = &submitted[0];
    assert_eq!(*feed_type, FeedType::Pricing);
    assert!(document.contains("<SKU>MUG-1</SKU>"));
    assert!(document.contains(r#"<StandardPrice currency="USD">15.00</StandardPrice>"#));
    assert!(!document.contains("MUG-2"));
}

#[tokio::test]
async fn inventory_export_reports_channel_warehouse_stock() {
    let (store, channel) = seeded_store();
    let mut stocked = product("MUG-1", &[(CodeType::Asin, "B00MUG0001")]);
    stocked.channel_ids = vec![channel.id];
    let stocked = store.add_product(stocked);
    let mut empty = product("MUG-2", &[(CodeType::Asin, "B00MUG0002")]);
    empty.channel_ids = vec![channel.id];
    let empty = store.add_product(empty);

    store.set_stock(stocked.id, "WH", Decimal::new(35, 1));
    store.set_stock(stocked.id, "OTHER", Decimal::from(100));
    store.set_stock(empty.id, "WH", Decimal::ZERO);

    let api = FakeMws::default();
    let driver = SyncDriver::new(&store, &api, &channel).unwrap();
    let report = completed(driver.run_export_inventory(false).await.unwrap());

    assert_eq!(report.messages, 1);
    let submitted = api.submitted();
    let (_, document) = &submitted[0];
    assert!(document.contains("<Quantity>4</Quantity>"));
    assert!(document.contains("<FulfillmentLatency>2</FulfillmentLatency>"));
    assert!(!document.contains("MUG-2"));
}

#[tokio::test]
async fn settings_check_reports_credentials_problem() {
    let (store, channel) = seeded_store();

    let good = FakeMws::default();
    let check = SyncDriver::new(&store, &good, &channel)
        .unwrap()
        .check_settings()
        .await;
    assert!(check.ok);
    assert_eq!(check.message, "Account settings have been configured correctly");

    let bad = FakeMws {
        bad_credentials: true,
        ..FakeMws::default()
    };
    let check = SyncDriver::new(&store, &bad, &channel)
        .unwrap()
        .check_settings()
        .await;
    assert!(!check.ok);
    assert_eq!(
        check.message,
        "Something went wrong. Please check account settings again"
    );
    assert!(check.detail.unwrap().contains("InvalidAccessKeyId"));
}

#[tokio::test]
async fn service_status_is_described() {
    let (store, channel) = seeded_store();
    let api = FakeMws::default();
    let check = SyncDriver::new(&store, &api, &channel)
        .unwrap()
        .check_service_status()
        .await
        .unwrap();
    assert_eq!(check.status, "GREEN");
    assert_eq!(check.message, "The service is operating normally.");
}
