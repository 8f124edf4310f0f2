#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use mwsync_core::{Channel, CodeType, Product, ProductCode};
use mwsync_engine::MemoryStore;
use mwsync_mws::types::{
    AttributeSets, Identifiers, ItemAttributes, MarketplaceAsin, MatchedProducts,
};
use mwsync_mws::{
    FeedSubmissionCount, FeedSubmissionInfo, FeedType, MatchedProduct, Money, MwsApi, MwsError,
    Order, OrderItem, OrderStatus, OrderSummary, ProductMatch, ServiceStatus, ShippingAddress,
};
use rust_decimal::Decimal;

/// Scripted MWS double. Every call is counted.
#[derive(Default)]
pub struct FakeMws {
    pub orders: HashMap<String, (Order, Vec<OrderItem>)>,
    /// Orders returned by `ListOrders`, in order.
    pub listed: Vec<String>,
    pub catalog: HashMap<String, ProductMatch>,
    pub reject_feeds: bool,
    pub bad_credentials: bool,
    pub submissions: Mutex<Vec<(FeedType, String)>>,
    pub calls: AtomicUsize,
}

impl FakeMws {
    pub fn with_order(mut self, order: Order, items: Vec<OrderItem>) -> Self {
        self.listed.push(order.amazon_order_id.clone());
        self.orders
            .insert(order.amazon_order_id.clone(), (order, items));
        self
    }

    pub fn with_catalog_entry(mut self, sku: &str, title: &str, asin: &str) -> Self {
        self.catalog.insert(
            sku.to_string(),
            ProductMatch {
                id: sku.to_string(),
                id_type: "SellerSKU".to_string(),
                status: "Success".to_string(),
                products: Some(MatchedProducts {
                    product: vec![MatchedProduct {
                        identifiers: Some(Identifiers {
                            marketplace_asin: Some(MarketplaceAsin {
                                marketplace_id: "ATVPDKIKX0DER".to_string(),
                                asin: asin.to_string(),
                            }),
                        }),
                        attribute_sets: AttributeSets {
                            item_attributes: vec![ItemAttributes {
                                title: title.to_string(),
                                brand: None,
                            }],
                        },
                    }],
                }),
                error: None,
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<(FeedType, String)> {
        self.submissions
            .lock()
            .expect("submissions lock poisoned")
            .clone()
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn not_found(id: &str) -> MwsError {
        MwsError::Api {
            code: "InvalidParameterValue".to_string(),
            message: format!("order {id} not found"),
        }
    }
}

impl MwsApi for FakeMws {
    async fn list_orders(
        &self,
        _marketplace_id: &str,
        created_after: DateTime<Utc>,
        _statuses: &[OrderStatus],
    ) -> Result<Vec<OrderSummary>, MwsError> {
        self.count();
        Ok(self
            .listed
            .iter()
            .filter_map(|id| self.orders.get(id))
            .filter(|(order, _)| order.purchase_date > created_after)
            .map(|(order, _)| OrderSummary {
                amazon_order_id: order.amazon_order_id.clone(),
                purchase_date: order.purchase_date,
                order_status: order.order_status.clone(),
            })
            .collect())
    }

    async fn get_order(&self, amazon_order_id: &str) -> Result<Order, MwsError> {
        self.count();
        self.orders
            .get(amazon_order_id)
            .map(|(order, _)| order.clone())
            .ok_or_else(|| Self::not_found(amazon_order_id))
    }

    async fn list_order_items(&self, amazon_order_id: &str) -> Result<Vec<OrderItem>, MwsError> {
        self.count();
        self.orders
            .get(amazon_order_id)
            .map(|(_, items)| items.clone())
            .ok_or_else(|| Self::not_found(amazon_order_id))
    }

    async fn get_matching_product_for_id(
        &self,
        _marketplace_id: &str,
        id_type: &str,
        ids: &[&str],
    ) -> Result<Vec<ProductMatch>, MwsError> {
        self.count();
        Ok(ids
            .iter()
            .map(|id| {
                self.catalog.get(*id).cloned().unwrap_or_else(|| ProductMatch {
                    id: (*id).to_string(),
                    id_type: id_type.to_string(),
                    status: "ClientError".to_string(),
                    products: None,
                    error: Some(mwsync_mws::types::ApiErrorDetail {
                        r#type: Some("Sender".to_string()),
                        code: "InvalidParameterValue".to_string(),
                        message: Some(format!("Invalid SellerSKU identifier {id}")),
                    }),
                })
            })
            .collect())
    }

    async fn submit_feed(
        &self,
        feed: &[u8],
        feed_type: FeedType,
        _marketplace_ids: &[&str],
    ) -> Result<FeedSubmissionInfo, MwsError> {
        self.count();
        if self.reject_feeds {
            return Err(MwsError::Api {
                code: "InvalidFeedType".to_string(),
                message: "feed refused".to_string(),
            });
        }
        let mut submissions = self.submissions.lock().expect("submissions lock poisoned");
        submissions.push((feed_type, String::from_utf8_lossy(feed).into_owned()));
        Ok(FeedSubmissionInfo {
            feed_submission_id: format!("5000{}", submissions.len()),
            feed_type: Some(feed_type.as_str().to_string()),
            submitted_date: Some(Utc::now()),
            feed_processing_status: "_SUBMITTED_".to_string(),
        })
    }

    async fn get_service_status(&self) -> Result<ServiceStatus, MwsError> {
        self.count();
        Ok(ServiceStatus {
            status: "GREEN".to_string(),
            timestamp: Some(Utc::now()),
            messages: None,
        })
    }

    async fn get_feed_submission_count(&self) -> Result<FeedSubmissionCount, MwsError> {
        self.count();
        if self.bad_credentials {
            return Err(MwsError::Api {
                code: "InvalidAccessKeyId".to_string(),
                message: "The AWS Access Key Id you provided does not exist in our records."
                    .to_string(),
            });
        }
        Ok(FeedSubmissionCount {
            count: Decimal::ZERO,
        })
    }
}

pub fn money(cents: i64) -> Money {
    Money {
        currency_code: "USD".to_string(),
        amount: Decimal::new(cents, 2),
    }
}

pub fn shipping_address(street: &str, region: &str) -> ShippingAddress {
    ShippingAddress {
        name: "Jane Buyer".to_string(),
        address_line1: street.to_string(),
        address_line2: None,
        city: "San Francisco".to_string(),
        state_or_region: region.to_string(),
        postal_code: "94105".to_string(),
        country_code: "US".to_string(),
        phone: Some("415-555-0100".to_string()),
    }
}

/// An unshipped single-item order from Jane Buyer.
pub fn amazon_order(id: &str, total_cents: i64) -> Order {
    Order {
        amazon_order_id: id.to_string(),
        purchase_date: Utc::now() - Duration::hours(2),
        order_status: "Unshipped".to_string(),
        buyer_email: "jane@example.com".to_string(),
        buyer_name: Some("Jane Buyer".to_string()),
        shipping_address: shipping_address("1 Main St", "CA"),
        order_total: money(total_cents),
        number_of_items_shipped: Decimal::ZERO,
        number_of_items_unshipped: Decimal::ONE,
    }
}

pub fn order_item(sku: &str, price_cents: i64, shipping_cents: Option<i64>) -> OrderItem {
    OrderItem {
        asin: None,
        seller_sku: sku.to_string(),
        order_item_id: Some(format!("item-{sku}")),
        title: format!("Listing {sku}"),
        quantity_ordered: Decimal::ONE,
        item_price: money(price_cents),
        shipping_price: shipping_cents.map(money),
    }
}

pub fn channel_template() -> Channel {
    Channel {
        id: 0,
        code: "amazon-us".to_string(),
        name: "Amazon US".to_string(),
        source: "amazon_mws".to_string(),
        merchant_id: "A1MERCHANT".to_string(),
        marketplace_id: "ATVPDKIKX0DER".to_string(),
        access_key: "AKIAEXAMPLE".to_string(),
        secret_key: "secret".to_string(),
        currency_code: "USD".to_string(),
        default_uom: "Unit".to_string(),
        default_account_revenue: Some("4000".to_string()),
        default_account_expense: Some("5000".to_string()),
        warehouse: "WH".to_string(),
        last_order_import_time: Utc::now() - Duration::days(1),
        last_product_export_time: None,
        is_active: true,
    }
}

pub fn product(sku: &str, codes: &[(CodeType, &str)]) -> Product {
    Product {
        id: 0,
        template_id: 0,
        name: format!("Product {sku}"),
        code: Some(sku.to_string()),
        description: None,
        list_price: Decimal::new(1500, 2),
        cost_price: Decimal::new(700, 2),
        default_uom: "Unit".to_string(),
        export_to_amazon: true,
        delivery_time: 2,
        codes: codes
            .iter()
            .map(|(code_type, code)| ProductCode {
                code_type: *code_type,
                code: (*code).to_string(),
            })
            .collect(),
        channel_ids: Vec::new(),
        updated_at: Utc::now() - Duration::hours(1),
    }
}

/// A store seeded with USD, the US and two states, and one channel.
pub fn seeded_store() -> (MemoryStore, Channel) {
    let store = MemoryStore::new();
    store.add_currency("USD", "US Dollar");
    let us = store.add_country("US", "United States");
    store.add_subdivision(us.id, "US-CA", "California");
    store.add_subdivision(us.id, "US-NY", "New York");
    let channel = store.add_channel(channel_template());
    (store, channel)
}

pub fn completed<T>(outcome: mwsync_engine::RunOutcome<T>) -> T {
    match outcome {
        mwsync_engine::RunOutcome::Completed(value) => value,
        mwsync_engine::RunOutcome::Skipped { reason } => panic!("run was skipped: {reason}"),
    }
}
