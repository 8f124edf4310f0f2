use chrono::{DateTime, Utc};

use crate::error::MwsError;
use crate::types::{
    FeedSubmissionCount, FeedSubmissionInfo, Order, OrderItem, OrderSummary, ProductMatch,
    ServiceStatus,
};

/// Upstream order statuses that the importer asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Unshipped,
    PartiallyShipped,
    Shipped,
}

impl OrderStatus {
    /// Orders in these states are paid and ready to (or already did) ship.
    pub const IMPORTABLE: [OrderStatus; 3] = [
        OrderStatus::Unshipped,
        OrderStatus::PartiallyShipped,
        OrderStatus::Shipped,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Unshipped => "Unshipped",
            OrderStatus::PartiallyShipped => "PartiallyShipped",
            OrderStatus::Shipped => "Shipped",
        }
    }
}

/// Kind of feed submitted through `SubmitFeed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedType {
    Product,
    Pricing,
    Inventory,
}

impl FeedType {
    /// `FeedType` request parameter.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FeedType::Product => "_POST_PRODUCT_DATA_",
            FeedType::Pricing => "_POST_PRODUCT_PRICING_DATA_",
            FeedType::Inventory => "_POST_INVENTORY_AVAILABILITY_DATA_",
        }
    }

    /// `MessageType` element of the feed envelope.
    #[must_use]
    pub fn message_type(self) -> &'static str {
        match self {
            FeedType::Product => "Product",
            FeedType::Pricing => "Price",
            FeedType::Inventory => "Inventory",
        }
    }
}

impl std::fmt::Display for FeedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The MWS operations the sync engine depends on. Implemented by
/// [`crate::MwsClient`]; tests substitute scripted fakes.
#[allow(async_fn_in_trait)]
pub trait MwsApi {
    /// Lists orders created after `created_after` in any of `statuses`,
    /// following `NextToken` pages until exhausted.
    async fn list_orders(
        &self,
        marketplace_id: &str,
        created_after: DateTime<Utc>,
        statuses: &[OrderStatus],
    ) -> Result<Vec<OrderSummary>, MwsError>;

    /// Fetches one complete order.
    async fn get_order(&self, amazon_order_id: &str) -> Result<Order, MwsError>;

    /// Fetches every line item of an order.
    async fn list_order_items(&self, amazon_order_id: &str) -> Result<Vec<OrderItem>, MwsError>;

    /// Looks products up by identifier, one result per requested id.
    async fn get_matching_product_for_id(
        &self,
        marketplace_id: &str,
        id_type: &str,
        ids: &[&str],
    ) -> Result<Vec<ProductMatch>, MwsError>;

    async fn submit_feed(
        &self,
        feed: &[u8],
        feed_type: FeedType,
        marketplace_ids: &[&str],
    ) -> Result<FeedSubmissionInfo, MwsError>;

    async fn get_service_status(&self) -> Result<ServiceStatus, MwsError>;

    async fn get_feed_submission_count(&self) -> Result<FeedSubmissionCount, MwsError>;
}
