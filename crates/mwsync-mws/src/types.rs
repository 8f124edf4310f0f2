//! Typed MWS payloads.
//!
//! Each type models one response element after conversion by
//! [`crate::xml::parse_document`]. Field names follow MWS (`PascalCase`);
//! numbers arrive as strings and are decoded with `rust_decimal`'s string
//! adapter. Every collection that MWS may return as either a single element
//! or a list goes through [`one_or_many`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserializes a value that may be a single `T`, a list of `T`, or absent
/// (`null`), always producing a `Vec<T>`.
///
/// Elements are decoded as `T` directly, so a malformed element reports the
/// field that is missing or wrong.
///
/// # Errors
///
/// Returns the deserializer's error if the value, or any element of it, is
/// not a valid `T`.
pub fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let decode = |value: Value| -> Result<T, D::Error> {
        T::deserialize(value).map_err(serde::de::Error::custom)
    };
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items.into_iter().map(decode).collect(),
        other => Ok(vec![decode(other)?]),
    }
}

fn decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(Decimal::ZERO),
        Some(raw) => raw.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// A monetary amount.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Money {
    pub currency_code: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// The fields of an order that a listing needs; the full record is fetched
/// separately with `GetOrder`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderSummary {
    pub amazon_order_id: String,
    pub purchase_date: DateTime<Utc>,
    pub order_status: String,
}

/// `ListOrdersResult` / `ListOrdersByNextTokenResult`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderListPage {
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub orders: Option<OrderSummaries>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderSummaries {
    #[serde(default, deserialize_with = "one_or_many")]
    pub order: Vec<OrderSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ShippingAddress {
    pub name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    /// Region as written by the buyer: either a subdivision code (`"CA"`)
    /// or a name (`"California"`).
    pub state_or_region: String,
    pub postal_code: String,
    pub country_code: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Second street line: `AddressLine2`, or `None` when it is blank.
    /// `AddressLine3` is not carried over.
    #[must_use]
    pub fn street_bis(&self) -> Option<String> {
        self.address_line2
            .as_deref()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
    }
}

/// A complete order as returned by `GetOrder`, validated once at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Order {
    pub amazon_order_id: String,
    pub purchase_date: DateTime<Utc>,
    pub order_status: String,
    pub buyer_email: String,
    #[serde(default)]
    pub buyer_name: Option<String>,
    pub shipping_address: ShippingAddress,
    pub order_total: Money,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub number_of_items_shipped: Decimal,
    #[serde(default, deserialize_with = "decimal_or_zero")]
    pub number_of_items_unshipped: Decimal,
}

/// `GetOrderResult`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetOrderResult {
    #[serde(default)]
    pub orders: Option<Orders>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Orders {
    #[serde(default, deserialize_with = "one_or_many")]
    pub order: Vec<Order>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderItem {
    #[serde(rename = "ASIN", default)]
    pub asin: Option<String>,
    #[serde(rename = "SellerSKU")]
    pub seller_sku: String,
    #[serde(default)]
    pub order_item_id: Option<String>,
    pub title: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub quantity_ordered: Decimal,
    pub item_price: Money,
    #[serde(default)]
    pub shipping_price: Option<Money>,
}

impl OrderItem {
    /// Shipping amount charged for this item, zero when absent.
    #[must_use]
    pub fn shipping_amount(&self) -> Decimal {
        self.shipping_price
            .as_ref()
            .map_or(Decimal::ZERO, |price| price.amount)
    }
}

/// `ListOrderItemsResult`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderItemsPage {
    #[serde(default)]
    pub next_token: Option<String>,
    #[serde(default)]
    pub order_items: Option<OrderItems>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderItems {
    #[serde(default, deserialize_with = "one_or_many")]
    pub order_item: Vec<OrderItem>,
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemAttributes {
    pub title: String,
    #[serde(default)]
    pub brand: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeSets {
    #[serde(default, deserialize_with = "one_or_many")]
    pub item_attributes: Vec<ItemAttributes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarketplaceAsin {
    #[serde(rename = "MarketplaceId")]
    pub marketplace_id: String,
    #[serde(rename = "ASIN")]
    pub asin: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Identifiers {
    #[serde(rename = "MarketplaceASIN", default)]
    pub marketplace_asin: Option<MarketplaceAsin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MatchedProduct {
    #[serde(default)]
    pub identifiers: Option<Identifiers>,
    pub attribute_sets: AttributeSets,
}

impl MatchedProduct {
    /// First attribute set, which carries the listing title.
    #[must_use]
    pub fn primary_attributes(&self) -> Option<&ItemAttributes> {
        self.attribute_sets.item_attributes.first()
    }

    #[must_use]
    pub fn asin(&self) -> Option<&str> {
        self.identifiers
            .as_ref()
            .and_then(|ids| ids.marketplace_asin.as_ref())
            .map(|m| m.asin.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MatchedProducts {
    #[serde(default, deserialize_with = "one_or_many")]
    pub product: Vec<MatchedProduct>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub r#type: Option<String>,
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// One `GetMatchingProductForIdResult` element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductMatch {
    /// The identifier that was looked up (the SKU).
    #[serde(rename = "@Id")]
    pub id: String,
    #[serde(rename = "@IdType")]
    pub id_type: String,
    #[serde(rename = "@status")]
    pub status: String,
    #[serde(rename = "Products", default)]
    pub products: Option<MatchedProducts>,
    #[serde(rename = "Error", default)]
    pub error: Option<ApiErrorDetail>,
}

impl ProductMatch {
    #[must_use]
    pub fn first_product(&self) -> Option<&MatchedProduct> {
        self.products.as_ref().and_then(|p| p.product.first())
    }
}

// ---------------------------------------------------------------------------
// Feeds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FeedSubmissionInfo {
    pub feed_submission_id: String,
    #[serde(default)]
    pub feed_type: Option<String>,
    #[serde(default)]
    pub submitted_date: Option<DateTime<Utc>>,
    pub feed_processing_status: String,
}

/// `SubmitFeedResult`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubmitFeedResult {
    pub feed_submission_info: FeedSubmissionInfo,
}

/// `GetFeedSubmissionCountResult`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FeedSubmissionCount {
    #[serde(deserialize_with = "decimal_or_zero")]
    pub count: Decimal,
}

// ---------------------------------------------------------------------------
// Service status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusMessage {
    #[serde(default)]
    pub locale: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusMessages {
    #[serde(default, deserialize_with = "one_or_many")]
    pub message: Vec<StatusMessage>,
}

/// `GetServiceStatusResult`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceStatus {
    /// `GREEN`, `GREEN_I`, `YELLOW` or `RED`.
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub messages: Option<StatusMessages>,
}

impl ServiceStatus {
    /// Human-readable summary of the status followed by every message text.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut summary = match self.status.as_str() {
            "GREEN" | "GREEN_I" => "The service is operating normally.".to_string(),
            "YELLOW" => "The service is experiencing higher than normal error rates \
                         or is operating with degraded performance."
                .to_string(),
            _ => "The service is unavailable or experiencing extremely high error rates."
                .to_string(),
        };

        for message in self.messages.iter().flat_map(|m| &m.message) {
            summary.push(' ');
            summary.push_str(message.text.trim());
        }
        summary
    }
}
