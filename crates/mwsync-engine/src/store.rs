use chrono::{DateTime, Utc};
use mwsync_core::{
    Address, AddressFields, Channel, ContactKind, ContactMechanism, Country, Currency, NewOrder,
    NewProduct, Order, Party, Product, Subdivision,
};
use rust_decimal::Decimal;

use crate::error::StoreError;

/// Persistence operations the engine needs. Each method is its own unit of
/// work; `create_order` writes the header and all lines atomically.
///
/// Implementations must enforce the unique keys (party email, product code,
/// Amazon order id, product/channel pair) themselves so that they hold even
/// when two callers race past a lookup.
#[allow(async_fn_in_trait)]
pub trait Store {
    async fn find_channel(&self, code: &str) -> Result<Option<Channel>, StoreError>;

    /// Moves the order watermark forward; never moves it back.
    async fn advance_order_import_time(
        &self,
        channel_id: i64,
        to: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Moves the product export watermark forward; never moves it back.
    async fn advance_product_export_time(
        &self,
        channel_id: i64,
        to: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn find_currency(&self, code: &str) -> Result<Option<Currency>, StoreError>;

    async fn find_country(&self, code: &str) -> Result<Option<Country>, StoreError>;

    async fn list_subdivisions(&self, country_id: i64) -> Result<Vec<Subdivision>, StoreError>;

    async fn find_party_by_email(&self, email: &str) -> Result<Option<Party>, StoreError>;

    /// Creates a party, or returns the one that already holds `email`.
    async fn create_party(&self, name: &str, email: &str) -> Result<Party, StoreError>;

    async fn list_contact_mechanisms(
        &self,
        party_id: i64,
    ) -> Result<Vec<ContactMechanism>, StoreError>;

    async fn add_contact_mechanism(
        &self,
        party_id: i64,
        kind: ContactKind,
        value: &str,
    ) -> Result<ContactMechanism, StoreError>;

    async fn list_addresses(&self, party_id: i64) -> Result<Vec<Address>, StoreError>;

    async fn create_address(
        &self,
        party_id: i64,
        fields: &AddressFields,
    ) -> Result<Address, StoreError>;

    async fn find_product_by_code(&self, code: &str) -> Result<Option<Product>, StoreError>;

    /// Creates a template and its single product, linked to
    /// `product.channel_id`.
    async fn create_product(&self, product: &NewProduct) -> Result<Product, StoreError>;

    /// Products whose template is flagged for Amazon export.
    async fn list_exportable_products(&self) -> Result<Vec<Product>, StoreError>;

    /// Products already linked to the channel.
    async fn list_channel_products(&self, channel_id: i64) -> Result<Vec<Product>, StoreError>;

    /// Links products to a channel; existing pairs are left alone. Returns
    /// the number of new links.
    async fn link_products(&self, channel_id: i64, product_ids: &[i64]) -> Result<u64, StoreError>;

    /// Quantity on hand for a product in the named warehouse.
    async fn stock_quantity(&self, product_id: i64, warehouse: &str)
        -> Result<Decimal, StoreError>;

    async fn find_order(&self, amazon_order_id: &str) -> Result<Option<Order>, StoreError>;

    /// Writes an order with its lines. Fails with [`StoreError::Duplicate`]
    /// when the Amazon order id is already present.
    async fn create_order(&self, order: &NewOrder) -> Result<Order, StoreError>;
}
