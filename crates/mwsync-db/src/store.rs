//! Postgres implementation of the engine's [`Store`].

use chrono::{DateTime, Utc};
use mwsync_core::{
    Address, AddressFields, Channel, ContactKind, ContactMechanism, Country, Currency, NewOrder,
    NewProduct, Order, Party, Product, Subdivision,
};
use mwsync_engine::{Store, StoreError};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{channels, orders, parties, products, reference, DbError};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a database error onto the engine's error model. Unique violations
/// name the entity and key whose constraint fired.
fn store_error(err: DbError, entity: &'static str, key: impl Into<String>) -> StoreError {
    if err.is_unique_violation() {
        return StoreError::Duplicate {
            entity,
            key: key.into(),
        };
    }
    match err {
        DbError::NotFound => StoreError::NotFound {
            entity,
            key: key.into(),
        },
        other => StoreError::Backend(Box::new(other)),
    }
}

impl Store for PgStore {
    async fn find_channel(&self, code: &str) -> Result<Option<Channel>, StoreError> {
        channels::get_channel_by_code(&self.pool, code)
            .await
            .map(|row| row.map(Channel::from))
            .map_err(|e| store_error(e, "channel", code))
    }

    async fn advance_order_import_time(
        &self,
        channel_id: i64,
        to: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        channels::advance_order_import_time(&self.pool, channel_id, to)
            .await
            .map_err(|e| store_error(e, "channel", channel_id.to_string()))
    }

    async fn advance_product_export_time(
        &self,
        channel_id: i64,
        to: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        channels::advance_product_export_time(&self.pool, channel_id, to)
            .await
            .map_err(|e| store_error(e, "channel", channel_id.to_string()))
    }

    async fn find_currency(&self, code: &str) -> Result<Option<Currency>, StoreError> {
        reference::find_currency(&self.pool, code)
            .await
            .map_err(|e| store_error(e, "currency", code))
    }

    async fn find_country(&self, code: &str) -> Result<Option<Country>, StoreError> {
        reference::find_country(&self.pool, code)
            .await
            .map_err(|e| store_error(e, "country", code))
    }

    async fn list_subdivisions(&self, country_id: i64) -> Result<Vec<Subdivision>, StoreError> {
        reference::list_subdivisions(&self.pool, country_id)
            .await
            .map_err(|e| store_error(e, "country", country_id.to_string()))
    }

    async fn find_party_by_email(&self, email: &str) -> Result<Option<Party>, StoreError> {
        parties::find_party_by_email(&self.pool, email)
            .await
            .map(|row| row.map(Party::from))
            .map_err(|e| store_error(e, "party", email))
    }

    async fn create_party(&self, name: &str, email: &str) -> Result<Party, StoreError> {
        parties::insert_party(&self.pool, name, email)
            .await
            .map(Party::from)
            .map_err(|e| store_error(e, "party", email))
    }

    async fn list_contact_mechanisms(
        &self,
        party_id: i64,
    ) -> Result<Vec<ContactMechanism>, StoreError> {
        let key = party_id.to_string();
        let rows = parties::list_contact_mechanisms(&self.pool, party_id)
            .await
            .map_err(|e| store_error(e, "party", key.clone()))?;
        rows.into_iter()
            .map(ContactMechanism::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| store_error(e, "contact mechanism", key))
    }

    async fn add_contact_mechanism(
        &self,
        party_id: i64,
        kind: ContactKind,
        value: &str,
    ) -> Result<ContactMechanism, StoreError> {
        let row = parties::add_contact_mechanism(&self.pool, party_id, kind, value)
            .await
            .map_err(|e| store_error(e, "contact mechanism", value))?;
        ContactMechanism::try_from(row).map_err(|e| store_error(e, "contact mechanism", value))
    }

    async fn list_addresses(&self, party_id: i64) -> Result<Vec<Address>, StoreError> {
        parties::list_addresses(&self.pool, party_id)
            .await
            .map(|rows| rows.into_iter().map(Address::from).collect())
            .map_err(|e| store_error(e, "party", party_id.to_string()))
    }

    async fn create_address(
        &self,
        party_id: i64,
        fields: &AddressFields,
    ) -> Result<Address, StoreError> {
        parties::create_address(&self.pool, party_id, fields)
            .await
            .map(Address::from)
            .map_err(|e| store_error(e, "address", fields.street.clone()))
    }

    async fn find_product_by_code(&self, code: &str) -> Result<Option<Product>, StoreError> {
        products::find_product_by_code(&self.pool, code)
            .await
            .map_err(|e| store_error(e, "product", code))
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, StoreError> {
        products::insert_product(&self.pool, product)
            .await
            .map_err(|e| store_error(e, "product", product.code.clone()))
    }

    async fn list_exportable_products(&self) -> Result<Vec<Product>, StoreError> {
        products::list_exportable_products(&self.pool)
            .await
            .map_err(|e| store_error(e, "product", "exportable"))
    }

    async fn list_channel_products(&self, channel_id: i64) -> Result<Vec<Product>, StoreError> {
        products::list_channel_products(&self.pool, channel_id)
            .await
            .map_err(|e| store_error(e, "product", format!("channel {channel_id}")))
    }

    async fn link_products(&self, channel_id: i64, product_ids: &[i64]) -> Result<u64, StoreError> {
        products::link_products(&self.pool, channel_id, product_ids)
            .await
            .map_err(|e| store_error(e, "product channel", format!("channel {channel_id}")))
    }

    async fn stock_quantity(
        &self,
        product_id: i64,
        warehouse: &str,
    ) -> Result<Decimal, StoreError> {
        products::stock_quantity(&self.pool, product_id, warehouse)
            .await
            .map_err(|e| store_error(e, "stock level", format!("{product_id}@{warehouse}")))
    }

    async fn find_order(&self, amazon_order_id: &str) -> Result<Option<Order>, StoreError> {
        orders::find_order(&self.pool, amazon_order_id)
            .await
            .map_err(|e| store_error(e, "order", amazon_order_id))
    }

    async fn create_order(&self, order: &NewOrder) -> Result<Order, StoreError> {
        orders::insert_order(&self.pool, order)
            .await
            .map_err(|e| store_error(e, "order", order.amazon_order_id.clone()))
    }
}
