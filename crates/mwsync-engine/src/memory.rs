//! An in-process [`Store`] used by tests and dry runs.
//!
//! Every mutating call increments a write counter so callers can assert that
//! an operation performed no writes.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use mwsync_core::{
    Address, AddressFields, Channel, ContactKind, ContactMechanism, Country, Currency, NewOrder,
    NewProduct, Order, OrderLine, Party, Product, Subdivision,
};
use rust_decimal::Decimal;

use crate::error::StoreError;
use crate::store::Store;

#[derive(Default)]
struct State {
    next_id: i64,
    writes: u64,
    channels: Vec<Channel>,
    currencies: Vec<Currency>,
    countries: Vec<Country>,
    subdivisions: Vec<Subdivision>,
    parties: Vec<Party>,
    contacts: Vec<ContactMechanism>,
    addresses: Vec<Address>,
    products: Vec<Product>,
    stock: HashMap<(i64, String), Decimal>,
    orders: Vec<Order>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_channel(&self, mut channel: Channel) -> Channel {
        let mut state = self.lock();
        channel.id = state.next_id();
        state.channels.push(channel.clone());
        channel
    }

    pub fn add_currency(&self, code: &str, name: &str) -> Currency {
        let mut state = self.lock();
        let currency = Currency {
            id: state.next_id(),
            code: code.to_string(),
            name: name.to_string(),
        };
        state.currencies.push(currency.clone());
        currency
    }

    pub fn add_country(&self, code: &str, name: &str) -> Country {
        let mut state = self.lock();
        let country = Country {
            id: state.next_id(),
            code: code.to_string(),
            name: name.to_string(),
        };
        state.countries.push(country.clone());
        country
    }

    pub fn add_subdivision(&self, country_id: i64, code: &str, name: &str) -> Subdivision {
        let mut state = self.lock();
        let subdivision = Subdivision {
            id: state.next_id(),
            country_id,
            code: code.to_string(),
            name: name.to_string(),
        };
        state.subdivisions.push(subdivision.clone());
        subdivision
    }

    /// Inserts a fully-formed product, assigning fresh ids.
    pub fn add_product(&self, mut product: Product) -> Product {
        let mut state = self.lock();
        product.template_id = state.next_id();
        product.id = state.next_id();
        state.products.push(product.clone());
        product
    }

    pub fn set_stock(&self, product_id: i64, warehouse: &str, quantity: Decimal) {
        self.lock()
            .stock
            .insert((product_id, warehouse.to_string()), quantity);
    }

    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.lock().writes
    }

    #[must_use]
    pub fn channel(&self, id: i64) -> Option<Channel> {
        self.lock().channels.iter().find(|c| c.id == id).cloned()
    }

    #[must_use]
    pub fn parties(&self) -> Vec<Party> {
        self.lock().parties.clone()
    }

    #[must_use]
    pub fn contact_mechanisms(&self) -> Vec<ContactMechanism> {
        self.lock().contacts.clone()
    }

    #[must_use]
    pub fn addresses(&self) -> Vec<Address> {
        self.lock().addresses.clone()
    }

    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.lock().products.clone()
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.lock().orders.clone()
    }
}

impl Store for MemoryStore {
    async fn find_channel(&self, code: &str) -> Result<Option<Channel>, StoreError> {
        Ok(self.lock().channels.iter().find(|c| c.code == code).cloned())
    }

    async fn advance_order_import_time(
        &self,
        channel_id: i64,
        to: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.writes += 1;
        let channel = state
            .channels
            .iter_mut()
            .find(|c| c.id == channel_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "channel",
                key: channel_id.to_string(),
            })?;
        channel.last_order_import_time = channel.last_order_import_time.max(to);
        Ok(())
    }

    async fn advance_product_export_time(
        &self,
        channel_id: i64,
        to: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        state.writes += 1;
        let channel = state
            .channels
            .iter_mut()
            .find(|c| c.id == channel_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "channel",
                key: channel_id.to_string(),
            })?;
        channel.last_product_export_time = Some(match channel.last_product_export_time {
            Some(current) => current.max(to),
            None => to,
        });
        Ok(())
    }

    async fn find_currency(&self, code: &str) -> Result<Option<Currency>, StoreError> {
        Ok(self.lock().currencies.iter().find(|c| c.code == code).cloned())
    }

    async fn find_country(&self, code: &str) -> Result<Option<Country>, StoreError> {
        Ok(self.lock().countries.iter().find(|c| c.code == code).cloned())
    }

    async fn list_subdivisions(&self, country_id: i64) -> Result<Vec<Subdivision>, StoreError> {
        Ok(self
            .lock()
            .subdivisions
            .iter()
            .filter(|s| s.country_id == country_id)
            .cloned()
            .collect())
    }

    async fn find_party_by_email(&self, email: &str) -> Result<Option<Party>, StoreError> {
        Ok(self
            .lock()
            .parties
            .iter()
            .find(|p| p.amazon_email.as_deref() == Some(email))
            .cloned())
    }

    async fn create_party(&self, name: &str, email: &str) -> Result<Party, StoreError> {
        let mut state = self.lock();
        if let Some(existing) = state
            .parties
            .iter()
            .find(|p| p.amazon_email.as_deref() == Some(email))
        {
            return Ok(existing.clone());
        }
        state.writes += 1;
        let party = Party {
            id: state.next_id(),
            name: name.to_string(),
            amazon_email: Some(email.to_string()),
            created_at: Utc::now(),
        };
        state.parties.push(party.clone());
        Ok(party)
    }

    async fn list_contact_mechanisms(
        &self,
        party_id: i64,
    ) -> Result<Vec<ContactMechanism>, StoreError> {
        Ok(self
            .lock()
            .contacts
            .iter()
            .filter(|c| c.party_id == party_id)
            .cloned()
            .collect())
    }

    async fn add_contact_mechanism(
        &self,
        party_id: i64,
        kind: ContactKind,
        value: &str,
    ) -> Result<ContactMechanism, StoreError> {
        let mut state = self.lock();
        state.writes += 1;
        let mechanism = ContactMechanism {
            id: state.next_id(),
            party_id,
            kind,
            value: value.to_string(),
        };
        state.contacts.push(mechanism.clone());
        Ok(mechanism)
    }

    async fn list_addresses(&self, party_id: i64) -> Result<Vec<Address>, StoreError> {
        Ok(self
            .lock()
            .addresses
            .iter()
            .filter(|a| a.party_id == party_id)
            .cloned()
            .collect())
    }

    async fn create_address(
        &self,
        party_id: i64,
        fields: &AddressFields,
    ) -> Result<Address, StoreError> {
        let mut state = self.lock();
        state.writes += 1;
        let address = Address {
            id: state.next_id(),
            party_id,
            fields: fields.clone(),
        };
        state.addresses.push(address.clone());
        Ok(address)
    }

    async fn find_product_by_code(&self, code: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .lock()
            .products
            .iter()
            .find(|p| p.code.as_deref() == Some(code))
            .cloned())
    }

    async fn create_product(&self, new: &NewProduct) -> Result<Product, StoreError> {
        let mut state = self.lock();
        if state
            .products
            .iter()
            .any(|p| p.code.as_deref() == Some(new.code.as_str()))
        {
            return Err(StoreError::Duplicate {
                entity: "product",
                key: new.code.clone(),
            });
        }
        state.writes += 1;
        let product = Product {
            template_id: state.next_id(),
            id: state.next_id(),
            name: new.name.clone(),
            code: Some(new.code.clone()),
            description: new.description.clone(),
            list_price: new.list_price,
            cost_price: new.cost_price,
            default_uom: new.default_uom.clone(),
            export_to_amazon: false,
            delivery_time: 0,
            codes: new.codes.clone(),
            channel_ids: vec![new.channel_id],
            updated_at: Utc::now(),
        };
        state.products.push(product.clone());
        Ok(product)
    }

    async fn list_exportable_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .lock()
            .products
            .iter()
            .filter(|p| p.export_to_amazon)
            .cloned()
            .collect())
    }

    async fn list_channel_products(&self, channel_id: i64) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .lock()
            .products
            .iter()
            .filter(|p| p.is_linked_to(channel_id))
            .cloned()
            .collect())
    }

    async fn link_products(&self, channel_id: i64, product_ids: &[i64]) -> Result<u64, StoreError> {
        let mut state = self.lock();
        let mut linked = 0;
        for product in state
            .products
            .iter_mut()
            .filter(|p| product_ids.contains(&p.id))
        {
            if !product.is_linked_to(channel_id) {
                product.channel_ids.push(channel_id);
                linked += 1;
            }
        }
        state.writes += linked;
        Ok(linked)
    }

    async fn stock_quantity(
        &self,
        product_id: i64,
        warehouse: &str,
    ) -> Result<Decimal, StoreError> {
        Ok(self
            .lock()
            .stock
            .get(&(product_id, warehouse.to_string()))
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn find_order(&self, amazon_order_id: &str) -> Result<Option<Order>, StoreError> {
        Ok(self
            .lock()
            .orders
            .iter()
            .find(|o| o.amazon_order_id == amazon_order_id)
            .cloned())
    }

    async fn create_order(&self, new: &NewOrder) -> Result<Order, StoreError> {
        let mut state = self.lock();
        if state
            .orders
            .iter()
            .any(|o| o.amazon_order_id == new.amazon_order_id)
        {
            return Err(StoreError::Duplicate {
                entity: "order",
                key: new.amazon_order_id.clone(),
            });
        }
        state.writes += 1;

        let order_id = state.next_id();
        let mut lines = Vec::with_capacity(new.lines.len());
        for (position, line) in (1..).zip(&new.lines) {
            lines.push(OrderLine {
                id: state.next_id(),
                order_id,
                sequence: position,
                product_id: line.product_id,
                description: line.description.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                unit: line.unit.clone(),
            });
        }

        let order = Order {
            id: order_id,
            amazon_order_id: new.amazon_order_id.clone(),
            channel_id: new.channel_id,
            party_id: new.party_id,
            invoice_address_id: new.invoice_address_id,
            shipment_address_id: new.shipment_address_id,
            currency_id: new.currency_id,
            sale_date: new.sale_date,
            amazon_status: new.amazon_status.clone(),
            state: new.state,
            lines,
            created_at: Utc::now(),
        };
        state.orders.push(order.clone());
        Ok(order)
    }
}
