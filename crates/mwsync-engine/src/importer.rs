//! Turns one Amazon order into one confirmed local sale order.

use mwsync_core::{Channel, NewOrder, NewOrderLine, Order, OrderState};
use mwsync_mws::{MwsApi, Order as AmazonOrder, OrderItem};
use rust_decimal::Decimal;

use crate::error::EngineError;
use crate::resolver::EntityResolver;
use crate::store::Store;

/// Description given to the synthetic shipping line of an order item.
pub const SHIPPING_LINE_LABEL: &str = "Amazon Shipping and Handling";

/// Result of [`import_order`].
#[derive(Debug, Clone)]
pub struct ImportedOrder {
    pub order: Order,
    /// `false` when the order already existed and nothing was fetched.
    pub created: bool,
}

/// Number of items the declared order total is multiplied by, selected by
/// the order status.
#[must_use]
pub fn item_count(order: &AmazonOrder) -> Decimal {
    match order.order_status.as_str() {
        "Unshipped" => order.number_of_items_unshipped,
        "PartiallyShipped" => order.number_of_items_shipped + order.number_of_items_unshipped,
        _ => order.number_of_items_shipped,
    }
}

/// The total the order's lines must add up to.
#[must_use]
pub fn expected_total(order: &AmazonOrder) -> Decimal {
    order.order_total.amount * item_count(order)
}

/// Sum of the lines an order's items will produce: item price and
/// shipping, each times the ordered quantity.
#[must_use]
pub fn items_total(items: &[OrderItem]) -> Decimal {
    items
        .iter()
        .map(|item| (item.item_price.amount + item.shipping_amount()) * item.quantity_ordered)
        .sum()
}

/// Builds the order lines: one product line per item in order, followed by
/// one shipping line per item that charges shipping.
///
/// `product_ids` must be parallel to `items`.
#[must_use]
pub fn build_lines(items: &[OrderItem], product_ids: &[i64], unit: &str) -> Vec<NewOrderLine> {
    let product_lines = items.iter().zip(product_ids).map(|(item, product_id)| NewOrderLine {
        product_id: Some(*product_id),
        description: item.title.clone(),
        unit_price: item.item_price.amount,
        quantity: item.quantity_ordered,
        unit: unit.to_string(),
    });

    let shipping_lines = items
        .iter()
        .filter(|item| !item.shipping_amount().is_zero())
        .map(|item| NewOrderLine {
            product_id: None,
            description: SHIPPING_LINE_LABEL.to_string(),
            unit_price: item.shipping_amount(),
            quantity: item.quantity_ordered,
            unit: unit.to_string(),
        });

    product_lines.chain(shipping_lines).collect()
}

/// Imports the Amazon order `amazon_order_id` into `channel`.
///
/// An order that already exists is returned as is, without any API call or
/// write. Otherwise the order and its items are fetched, every lookup is
/// resolved, totals are checked, and the order is written confirmed in a
/// single store call. Nothing is written if the currency, location or totals
/// do not check out.
///
/// # Errors
///
/// Returns lookup errors ([`EngineError::UnknownCurrency`],
/// [`EngineError::UnknownCountry`], [`EngineError::SubdivisionNotFound`]),
/// [`EngineError::TotalMismatch`], [`EngineError::Duplicate`], or
/// propagates API and store failures.
pub async fn import_order<S: Store, A: MwsApi>(
    store: &S,
    api: &A,
    channel: &Channel,
    amazon_order_id: &str,
) -> Result<ImportedOrder, EngineError> {
    if let Some(order) = store.find_order(amazon_order_id).await? {
        tracing::debug!(order_id = amazon_order_id, "order already imported");
        return Ok(ImportedOrder {
            order,
            created: false,
        });
    }

    let payload = api.get_order(amazon_order_id).await?;
    let items = api.list_order_items(&payload.amazon_order_id).await?;

    let currency_code = payload.order_total.currency_code.trim();
    let currency = store
        .find_currency(currency_code)
        .await?
        .ok_or_else(|| EngineError::UnknownCurrency(currency_code.to_string()))?;

    let expected = expected_total(&payload);
    let actual = items_total(&items);
    if expected != actual {
        return Err(EngineError::TotalMismatch {
            order_id: payload.amazon_order_id.clone(),
            expected,
            actual,
        });
    }

    let resolver = EntityResolver::new(store, api, channel);
    let location = resolver.resolve_location(&payload.shipping_address).await?;

    let mut product_ids = Vec::with_capacity(items.len());
    for item in &items {
        product_ids.push(resolver.resolve_product(&item.seller_sku).await?.id);
    }

    let buyer_name = payload
        .buyer_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(&payload.buyer_email);
    let party = resolver
        .resolve_party(buyer_name, &payload.buyer_email)
        .await?;
    if let Some(phone) = &payload.shipping_address.phone {
        resolver.attach_phone(&party, phone).await?;
    }
    let address = resolver
        .resolve_address(&party, &payload.shipping_address, &location)
        .await?;

    let new_order = NewOrder {
        amazon_order_id: payload.amazon_order_id.clone(),
        channel_id: channel.id,
        party_id: party.id,
        invoice_address_id: address.id,
        shipment_address_id: address.id,
        currency_id: currency.id,
        sale_date: payload.purchase_date,
        amazon_status: payload.order_status.clone(),
        state: OrderState::Confirmed,
        lines: build_lines(&items, &product_ids, &channel.default_uom),
    };

    let order = store.create_order(&new_order).await?;
    tracing::info!(
        order_id = %order.amazon_order_id,
        lines = order.lines.len(),
        total = %order.total_amount(),
        "imported order"
    );

    Ok(ImportedOrder {
        order,
        created: true,
    })
}

#[cfg(test)]
mod tests {
    use mwsync_mws::Money;

    use super::*;

    fn money(amount: i64) -> Money {
        Money {
            currency_code: "USD".to_string(),
            amount: Decimal::new(amount, 2),
        }
    }

    fn item(sku: &str, price: i64, shipping: Option<i64>, quantity: i64) -> OrderItem {
        OrderItem {
            asin: None,
            seller_sku: sku.to_string(),
            order_item_id: None,
            title: format!("Item {sku}"),
            quantity_ordered: Decimal::from(quantity),
            item_price: money(price),
            shipping_price: shipping.map(money),
        }
    }

    #[test]
    fn shipping_adds_one_line_per_charged_item() {
        let items = [item("A", 1500, Some(500), 1)];
        let lines = build_lines(&items, &[7], "Unit");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, Some(7));
        assert!(lines[1].is_shipping());
        assert_eq!(lines[1].description, SHIPPING_LINE_LABEL);
        assert_eq!(lines[1].unit_price, Decimal::new(500, 2));
    }

    #[test]
    fn zero_or_missing_shipping_adds_no_line() {
        let items = [item("A", 1500, Some(0), 1), item("B", 900, None, 2)];
        let lines = build_lines(&items, &[7, 8], "Unit");
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| !l.is_shipping()));
    }

    #[test]
    fn shipping_lines_follow_product_lines_and_repeat_quantity() {
        let items = [item("A", 1000, Some(200), 3), item("B", 500, Some(100), 1)];
        let lines = build_lines(&items, &[1, 2], "Unit");
        let kinds: Vec<bool> = lines.iter().map(NewOrderLine::is_shipping).collect();
        assert_eq!(kinds, vec![false, false, true, true]);
        assert_eq!(lines[2].quantity, Decimal::from(3));
    }

    #[test]
    fn items_total_matches_built_lines() {
        let items = [item("A", 1000, Some(200), 3), item("B", 500, None, 2)];
        let lines = build_lines(&items, &[1, 2], "Unit");
        let from_lines: Decimal = lines.iter().map(NewOrderLine::amount).sum();
        assert_eq!(items_total(&items), from_lines);
        assert_eq!(from_lines, Decimal::new(4600, 2));
    }
}
