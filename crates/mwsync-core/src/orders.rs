//! Sale orders imported from a marketplace.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a local sale order. Imported orders are quoted and
/// confirmed in the same unit of work, so `Confirmed` is the only state a
/// committed import is ever observed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    Draft,
    Quotation,
    Confirmed,
}

impl OrderState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrderState::Draft => "draft",
            OrderState::Quotation => "quotation",
            OrderState::Confirmed => "confirmed",
        }
    }
}

impl std::fmt::Display for OrderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(OrderState::Draft),
            "quotation" => Ok(OrderState::Quotation),
            "confirmed" => Ok(OrderState::Confirmed),
            other => Err(format!("unknown order state '{other}'")),
        }
    }
}

/// A line to be written with a new order. Shipping lines carry no product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub product_id: Option<i64>,
    pub description: String,
    pub unit_price: Decimal,
    pub quantity: Decimal,
    pub unit: String,
}

impl NewOrderLine {
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.unit_price * self.quantity
    }

    #[must_use]
    pub fn is_shipping(&self) -> bool {
        self.product_id.is_none()
    }
}

/// Header and ordered lines of an order about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub amazon_order_id: String,
    pub channel_id: i64,
    pub party_id: i64,
    pub invoice_address_id: i64,
    pub shipment_address_id: i64,
    pub currency_id: i64,
    pub sale_date: DateTime<Utc>,
    /// Upstream order status (`Unshipped`, `PartiallyShipped`, `Shipped`).
    pub amazon_status: String,
    pub state: OrderState,
    pub lines: Vec<NewOrderLine>,
}

impl NewOrder {
    /// Sum of all line amounts.
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.lines.iter().map(NewOrderLine::amount).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    /// Position within the order, starting at 1.
    pub sequence: i32,
    pub product_id: Option<i64>,
    pub description: String,
    pub unit_price: Decimal,
    pub quantity: Decimal,
    pub unit: String,
}

impl OrderLine {
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// Also used as the order reference.
    pub amazon_order_id: String,
    pub channel_id: i64,
    pub party_id: i64,
    pub invoice_address_id: i64,
    pub shipment_address_id: i64,
    pub currency_id: i64,
    pub sale_date: DateTime<Utc>,
    pub amazon_status: String,
    pub state: OrderState,
    pub lines: Vec<OrderLine>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    #[must_use]
    pub fn total_amount(&self) -> Decimal {
        self.lines.iter().map(OrderLine::amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: Option<i64>, unit_price: Decimal, quantity: i64) -> NewOrderLine {
        NewOrderLine {
            product_id,
            description: "Blue Mug".to_string(),
            unit_price,
            quantity: Decimal::from(quantity),
            unit: "Unit".to_string(),
        }
    }

    fn order(lines: Vec<NewOrderLine>) -> NewOrder {
        NewOrder {
            amazon_order_id: "X1".to_string(),
            channel_id: 1,
            party_id: 2,
            invoice_address_id: 3,
            shipment_address_id: 3,
            currency_id: 1,
            sale_date: Utc::now(),
            amazon_status: "Shipped".to_string(),
            state: OrderState::Confirmed,
            lines,
        }
    }

    #[test]
    fn total_sums_price_times_quantity() {
        let new_order = order(vec![
            line(Some(10), Decimal::new(1500, 2), 2),
            line(None, Decimal::new(500, 2), 2),
        ]);
        assert_eq!(new_order.total_amount(), Decimal::new(4000, 2));
    }

    #[test]
    fn empty_order_totals_zero() {
        assert_eq!(order(vec![]).total_amount(), Decimal::ZERO);
    }

    #[test]
    fn shipping_lines_have_no_product() {
        assert!(line(None, Decimal::ONE, 1).is_shipping());
        assert!(!line(Some(1), Decimal::ONE, 1).is_shipping());
    }

    #[test]
    fn state_serializes_lowercase() {
        let json = serde_json::to_string(&OrderState::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
        assert_eq!("quotation".parse::<OrderState>(), Ok(OrderState::Quotation));
        assert!("done".parse::<OrderState>().is_err());
    }
}
