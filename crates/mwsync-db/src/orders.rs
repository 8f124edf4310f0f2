//! Database operations for `sale_orders` and `sale_order_lines`.

use chrono::{DateTime, Utc};
use mwsync_core::{NewOrder, Order, OrderLine, OrderState};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `sale_orders` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub amazon_order_id: String,
    pub channel_id: i64,
    pub party_id: i64,
    pub invoice_address_id: i64,
    pub shipment_address_id: i64,
    pub currency_id: i64,
    pub sale_date: DateTime<Utc>,
    pub amazon_status: String,
    pub state: String,
    pub created_at: DateTime<Utc>,
}

/// A row from the `sale_order_lines` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderLineRow {
    pub id: i64,
    pub order_id: i64,
    pub sequence: i32,
    pub product_id: Option<i64>,
    pub description: String,
    pub unit_price: Decimal,
    pub quantity: Decimal,
    pub unit: String,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        OrderLine {
            id: row.id,
            order_id: row.order_id,
            sequence: row.sequence,
            product_id: row.product_id,
            description: row.description,
            unit_price: row.unit_price,
            quantity: row.quantity,
            unit: row.unit,
        }
    }
}

fn assemble(header: OrderRow, lines: Vec<OrderLineRow>) -> Result<Order, DbError> {
    let state = header
        .state
        .parse::<OrderState>()
        .map_err(|reason| DbError::InvalidValue {
            column: "sale_orders.state",
            reason,
        })?;

    Ok(Order {
        id: header.id,
        amazon_order_id: header.amazon_order_id,
        channel_id: header.channel_id,
        party_id: header.party_id,
        invoice_address_id: header.invoice_address_id,
        shipment_address_id: header.shipment_address_id,
        currency_id: header.currency_id,
        sale_date: header.sale_date,
        amazon_status: header.amazon_status,
        state,
        lines: lines.into_iter().map(OrderLine::from).collect(),
        created_at: header.created_at,
    })
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Returns the order imported for an Amazon order id, with its lines.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn find_order(pool: &PgPool, amazon_order_id: &str) -> Result<Option<Order>, DbError> {
    let Some(header) = sqlx::query_as::<_, OrderRow>(
        "SELECT id, amazon_order_id, channel_id, party_id, invoice_address_id, \
                shipment_address_id, currency_id, sale_date, amazon_status, state, created_at \
         FROM sale_orders \
         WHERE amazon_order_id = $1",
    )
    .bind(amazon_order_id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let lines = sqlx::query_as::<_, OrderLineRow>(
        "SELECT id, order_id, sequence, product_id, description, unit_price, quantity, unit \
         FROM sale_order_lines \
         WHERE order_id = $1 \
         ORDER BY sequence",
    )
    .bind(header.id)
    .fetch_all(pool)
    .await?;

    assemble(header, lines).map(Some)
}

/// Writes an order header and all its lines in one transaction. Lines are
/// numbered from 1 in the given order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; an Amazon order id that
/// was already imported surfaces as a unique violation and nothing is
/// written.
pub async fn insert_order(pool: &PgPool, order: &NewOrder) -> Result<Order, DbError> {
    let mut tx = pool.begin().await?;

    let header = sqlx::query_as::<_, OrderRow>(
        "INSERT INTO sale_orders \
             (amazon_order_id, channel_id, party_id, invoice_address_id, shipment_address_id, \
              currency_id, sale_date, amazon_status, state) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id, amazon_order_id, channel_id, party_id, invoice_address_id, \
                   shipment_address_id, currency_id, sale_date, amazon_status, state, created_at",
    )
    .bind(&order.amazon_order_id)
    .bind(order.channel_id)
    .bind(order.party_id)
    .bind(order.invoice_address_id)
    .bind(order.shipment_address_id)
    .bind(order.currency_id)
    .bind(order.sale_date)
    .bind(&order.amazon_status)
    .bind(order.state.as_str())
    .fetch_one(&mut *tx)
    .await?;

    let mut lines = Vec::with_capacity(order.lines.len());
    for (sequence, line) in (1_i32..).zip(&order.lines) {
        let row = sqlx::query_as::<_, OrderLineRow>(
            "INSERT INTO sale_order_lines \
                 (order_id, sequence, product_id, description, unit_price, quantity, unit) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, order_id, sequence, product_id, description, unit_price, quantity, unit",
        )
        .bind(header.id)
        .bind(sequence)
        .bind(line.product_id)
        .bind(&line.description)
        .bind(line.unit_price)
        .bind(line.quantity)
        .bind(&line.unit)
        .fetch_one(&mut *tx)
        .await?;
        lines.push(row);
    }

    tx.commit().await?;
    assemble(header, lines)
}
