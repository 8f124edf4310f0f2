//! Database operations for `product_templates`, `products`, `product_codes`,
//! `product_channels` and `stock_levels`.
//!
//! Products are returned as [`mwsync_core::Product`], with their template
//! fields, codes and channel links loaded.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use mwsync_core::{CodeType, NewProduct, Product, ProductCode};
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

const PRODUCT_SELECT: &str = "SELECT p.id, p.template_id, t.name, p.code, p.description, \
            t.list_price, t.cost_price, t.default_uom, t.export_to_amazon, t.delivery_time, \
            GREATEST(p.updated_at, t.updated_at) AS updated_at \
     FROM products p \
     JOIN product_templates t ON t.id = p.template_id";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A `products` row joined with its template.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub template_id: i64,
    pub name: String,
    pub code: Option<String>,
    pub description: Option<String>,
    pub list_price: Decimal,
    pub cost_price: Decimal,
    pub default_uom: String,
    pub export_to_amazon: bool,
    pub delivery_time: i32,
    /// Later of the product's and the template's `updated_at`.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductCodeRow {
    product_id: i64,
    code_type: String,
    code: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductChannelRow {
    product_id: i64,
    channel_id: i64,
}

/// Loads codes and channel links for `rows` and assembles domain products.
async fn hydrate(pool: &PgPool, rows: Vec<ProductRow>) -> Result<Vec<Product>, DbError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

    let code_rows = sqlx::query_as::<_, ProductCodeRow>(
        "SELECT product_id, code_type, code FROM product_codes \
         WHERE product_id = ANY($1) ORDER BY id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut codes: HashMap<i64, Vec<ProductCode>> = HashMap::new();
    for row in code_rows {
        let code_type = row
            .code_type
            .parse::<CodeType>()
            .map_err(|reason| DbError::InvalidValue {
                column: "product_codes.code_type",
                reason,
            })?;
        codes.entry(row.product_id).or_default().push(ProductCode {
            code_type,
            code: row.code,
        });
    }

    let channel_rows = sqlx::query_as::<_, ProductChannelRow>(
        "SELECT product_id, channel_id FROM product_channels \
         WHERE product_id = ANY($1) ORDER BY channel_id",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut channels: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in channel_rows {
        channels.entry(row.product_id).or_default().push(row.channel_id);
    }

    Ok(rows
        .into_iter()
        .map(|row| Product {
            codes: codes.remove(&row.id).unwrap_or_default(),
            channel_ids: channels.remove(&row.id).unwrap_or_default(),
            id: row.id,
            template_id: row.template_id,
            name: row.name,
            code: row.code,
            description: row.description,
            list_price: row.list_price,
            cost_price: row.cost_price,
            default_uom: row.default_uom,
            export_to_amazon: row.export_to_amazon,
            delivery_time: row.delivery_time,
            updated_at: row.updated_at,
        })
        .collect())
}

async fn get_product(pool: &PgPool, id: i64) -> Result<Product, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)?;

    hydrate(pool, vec![row])
        .await?
        .pop()
        .ok_or(DbError::NotFound)
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns the product whose seller SKU is `code`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn find_product_by_code(pool: &PgPool, code: &str) -> Result<Option<Product>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.code = $1"))
        .bind(code)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(hydrate(pool, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Returns products whose template is flagged for Amazon export, by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn list_exportable_products(pool: &PgPool) -> Result<Vec<Product>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} WHERE t.export_to_amazon = true ORDER BY p.id"
    ))
    .fetch_all(pool)
    .await?;

    hydrate(pool, rows).await
}

/// Returns products linked to a channel, by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn list_channel_products(
    pool: &PgPool,
    channel_id: i64,
) -> Result<Vec<Product>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "{PRODUCT_SELECT} \
         WHERE EXISTS (SELECT 1 FROM product_channels pc \
                       WHERE pc.product_id = p.id AND pc.channel_id = $1) \
         ORDER BY p.id"
    ))
    .bind(channel_id)
    .fetch_all(pool)
    .await?;

    hydrate(pool, rows).await
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Creates a template, its single product, the product's codes and its link
/// to `product.channel_id`, in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; a product code that is
/// already taken surfaces as a unique violation.
pub async fn insert_product(pool: &PgPool, product: &NewProduct) -> Result<Product, DbError> {
    let mut tx = pool.begin().await?;

    let template_id: i64 = sqlx::query_scalar(
        "INSERT INTO product_templates \
             (name, list_price, cost_price, default_uom, sale_uom, salable, \
              account_revenue, account_expense) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id",
    )
    .bind(&product.name)
    .bind(product.list_price)
    .bind(product.cost_price)
    .bind(&product.default_uom)
    .bind(&product.sale_uom)
    .bind(product.salable)
    .bind(&product.account_revenue)
    .bind(&product.account_expense)
    .fetch_one(&mut *tx)
    .await?;

    let product_id: i64 = sqlx::query_scalar(
        "INSERT INTO products (template_id, code, description) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(template_id)
    .bind(&product.code)
    .bind(&product.description)
    .fetch_one(&mut *tx)
    .await?;

    for code in &product.codes {
        sqlx::query(
            "INSERT INTO product_codes (product_id, code_type, code) VALUES ($1, $2, $3) \
             ON CONFLICT (product_id, code_type) DO UPDATE SET code = EXCLUDED.code",
        )
        .bind(product_id)
        .bind(code.code_type.as_str())
        .bind(&code.code)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("INSERT INTO product_channels (product_id, channel_id) VALUES ($1, $2)")
        .bind(product_id)
        .bind(product.channel_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    get_product(pool, product_id).await
}

/// Links products to a channel. Pairs that already exist are skipped.
///
/// Returns the number of new links.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn link_products(
    pool: &PgPool,
    channel_id: i64,
    product_ids: &[i64],
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "INSERT INTO product_channels (product_id, channel_id) \
         SELECT UNNEST($1::BIGINT[]), $2 \
         ON CONFLICT (product_id, channel_id) DO NOTHING",
    )
    .bind(product_ids)
    .bind(channel_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Quantity on hand of a product in a warehouse; zero when no level is
/// recorded.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn stock_quantity(
    pool: &PgPool,
    product_id: i64,
    warehouse: &str,
) -> Result<Decimal, DbError> {
    let quantity: Option<Decimal> = sqlx::query_scalar(
        "SELECT quantity FROM stock_levels WHERE product_id = $1 AND warehouse = $2",
    )
    .bind(product_id)
    .bind(warehouse)
    .fetch_optional(pool)
    .await?;

    Ok(quantity.unwrap_or(Decimal::ZERO))
}

/// Records the quantity on hand of a product in a warehouse.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn set_stock_quantity(
    pool: &PgPool,
    product_id: i64,
    warehouse: &str,
    quantity: Decimal,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO stock_levels (product_id, warehouse, quantity) VALUES ($1, $2, $3) \
         ON CONFLICT (product_id, warehouse) DO UPDATE SET \
             quantity = EXCLUDED.quantity, \
             updated_at = NOW()",
    )
    .bind(product_id)
    .bind(warehouse)
    .bind(quantity)
    .execute(pool)
    .await?;

    Ok(())
}
