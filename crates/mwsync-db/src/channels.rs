//! Database operations for the `channels` table.

use chrono::{DateTime, Utc};
use mwsync_core::channels::ChannelConfig;
use mwsync_core::Channel;
use sqlx::PgPool;

use crate::DbError;

const CHANNEL_COLUMNS: &str = "id, code, name, source, merchant_id, marketplace_id, access_key, \
     secret_key, currency_code, default_uom, default_account_revenue, default_account_expense, \
     warehouse, last_order_import_time, last_product_export_time, is_active, created_at, updated_at";

/// A row from the `channels` table.
#[derive(Clone, sqlx::FromRow)]
pub struct ChannelRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub source: String,
    pub merchant_id: String,
    pub marketplace_id: String,
    pub access_key: String,
    pub secret_key: String,
    pub currency_code: String,
    pub default_uom: String,
    pub default_account_revenue: Option<String>,
    pub default_account_expense: Option<String>,
    pub warehouse: String,
    pub last_order_import_time: DateTime<Utc>,
    pub last_product_export_time: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ChannelRow> for Channel {
    fn from(row: ChannelRow) -> Self {
        Channel {
            id: row.id,
            code: row.code,
            name: row.name,
            source: row.source,
            merchant_id: row.merchant_id,
            marketplace_id: row.marketplace_id,
            access_key: row.access_key,
            secret_key: row.secret_key,
            currency_code: row.currency_code,
            default_uom: row.default_uom,
            default_account_revenue: row.default_account_revenue,
            default_account_expense: row.default_account_expense,
            warehouse: row.warehouse,
            last_order_import_time: row.last_order_import_time,
            last_product_export_time: row.last_product_export_time,
            is_active: row.is_active,
        }
    }
}

/// Returns all channels ordered by code, optionally only the active ones.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_channels(pool: &PgPool, active_only: bool) -> Result<Vec<ChannelRow>, DbError> {
    let rows = sqlx::query_as::<_, ChannelRow>(&format!(
        "SELECT {CHANNEL_COLUMNS} FROM channels \
         WHERE ($1 = false OR is_active = true) \
         ORDER BY code"
    ))
    .bind(active_only)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a channel by code, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_channel_by_code(pool: &PgPool, code: &str) -> Result<Option<ChannelRow>, DbError> {
    let row = sqlx::query_as::<_, ChannelRow>(&format!(
        "SELECT {CHANNEL_COLUMNS} FROM channels WHERE code = $1"
    ))
    .bind(code)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Upsert channels from config, keyed by code. Watermarks of existing
/// channels are left untouched.
///
/// Returns the number of channels processed. All upserts run inside a single
/// transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_channels(pool: &PgPool, channels: &[ChannelConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for channel in channels {
        sqlx::query(
            "INSERT INTO channels (code, name, source, merchant_id, marketplace_id, access_key, \
                                   secret_key, currency_code, default_uom, default_account_revenue, \
                                   default_account_expense, warehouse, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT (code) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 source = EXCLUDED.source, \
                 merchant_id = EXCLUDED.merchant_id, \
                 marketplace_id = EXCLUDED.marketplace_id, \
                 access_key = EXCLUDED.access_key, \
                 secret_key = EXCLUDED.secret_key, \
                 currency_code = EXCLUDED.currency_code, \
                 default_uom = EXCLUDED.default_uom, \
                 default_account_revenue = EXCLUDED.default_account_revenue, \
                 default_account_expense = EXCLUDED.default_account_expense, \
                 warehouse = EXCLUDED.warehouse, \
                 is_active = EXCLUDED.is_active, \
                 updated_at = NOW()",
        )
        .bind(&channel.code)
        .bind(&channel.name)
        .bind(&channel.source)
        .bind(&channel.merchant_id)
        .bind(&channel.marketplace_id)
        .bind(&channel.access_key)
        .bind(&channel.secret_key)
        .bind(&channel.currency_code)
        .bind(&channel.default_uom)
        .bind(&channel.default_account_revenue)
        .bind(&channel.default_account_expense)
        .bind(&channel.warehouse)
        .bind(channel.is_active)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}

/// Moves the order import watermark to `to` unless it is already later.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the channel does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn advance_order_import_time(
    pool: &PgPool,
    channel_id: i64,
    to: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE channels \
         SET last_order_import_time = GREATEST(last_order_import_time, $1), updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(to)
    .bind(channel_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Moves the product export watermark to `to` unless it is already later.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the channel does not exist, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn advance_product_export_time(
    pool: &PgPool,
    channel_id: i64,
    to: DateTime<Utc>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE channels \
         SET last_product_export_time = GREATEST(COALESCE(last_product_export_time, $1), $1), \
             updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(to)
    .bind(channel_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
