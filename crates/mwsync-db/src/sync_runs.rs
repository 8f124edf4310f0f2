//! Database operations for `sync_runs`, the operator-facing log of import
//! and export runs.
//!
//! A run moves `queued -> running -> succeeded | failed | skipped`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const SYNC_RUN_COLUMNS: &str = "id, public_id, channel_id, run_type, trigger_source, status, \
     started_at, completed_at, records_processed, feed_submission_id, error_message, created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncRunType {
    ImportOrders,
    ExportCatalog,
    ExportPricing,
    ExportInventory,
}

impl SyncRunType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SyncRunType::ImportOrders => "import_orders",
            SyncRunType::ExportCatalog => "export_catalog",
            SyncRunType::ExportPricing => "export_pricing",
            SyncRunType::ExportInventory => "export_inventory",
        }
    }
}

impl std::fmt::Display for SyncRunType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    Cli,
    Scheduler,
}

impl TriggerSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerSource::Cli => "cli",
            TriggerSource::Scheduler => "scheduler",
        }
    }
}

/// A row from the `sync_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SyncRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub channel_id: i64,
    pub run_type: String,
    pub trigger_source: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub records_processed: i32,
    pub feed_submission_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Creates a new run in `queued` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_sync_run(
    pool: &PgPool,
    channel_id: i64,
    run_type: SyncRunType,
    trigger: TriggerSource,
) -> Result<SyncRunRow, DbError> {
    let row = sqlx::query_as::<_, SyncRunRow>(&format!(
        "INSERT INTO sync_runs (public_id, channel_id, run_type, trigger_source, status) \
         VALUES ($1, $2, $3, $4, 'queued') \
         RETURNING {SYNC_RUN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(channel_id)
    .bind(run_type.as_str())
    .bind(trigger.as_str())
    .fetch_one(pool)
    .await?;

    Ok(row)
}

fn ensure_transitioned(
    result: &sqlx::postgres::PgQueryResult,
    id: i64,
    expected_status: &'static str,
) -> Result<(), DbError> {
    if result.rows_affected() == 0 {
        return Err(DbError::InvalidSyncRunTransition {
            id,
            expected_status,
        });
    }
    Ok(())
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] unless the run is queued,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn start_sync_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    ensure_transitioned(&result, id, "queued")
}

/// Marks a run as `succeeded` with its record count and, for exports, the
/// feed submission id.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] unless the run is running,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn complete_sync_run(
    pool: &PgPool,
    id: i64,
    records_processed: i32,
    feed_submission_id: Option<&str>,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             records_processed = $1, feed_submission_id = $2 \
         WHERE id = $3 AND status = 'running'",
    )
    .bind(records_processed)
    .bind(feed_submission_id)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_transitioned(&result, id, "running")
}

/// Marks a run as `failed` with an error message.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] unless the run is running,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn fail_sync_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_transitioned(&result, id, "running")
}

/// Marks a run as `skipped`, recording why in `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidSyncRunTransition`] unless the run is running,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn skip_sync_run(pool: &PgPool, id: i64, reason: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE sync_runs \
         SET status = 'skipped', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(reason)
    .bind(id)
    .execute(pool)
    .await?;

    ensure_transitioned(&result, id, "running")
}

/// Fetches a single run by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_sync_run(pool: &PgPool, id: i64) -> Result<SyncRunRow, DbError> {
    let row = sqlx::query_as::<_, SyncRunRow>(&format!(
        "SELECT {SYNC_RUN_COLUMNS} FROM sync_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs of a channel, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_sync_runs(
    pool: &PgPool,
    channel_id: i64,
    limit: i64,
) -> Result<Vec<SyncRunRow>, DbError> {
    let rows = sqlx::query_as::<_, SyncRunRow>(&format!(
        "SELECT {SYNC_RUN_COLUMNS} FROM sync_runs \
         WHERE channel_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2"
    ))
    .bind(channel_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
