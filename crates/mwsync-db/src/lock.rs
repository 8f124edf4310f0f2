//! Per-channel session advisory locks.
//!
//! Scheduled and manual runs against the same channel must not overlap; the
//! lock lives on one pooled connection for as long as the run holds it.

use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};

use crate::DbError;

/// An advisory lock held on a channel.
///
/// Dropping the guard without [`ChannelLock::release`] closes its connection,
/// which makes Postgres drop the session lock as well.
pub struct ChannelLock {
    conn: PoolConnection<Postgres>,
    channel_id: i64,
}

impl ChannelLock {
    /// Takes the channel's lock without waiting. Returns `None` when another
    /// session holds it.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if a connection cannot be acquired or the
    /// lock query fails.
    pub async fn try_acquire(pool: &PgPool, channel_id: i64) -> Result<Option<Self>, DbError> {
        let mut conn = pool.acquire().await?;
        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1)")
            .bind(channel_id)
            .fetch_one(&mut *conn)
            .await?;

        if !acquired {
            return Ok(None);
        }

        // A pooled connection must never go back to the pool still holding
        // the lock.
        conn.close_on_drop();
        tracing::debug!(channel_id, "channel lock acquired");
        Ok(Some(Self { conn, channel_id }))
    }

    #[must_use]
    pub fn channel_id(&self) -> i64 {
        self.channel_id
    }

    /// Releases the lock.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlx`] if the unlock query fails; the connection is
    /// closed either way.
    pub async fn release(mut self) -> Result<(), DbError> {
        let released: bool = sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
            .bind(self.channel_id)
            .fetch_one(&mut *self.conn)
            .await?;

        if !released {
            tracing::warn!(channel_id = self.channel_id, "channel lock was not held at release");
        }
        Ok(())
    }
}
