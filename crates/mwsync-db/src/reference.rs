//! Read-only lookups of currencies, countries and subdivisions.

use mwsync_core::{Country, Currency, Subdivision};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
struct CodeNameRow {
    id: i64,
    code: String,
    name: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SubdivisionRow {
    id: i64,
    country_id: i64,
    code: String,
    name: String,
}

/// Returns the currency with the given ISO 4217 code.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_currency(pool: &PgPool, code: &str) -> Result<Option<Currency>, DbError> {
    let row = sqlx::query_as::<_, CodeNameRow>(
        "SELECT id, code, name FROM currencies WHERE code = $1",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Currency {
        id: r.id,
        code: r.code,
        name: r.name,
    }))
}

/// Returns the country with the given ISO 3166-1 alpha-2 code.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_country(pool: &PgPool, code: &str) -> Result<Option<Country>, DbError> {
    let row = sqlx::query_as::<_, CodeNameRow>(
        "SELECT id, code, name FROM countries WHERE code = $1",
    )
    .bind(code)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| Country {
        id: r.id,
        code: r.code,
        name: r.name,
    }))
}

/// Returns every subdivision of a country, ordered by code.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_subdivisions(
    pool: &PgPool,
    country_id: i64,
) -> Result<Vec<Subdivision>, DbError> {
    let rows = sqlx::query_as::<_, SubdivisionRow>(
        "SELECT id, country_id, code, name \
         FROM subdivisions \
         WHERE country_id = $1 \
         ORDER BY code",
    )
    .bind(country_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| Subdivision {
            id: r.id,
            country_id: r.country_id,
            code: r.code,
            name: r.name,
        })
        .collect())
}
