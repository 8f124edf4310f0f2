//! Database operations for `parties`, `contact_mechanisms` and `addresses`.

use chrono::{DateTime, Utc};
use mwsync_core::{Address, AddressFields, ContactKind, ContactMechanism, Party};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `parties` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PartyRow {
    pub id: i64,
    pub name: String,
    pub amazon_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<PartyRow> for Party {
    fn from(row: PartyRow) -> Self {
        Party {
            id: row.id,
            name: row.name,
            amazon_email: row.amazon_email,
            created_at: row.created_at,
        }
    }
}

/// A row from the `contact_mechanisms` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContactMechanismRow {
    pub id: i64,
    pub party_id: i64,
    pub kind: String,
    pub value: String,
}

impl TryFrom<ContactMechanismRow> for ContactMechanism {
    type Error = DbError;

    fn try_from(row: ContactMechanismRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse::<ContactKind>()
            .map_err(|reason| DbError::InvalidValue {
                column: "contact_mechanisms.kind",
                reason,
            })?;
        Ok(ContactMechanism {
            id: row.id,
            party_id: row.party_id,
            kind,
            value: row.value,
        })
    }
}

/// A row from the `addresses` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AddressRow {
    pub id: i64,
    pub party_id: i64,
    pub name: String,
    pub street: String,
    pub streetbis: Option<String>,
    pub zip: String,
    pub city: String,
    pub country_id: i64,
    pub subdivision_id: i64,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Address {
            id: row.id,
            party_id: row.party_id,
            fields: AddressFields {
                name: row.name,
                street: row.street,
                streetbis: row.streetbis,
                zip: row.zip,
                city: row.city,
                country_id: row.country_id,
                subdivision_id: row.subdivision_id,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// parties operations
// ---------------------------------------------------------------------------

/// Returns the party that owns `email`, if any.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_party_by_email(pool: &PgPool, email: &str) -> Result<Option<PartyRow>, DbError> {
    let row = sqlx::query_as::<_, PartyRow>(
        "SELECT id, name, amazon_email, created_at FROM parties WHERE amazon_email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a party for `email`, or returns the party that already holds it.
///
/// The unique constraint on `amazon_email` decides between concurrent
/// callers; the loser re-reads the winner's row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the row vanished between the insert and
/// the re-read, or [`DbError::Sqlx`] if a query fails.
pub async fn insert_party(pool: &PgPool, name: &str, email: &str) -> Result<PartyRow, DbError> {
    let inserted = sqlx::query_as::<_, PartyRow>(
        "INSERT INTO parties (name, amazon_email) VALUES ($1, $2) \
         ON CONFLICT (amazon_email) DO NOTHING \
         RETURNING id, name, amazon_email, created_at",
    )
    .bind(name)
    .bind(email)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(row) => Ok(row),
        None => find_party_by_email(pool, email)
            .await?
            .ok_or(DbError::NotFound),
    }
}

// ---------------------------------------------------------------------------
// contact_mechanisms operations
// ---------------------------------------------------------------------------

/// Returns every contact mechanism of a party, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_contact_mechanisms(
    pool: &PgPool,
    party_id: i64,
) -> Result<Vec<ContactMechanismRow>, DbError> {
    let rows = sqlx::query_as::<_, ContactMechanismRow>(
        "SELECT id, party_id, kind, value FROM contact_mechanisms \
         WHERE party_id = $1 ORDER BY id",
    )
    .bind(party_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Adds a contact mechanism to a party.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn add_contact_mechanism(
    pool: &PgPool,
    party_id: i64,
    kind: ContactKind,
    value: &str,
) -> Result<ContactMechanismRow, DbError> {
    let row = sqlx::query_as::<_, ContactMechanismRow>(
        "INSERT INTO contact_mechanisms (party_id, kind, value) VALUES ($1, $2, $3) \
         RETURNING id, party_id, kind, value",
    )
    .bind(party_id)
    .bind(kind.as_str())
    .bind(value)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// addresses operations
// ---------------------------------------------------------------------------

/// Returns every address of a party, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_addresses(pool: &PgPool, party_id: i64) -> Result<Vec<AddressRow>, DbError> {
    let rows = sqlx::query_as::<_, AddressRow>(
        "SELECT id, party_id, name, street, streetbis, zip, city, country_id, subdivision_id \
         FROM addresses WHERE party_id = $1 ORDER BY id",
    )
    .bind(party_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Adds an address to a party.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_address(
    pool: &PgPool,
    party_id: i64,
    fields: &AddressFields,
) -> Result<AddressRow, DbError> {
    let row = sqlx::query_as::<_, AddressRow>(
        "INSERT INTO addresses \
             (party_id, name, street, streetbis, zip, city, country_id, subdivision_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id, party_id, name, street, streetbis, zip, city, country_id, subdivision_id",
    )
    .bind(party_id)
    .bind(&fields.name)
    .bind(&fields.street)
    .bind(&fields.streetbis)
    .bind(&fields.zip)
    .bind(&fields.city)
    .bind(fields.country_id)
    .bind(fields.subdivision_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
