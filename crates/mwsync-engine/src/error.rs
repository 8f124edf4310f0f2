use chrono::{DateTime, Utc};
use mwsync_mws::MwsError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the persistence collaborator behind [`crate::Store`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key already exists.
    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("currency '{0}' does not exist")]
    UnknownCurrency(String),

    #[error("country '{0}' does not exist")]
    UnknownCountry(String),

    #[error("state '{region}' does not exist in country {country}")]
    SubdivisionNotFound { region: String, country: String },

    #[error("state '{region}' matches several subdivisions of {country}: {candidates}")]
    AmbiguousSubdivision {
        region: String,
        country: String,
        candidates: String,
    },

    #[error("order {order_id}: line total {actual} does not match expected total {expected}")]
    TotalMismatch {
        order_id: String,
        expected: Decimal,
        actual: Decimal,
    },

    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    #[error("product '{sku}' could not be matched on Amazon: {reason}")]
    ProductLookup { sku: String, reason: String },

    /// A product selected for export lacks a SKU or standard identifiers.
    #[error("product \"{product}\" misses {missing}")]
    MissingProductMetadata { product: String, missing: String },

    #[error("channel '{channel}' has source '{source_kind}', expected amazon_mws")]
    WrongChannelSource { channel: String, source_kind: String },

    #[error("no orders seem to be placed after {since}")]
    OrdersNotFound { since: DateTime<Utc> },

    #[error("{feed_type} feed rejected: {code}: {message}")]
    FeedRejected {
        feed_type: String,
        code: String,
        message: String,
    },

    #[error("failed to encode feed: {0}")]
    FeedEncoding(String),

    #[error("store error: {0}")]
    Store(#[source] StoreError),

    #[error("MWS error: {0}")]
    Mws(#[from] MwsError),
}

impl EngineError {
    /// `true` for errors an unattended run treats as "skip this channel"
    /// rather than a failure.
    #[must_use]
    pub fn is_missing_metadata(&self) -> bool {
        matches!(self, EngineError::MissingProductMetadata { .. })
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate { entity, key } => EngineError::Duplicate { entity, key },
            other => EngineError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_duplicates_become_integrity_errors() {
        let err: EngineError = StoreError::Duplicate {
            entity: "order",
            key: "X1".to_string(),
        }
        .into();
        assert!(matches!(err, EngineError::Duplicate { entity: "order", .. }));
    }

    #[test]
    fn only_missing_metadata_is_skippable() {
        let missing = EngineError::MissingProductMetadata {
            product: "Blue Mug".to_string(),
            missing: "Amazon product identifiers".to_string(),
        };
        assert!(missing.is_missing_metadata());
        assert_eq!(
            missing.to_string(),
            "product \"Blue Mug\" misses Amazon product identifiers"
        );
        assert!(!EngineError::UnknownCurrency("XXX".to_string()).is_missing_metadata());
    }
}
