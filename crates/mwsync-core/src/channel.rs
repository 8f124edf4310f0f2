use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// `source` value identifying an Amazon Marketplace Web Service channel.
pub const AMAZON_MWS_SOURCE: &str = "amazon_mws";

/// How far back the first order import of a new channel reaches.
pub const INITIAL_IMPORT_LOOKBACK_DAYS: i64 = 30;

/// One configured seller-marketplace integration.
///
/// `last_order_import_time` and `last_product_export_time` are the channel's
/// watermarks. They are only moved forward by the sync driver after a run
/// commits.
#[derive(Clone, Serialize, Deserialize)]
pub struct Channel {
    pub id: i64,
    /// Stable operator-facing handle, e.g. `"amazon-us"`.
    pub code: String,
    pub name: String,
    /// Integration kind. Only `"amazon_mws"` channels are synced.
    pub source: String,
    pub merchant_id: String,
    pub marketplace_id: String,
    pub access_key: String,
    pub secret_key: String,
    /// ISO 4217 code used for `StandardPrice` in pricing feeds.
    pub currency_code: String,
    /// Unit of measure applied to imported lines and created products.
    pub default_uom: String,
    pub default_account_revenue: Option<String>,
    pub default_account_expense: Option<String>,
    /// Warehouse whose stock is reported in inventory feeds.
    pub warehouse: String,
    pub last_order_import_time: DateTime<Utc>,
    pub last_product_export_time: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Channel {
    #[must_use]
    pub fn is_amazon_mws(&self) -> bool {
        self.source == AMAZON_MWS_SOURCE
    }

    /// Watermark assigned to a channel that has never imported orders.
    #[must_use]
    pub fn default_last_order_import_time(now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(INITIAL_IMPORT_LOOKBACK_DAYS)
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("code", &self.code)
            .field("name", &self.name)
            .field("source", &self.source)
            .field("merchant_id", &self.merchant_id)
            .field("marketplace_id", &self.marketplace_id)
            .field("access_key", &"[redacted]")
            .field("secret_key", &"[redacted]")
            .field("currency_code", &self.currency_code)
            .field("default_uom", &self.default_uom)
            .field("default_account_revenue", &self.default_account_revenue)
            .field("default_account_expense", &self.default_account_expense)
            .field("warehouse", &self.warehouse)
            .field("last_order_import_time", &self.last_order_import_time)
            .field("last_product_export_time", &self.last_product_export_time)
            .field("is_active", &self.is_active)
            .finish()
    }
}
