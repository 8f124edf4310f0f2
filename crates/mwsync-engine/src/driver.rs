//! One import or export run for one channel.
//!
//! The driver reads the channel (and so its watermarks) once, when it is
//! constructed, and moves a watermark only after the run's writes are done.
//! Callers are expected to hold a per-channel lock for the lifetime of a
//! driver.

use chrono::{DateTime, Utc};
use mwsync_core::{Channel, Product};
use mwsync_mws::{FeedSubmissionInfo, FeedType, MwsApi, MwsError, OrderStatus};
use rust_decimal::Decimal;

use crate::error::{EngineError, StoreError};
use crate::feeds::{
    build_catalog_feed, build_inventory_feed, build_pricing_feed, check_listable, FeedEnvelope,
};
use crate::importer::import_order;
use crate::store::Store;

pub const SETTINGS_OK_MESSAGE: &str = "Account settings have been configured correctly";
pub const SETTINGS_FAILED_MESSAGE: &str = "Something went wrong. Please check account settings again";

/// How a run ended when it did not fail.
#[derive(Debug, Clone)]
pub enum RunOutcome<T> {
    Completed(T),
    /// Unattended run abandoned because of missing product data.
    Skipped { reason: String },
}

impl<T> RunOutcome<T> {
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self, RunOutcome::Skipped { .. })
    }
}

#[derive(Debug, Clone)]
pub struct OrderFailure {
    pub amazon_order_id: String,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    /// Watermark the run listed orders from.
    pub since: DateTime<Utc>,
    pub listed: usize,
    pub created: Vec<String>,
    pub existing: Vec<String>,
    pub failed: Vec<OrderFailure>,
    /// New watermark, when the run moved it.
    pub advanced_to: Option<DateTime<Utc>>,
}

impl ImportReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ExportReport {
    pub feed_type: FeedType,
    pub messages: usize,
    /// `None` when there was nothing to send.
    pub submission: Option<FeedSubmissionInfo>,
}

/// Which products a catalog export sends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogSelection {
    /// Explicit SKUs. Each must exist and be listable.
    pub skus: Vec<String>,
    /// With no explicit SKUs: only products changed since the last export.
    pub changed_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCheck {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsCheck {
    pub ok: bool,
    pub message: String,
    pub detail: Option<String>,
}

/// `true` when a product has what every feed needs to address it.
fn is_listable(product: &Product) -> bool {
    check_listable(product).is_ok()
}

pub struct SyncDriver<'a, S, A> {
    store: &'a S,
    api: &'a A,
    channel: &'a Channel,
}

impl<'a, S: Store, A: MwsApi> SyncDriver<'a, S, A> {
    /// # Errors
    ///
    /// Returns [`EngineError::WrongChannelSource`] unless the channel is an
    /// Amazon MWS channel.
    pub fn new(store: &'a S, api: &'a A, channel: &'a Channel) -> Result<Self, EngineError> {
        if !channel.is_amazon_mws() {
            return Err(EngineError::WrongChannelSource {
                channel: channel.code.clone(),
                source_kind: channel.source.clone(),
            });
        }
        Ok(Self {
            store,
            api,
            channel,
        })
    }

    fn settle<T>(
        &self,
        result: Result<T, EngineError>,
        silent: bool,
    ) -> Result<RunOutcome<T>, EngineError> {
        match result {
            Ok(value) => Ok(RunOutcome::Completed(value)),
            Err(err) if silent && err.is_missing_metadata() => {
                tracing::warn!(channel = %self.channel.code, error = %err, "skipping run");
                Ok(RunOutcome::Skipped {
                    reason: err.to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }

    /// Imports every importable order created since the channel's order
    /// watermark.
    ///
    /// Each order is its own unit of work: a failing order is recorded in
    /// the report and the others are still imported. Once every listed
    /// order has been attempted the watermark moves to the run's start time,
    /// so a failed order is not listed again by later runs.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OrdersNotFound`] when nothing was listed and
    /// `silent` is off, or propagates listing and watermark-write failures.
    pub async fn run_import(&self, silent: bool) -> Result<RunOutcome<ImportReport>, EngineError> {
        let channel = self.channel;
        let run_started = Utc::now();
        let since = channel.last_order_import_time;
        tracing::info!(channel = %channel.code, %since, "importing orders");

        let summaries = self
            .api
            .list_orders(&channel.marketplace_id, since, &OrderStatus::IMPORTABLE)
            .await?;
        if summaries.is_empty() && !silent {
            return Err(EngineError::OrdersNotFound { since });
        }

        let mut report = ImportReport {
            since,
            listed: summaries.len(),
            created: Vec::new(),
            existing: Vec::new(),
            failed: Vec::new(),
            advanced_to: None,
        };

        for summary in &summaries {
            let order_id = summary.amazon_order_id.as_str();
            match import_order(self.store, self.api, channel, order_id).await {
                Ok(imported) if imported.created => report.created.push(order_id.to_string()),
                Ok(_) => report.existing.push(order_id.to_string()),
                Err(err) => {
                    tracing::warn!(
                        channel = %channel.code,
                        order_id,
                        error = %err,
                        "order import failed"
                    );
                    report.failed.push(OrderFailure {
                        amazon_order_id: order_id.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        self.store
            .advance_order_import_time(channel.id, run_started)
            .await?;
        report.advanced_to = Some(run_started);

        tracing::info!(
            channel = %channel.code,
            listed = report.listed,
            created = report.created.len(),
            existing = report.existing.len(),
            failed = report.failed.len(),
            "order import finished"
        );
        Ok(RunOutcome::Completed(report))
    }

    /// Sends the catalog feed, links the sent products to the channel and
    /// moves the export watermark.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingProductMetadata`] (unless `silent`), a
    /// not-found store error for an unknown explicit SKU,
    /// [`EngineError::FeedRejected`], or propagates other failures.
    pub async fn run_export_catalog(
        &self,
        selection: &CatalogSelection,
        silent: bool,
    ) -> Result<RunOutcome<ExportReport>, EngineError> {
        let result = self.export_catalog(selection).await;
        self.settle(result, silent)
    }

    async fn export_catalog(
        &self,
        selection: &CatalogSelection,
    ) -> Result<ExportReport, EngineError> {
        let channel = self.channel;
        let run_started = Utc::now();

        let products = if selection.skus.is_empty() {
            self.changed_exportable_products(selection.changed_only)
                .await?
        } else {
            let mut products = Vec::with_capacity(selection.skus.len());
            for sku in &selection.skus {
                let product = self.store.find_product_by_code(sku).await?.ok_or_else(|| {
                    StoreError::NotFound {
                        entity: "product",
                        key: sku.clone(),
                    }
                })?;
                products.push(product);
            }
            products
        };

        let feed = build_catalog_feed(channel, &products)?;
        let report = self.submit(&feed).await?;

        if report.submission.is_some() {
            let linked = self
                .store
                .link_products(channel.id, &feed.product_ids)
                .await?;
            self.store
                .advance_product_export_time(channel.id, run_started)
                .await?;
            tracing::debug!(channel = %channel.code, linked, "linked exported products");
        }
        Ok(report)
    }

    async fn changed_exportable_products(
        &self,
        changed_only: bool,
    ) -> Result<Vec<Product>, EngineError> {
        let since = self
            .channel
            .last_product_export_time
            .filter(|_| changed_only);
        let candidates = self.store.list_exportable_products().await?;
        let total = candidates.len();

        let selected: Vec<Product> = candidates
            .into_iter()
            .filter(is_listable)
            .filter(|p| since.map_or(true, |since| p.updated_at > since))
            .collect();

        tracing::debug!(
            channel = %self.channel.code,
            candidates = total,
            selected = selected.len(),
            "selected catalog products"
        );
        Ok(selected)
    }

    async fn linked_listable_products(&self) -> Result<Vec<Product>, EngineError> {
        Ok(self
            .store
            .list_channel_products(self.channel.id)
            .await?
            .into_iter()
            .filter(is_listable)
            .collect())
    }

    /// Sends list prices of every product already exported to the channel.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::FeedRejected`] or propagates other failures.
    pub async fn run_export_pricing(
        &self,
        silent: bool,
    ) -> Result<RunOutcome<ExportReport>, EngineError> {
        let result = async {
            let products = self.linked_listable_products().await?;
            let feed = build_pricing_feed(self.channel, &products)?;
            self.submit(&feed).await
        }
        .await;
        self.settle(result, silent)
    }

    /// Sends stock levels in the channel's warehouse for every product
    /// already exported to the channel.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::FeedRejected`] or propagates other failures.
    pub async fn run_export_inventory(
        &self,
        silent: bool,
    ) -> Result<RunOutcome<ExportReport>, EngineError> {
        let result = async {
            let products = self.linked_listable_products().await?;
            let mut stock: Vec<(Product, Decimal)> = Vec::with_capacity(products.len());
            for product in products {
                let quantity = self
                    .store
                    .stock_quantity(product.id, &self.channel.warehouse)
                    .await?;
                stock.push((product, quantity));
            }
            let feed = build_inventory_feed(self.channel, &stock)?;
            self.submit(&feed).await
        }
        .await;
        self.settle(result, silent)
    }

    async fn submit(&self, feed: &FeedEnvelope) -> Result<ExportReport, EngineError> {
        let channel = self.channel;
        if feed.is_empty() {
            tracing::info!(
                channel = %channel.code,
                feed_type = %feed.feed_type,
                "nothing to export"
            );
            return Ok(ExportReport {
                feed_type: feed.feed_type,
                messages: 0,
                submission: None,
            });
        }

        let submission = self
            .api
            .submit_feed(
                feed.document.as_bytes(),
                feed.feed_type,
                &[channel.marketplace_id.as_str()],
            )
            .await
            .map_err(|err| match err {
                MwsError::Api { code, message } => EngineError::FeedRejected {
                    feed_type: feed.feed_type.to_string(),
                    code,
                    message,
                },
                other => EngineError::Mws(other),
            })?;

        tracing::info!(
            channel = %channel.code,
            feed_type = %feed.feed_type,
            messages = feed.message_count(),
            submission_id = %submission.feed_submission_id,
            status = %submission.feed_processing_status,
            "feed submitted"
        );
        Ok(ExportReport {
            feed_type: feed.feed_type,
            messages: feed.message_count(),
            submission: Some(submission),
        })
    }

    /// Reports the MWS service status.
    ///
    /// # Errors
    ///
    /// Propagates API failures.
    pub async fn check_service_status(&self) -> Result<ServiceCheck, EngineError> {
        let status = self.api.get_service_status().await?;
        Ok(ServiceCheck {
            message: status.describe(),
            status: status.status,
        })
    }

    /// Verifies the channel's credentials with a harmless feed call. Never
    /// fails; an API error is reported in the result.
    pub async fn check_settings(&self) -> SettingsCheck {
        match self.api.get_feed_submission_count().await {
            Ok(_) => SettingsCheck {
                ok: true,
                message: SETTINGS_OK_MESSAGE.to_string(),
                detail: None,
            },
            Err(err) => {
                tracing::warn!(channel = %self.channel.code, error = %err, "settings check failed");
                SettingsCheck {
                    ok: false,
                    message: SETTINGS_FAILED_MESSAGE.to_string(),
                    detail: Some(err.to_string()),
                }
            }
        }
    }
}
