//! Sync command handlers and the run wrapper shared with the scheduler.
//!
//! Every run takes the channel's advisory lock, is logged in `sync_runs`,
//! and drives one [`SyncDriver`] operation against the Postgres store and a
//! live MWS client.

use clap::Subcommand;
use mwsync_core::{AppConfig, Channel};
use mwsync_db::{ChannelLock, PgStore, SyncRunType, TriggerSource};
use mwsync_engine::{CatalogSelection, ExportReport, ImportReport, RunOutcome, SyncDriver};
use mwsync_mws::{MwsClient, MwsCredentials};

/// Sub-commands available under `sync`.
#[derive(Debug, Subcommand)]
pub enum SyncCommands {
    /// Import new orders placed since the channel's last import
    Import {
        /// Channel code
        channel: String,
        /// Treat "no orders" as success instead of an error
        #[arg(long)]
        silent: bool,
    },
    /// Submit the product catalog feed
    ExportCatalog {
        /// Channel code
        channel: String,
        /// Export only these SKUs (repeatable)
        #[arg(long = "sku")]
        skus: Vec<String>,
        /// Export only products changed since the last catalog export
        #[arg(long)]
        changed_only: bool,
        /// Skip products with missing identifiers instead of failing
        #[arg(long)]
        silent: bool,
    },
    /// Submit list prices of products linked to the channel
    ExportPricing {
        /// Channel code
        channel: String,
        #[arg(long)]
        silent: bool,
    },
    /// Submit stock levels of products linked to the channel
    ExportInventory {
        /// Channel code
        channel: String,
        #[arg(long)]
        silent: bool,
    },
}

/// One Sync Driver operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SyncJob {
    Import,
    ExportCatalog(CatalogSelection),
    ExportPricing,
    ExportInventory,
}

impl SyncJob {
    pub(crate) fn run_type(&self) -> SyncRunType {
        match self {
            SyncJob::Import => SyncRunType::ImportOrders,
            SyncJob::ExportCatalog(_) => SyncRunType::ExportCatalog,
            SyncJob::ExportPricing => SyncRunType::ExportPricing,
            SyncJob::ExportInventory => SyncRunType::ExportInventory,
        }
    }
}

/// What a finished run produced.
pub(crate) enum JobResult {
    Import(RunOutcome<ImportReport>),
    Export(RunOutcome<ExportReport>),
}

impl SyncCommands {
    fn into_parts(self) -> (String, SyncJob, bool) {
        match self {
            SyncCommands::Import { channel, silent } => (channel, SyncJob::Import, silent),
            SyncCommands::ExportCatalog {
                channel,
                skus,
                changed_only,
                silent,
            } => (
                channel,
                SyncJob::ExportCatalog(CatalogSelection { skus, changed_only }),
                silent,
            ),
            SyncCommands::ExportPricing { channel, silent } => {
                (channel, SyncJob::ExportPricing, silent)
            }
            SyncCommands::ExportInventory { channel, silent } => {
                (channel, SyncJob::ExportInventory, silent)
            }
        }
    }
}

/// Runs one `sync` sub-command and prints its report.
///
/// # Errors
///
/// Returns an error if the channel is unknown or busy, or the run fails.
pub(crate) async fn run_sync(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    command: SyncCommands,
) -> anyhow::Result<()> {
    let (code, job, silent) = command.into_parts();
    let channel = load_channel(pool, &code).await?;

    let result = execute(pool, config, &channel, &job, silent, TriggerSource::Cli).await?;
    print_result(&channel, &result);
    Ok(())
}

/// Loads a channel by code.
pub(crate) async fn load_channel(pool: &sqlx::PgPool, code: &str) -> anyhow::Result<Channel> {
    mwsync_db::get_channel_by_code(pool, code)
        .await?
        .map(Channel::from)
        .ok_or_else(|| anyhow::anyhow!("channel '{code}' not found"))
}

/// Builds the MWS client for a channel's seller account.
pub(crate) fn build_client(config: &AppConfig, channel: &Channel) -> anyhow::Result<MwsClient> {
    let credentials = MwsCredentials {
        merchant_id: channel.merchant_id.clone(),
        access_key: channel.access_key.clone(),
    };
    MwsClient::with_base_url(
        credentials,
        config.mws_request_timeout_secs,
        &config.mws_endpoint,
        &config.mws_user_agent,
    )
    .map_err(|e| anyhow::anyhow!("failed to build MWS client for '{}': {e}", channel.code))
}

/// Runs `job` for `channel` under the channel lock and records the outcome
/// in `sync_runs`.
///
/// # Errors
///
/// Returns an error if another run holds the channel, the run log cannot be
/// written, or the driver operation fails.
pub(crate) async fn execute(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    channel: &Channel,
    job: &SyncJob,
    silent: bool,
    trigger: TriggerSource,
) -> anyhow::Result<JobResult> {
    let Some(lock) = ChannelLock::try_acquire(pool, channel.id).await? else {
        anyhow::bail!("channel '{}' is already being synced", channel.code);
    };

    let outcome = record_run(pool, config, channel, job, silent, trigger).await;

    if let Err(e) = lock.release().await {
        tracing::warn!(channel = %channel.code, error = %e, "failed to release channel lock");
    }
    outcome
}

async fn record_run(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    channel: &Channel,
    job: &SyncJob,
    silent: bool,
    trigger: TriggerSource,
) -> anyhow::Result<JobResult> {
    let run_type = job.run_type();
    let run = mwsync_db::create_sync_run(pool, channel.id, run_type, trigger).await?;
    mwsync_db::start_sync_run(pool, run.id).await?;
    tracing::info!(channel = %channel.code, run_id = run.id, %run_type, silent, "sync run started");

    let result = perform(pool, config, channel, job, silent).await;

    let marked = match &result {
        Ok(JobResult::Import(RunOutcome::Completed(report))) if !report.is_success() => {
            let failed: Vec<String> = report
                .failed
                .iter()
                .map(|f| format!("{}: {}", f.amazon_order_id, f.error))
                .collect();
            mwsync_db::fail_sync_run(pool, run.id, &failed.join("; ")).await
        }
        Ok(JobResult::Import(RunOutcome::Completed(report))) => {
            mwsync_db::complete_sync_run(pool, run.id, count(report.created.len()), None).await
        }
        Ok(JobResult::Export(RunOutcome::Completed(report))) => {
            let submission_id = report
                .submission
                .as_ref()
                .map(|s| s.feed_submission_id.as_str());
            mwsync_db::complete_sync_run(pool, run.id, count(report.messages), submission_id).await
        }
        Ok(JobResult::Import(RunOutcome::Skipped { reason })
        | JobResult::Export(RunOutcome::Skipped { reason })) => {
            mwsync_db::skip_sync_run(pool, run.id, reason).await
        }
        Err(e) => mwsync_db::fail_sync_run(pool, run.id, &format!("{e:#}")).await,
    };

    if let Err(e) = marked {
        tracing::error!(run_id = run.id, error = %e, "failed to record {run_type} run outcome");
    }
    result
}

async fn perform(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    channel: &Channel,
    job: &SyncJob,
    silent: bool,
) -> anyhow::Result<JobResult> {
    let store = PgStore::new(pool.clone());
    let client = build_client(config, channel)?;
    let driver = SyncDriver::new(&store, &client, channel)?;

    let result = match job {
        SyncJob::Import => JobResult::Import(driver.run_import(silent).await?),
        SyncJob::ExportCatalog(selection) => {
            JobResult::Export(driver.run_export_catalog(selection, silent).await?)
        }
        SyncJob::ExportPricing => JobResult::Export(driver.run_export_pricing(silent).await?),
        SyncJob::ExportInventory => JobResult::Export(driver.run_export_inventory(silent).await?),
    };
    Ok(result)
}

fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

pub(crate) fn print_result(channel: &Channel, result: &JobResult) {
    match result {
        JobResult::Import(RunOutcome::Completed(report)) => {
            println!(
                "{}: {} order(s) listed since {}, {} created, {} already imported, {} failed",
                channel.code,
                report.listed,
                report.since.to_rfc3339(),
                report.created.len(),
                report.existing.len(),
                report.failed.len()
            );
            for failure in &report.failed {
                println!("  {}: {}", failure.amazon_order_id, failure.error);
            }
            if let Some(to) = report.advanced_to {
                println!("  next import starts at {}", to.to_rfc3339());
            }
        }
        JobResult::Export(RunOutcome::Completed(report)) => match &report.submission {
            Some(submission) => println!(
                "{}: {} feed with {} message(s) submitted as {} ({})",
                channel.code,
                report.feed_type,
                report.messages,
                submission.feed_submission_id,
                submission.feed_processing_status
            ),
            None => println!(
                "{}: nothing to send for {} feed",
                channel.code, report.feed_type
            ),
        },
        JobResult::Import(RunOutcome::Skipped { reason })
        | JobResult::Export(RunOutcome::Skipped { reason }) => {
            println!("{}: skipped: {reason}", channel.code);
        }
    }
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
