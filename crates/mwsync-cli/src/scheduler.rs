//! Background job scheduler for unattended runs.
//!
//! Registers one import job and one export job on the configured cron
//! schedules. Every job walks all active `amazon_mws` channels in silent
//! mode; a failing channel is logged and the others still run.

use std::sync::Arc;

use mwsync_core::{AppConfig, Channel};
use mwsync_db::TriggerSource;
use mwsync_engine::RunOutcome;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::sync::{execute, JobResult, SyncJob};

static IMPORT_JOBS: [SyncJob; 1] = [SyncJob::Import];

/// Jobs the export schedule runs for each channel, in order.
static EXPORT_JOBS: [SyncJob; 2] = [SyncJob::ExportPricing, SyncJob::ExportInventory];

/// Starts the scheduler and blocks until ctrl-c.
///
/// # Errors
///
/// Returns an error if the scheduler cannot be built or stopped, or the
/// signal handler cannot be installed.
pub(crate) async fn run_schedule(pool: PgPool, config: AppConfig) -> anyhow::Result<()> {
    let mut scheduler = build_scheduler(pool, Arc::new(config)).await?;
    tracing::info!("scheduler: running; press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("scheduler: received shutdown signal");
    scheduler.shutdown().await?;
    Ok(())
}

/// Builds and starts the job scheduler. The returned handle must be kept
/// alive; dropping it stops all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if a cron expression is invalid or the
/// scheduler fails to start.
pub(crate) async fn build_scheduler(
    pool: PgPool,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_job(&scheduler, pool.clone(), Arc::clone(&config), Schedule::Import).await?;
    register_job(&scheduler, pool, config, Schedule::Export).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

#[derive(Debug, Clone, Copy)]
enum Schedule {
    Import,
    Export,
}

impl Schedule {
    fn cron(self, config: &AppConfig) -> &str {
        match self {
            Schedule::Import => &config.import_cron,
            Schedule::Export => &config.export_cron,
        }
    }

    fn jobs(self) -> &'static [SyncJob] {
        match self {
            Schedule::Import => &IMPORT_JOBS,
            Schedule::Export => &EXPORT_JOBS,
        }
    }
}

async fn register_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<AppConfig>,
    schedule: Schedule,
) -> Result<(), JobSchedulerError> {
    let cron = schedule.cron(&config).to_string();
    let pool = Arc::new(pool);

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!(?schedule, "scheduler: starting run");
            run_for_all_channels(&pool, &config, schedule.jobs()).await;
            tracing::info!(?schedule, "scheduler: run complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(?schedule, cron = %cron, "scheduler: job registered");
    Ok(())
}

async fn run_for_all_channels(pool: &PgPool, config: &AppConfig, jobs: &[SyncJob]) {
    let channels = match mwsync_db::list_channels(pool, true).await {
        Ok(rows) => rows.into_iter().map(Channel::from).collect::<Vec<_>>(),
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to load channels");
            return;
        }
    };

    for channel in channels.iter().filter(|c| c.is_amazon_mws()) {
        for job in jobs {
            run_and_log(pool, config, channel, job).await;
        }
    }
}

async fn run_and_log(pool: &PgPool, config: &AppConfig, channel: &Channel, job: &SyncJob) {
    let run_type = job.run_type();
    match execute(pool, config, channel, job, true, TriggerSource::Scheduler).await {
        Ok(JobResult::Import(outcome)) => match outcome {
            RunOutcome::Completed(report) if !report.is_success() => {
                tracing::warn!(
                    channel = %channel.code,
                    created = report.created.len(),
                    failed = report.failed.len(),
                    "scheduler: import finished with failed orders"
                );
            }
            RunOutcome::Completed(report) => {
                tracing::info!(
                    channel = %channel.code,
                    created = report.created.len(),
                    existing = report.existing.len(),
                    "scheduler: import finished"
                );
            }
            RunOutcome::Skipped { reason } => {
                tracing::info!(channel = %channel.code, %reason, "scheduler: import skipped");
            }
        },
        Ok(JobResult::Export(outcome)) => match outcome {
            RunOutcome::Completed(report) => {
                tracing::info!(
                    channel = %channel.code,
                    feed_type = %report.feed_type,
                    messages = report.messages,
                    submission = ?report.submission.map(|s| s.feed_submission_id),
                    "scheduler: export finished"
                );
            }
            RunOutcome::Skipped { reason } => {
                tracing::info!(
                    channel = %channel.code,
                    %run_type,
                    %reason,
                    "scheduler: export skipped"
                );
            }
        },
        Err(e) => {
            tracing::error!(
                channel = %channel.code,
                %run_type,
                error = %e,
                "scheduler: run failed"
            );
        }
    }
}
