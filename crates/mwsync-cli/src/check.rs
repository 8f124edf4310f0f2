//! Read-only checks against MWS. They do not take the channel lock and are
//! not logged as sync runs.

use clap::Subcommand;
use mwsync_core::AppConfig;
use mwsync_db::PgStore;
use mwsync_engine::SyncDriver;

use crate::sync::{build_client, load_channel};

/// Sub-commands available under `check`.
#[derive(Debug, Subcommand)]
pub enum CheckCommands {
    /// Report the Orders service status for the channel's endpoint
    Status {
        /// Channel code
        channel: String,
    },
    /// Verify the channel's seller credentials with a harmless call
    Settings {
        /// Channel code
        channel: String,
    },
}

/// Runs one `check` sub-command.
///
/// # Errors
///
/// Returns an error if the channel is unknown or not an MWS channel, if the
/// status call fails, or if the settings check reports a failure.
pub(crate) async fn run_check(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    command: CheckCommands,
) -> anyhow::Result<()> {
    let code = match &command {
        CheckCommands::Status { channel } | CheckCommands::Settings { channel } => channel,
    };
    let channel = load_channel(pool, code).await?;
    let store = PgStore::new(pool.clone());
    let client = build_client(config, &channel)?;
    let driver = SyncDriver::new(&store, &client, &channel)?;

    match command {
        CheckCommands::Status { .. } => {
            let check = driver.check_service_status().await?;
            println!("{}: {} - {}", channel.code, check.status, check.message);
        }
        CheckCommands::Settings { .. } => {
            let check = driver.check_settings().await;
            println!("{}: {}", channel.code, check.message);
            if let Some(detail) = &check.detail {
                println!("  {detail}");
            }
            if !check.ok {
                anyhow::bail!("settings check failed for channel '{}'", channel.code);
            }
        }
    }
    Ok(())
}
