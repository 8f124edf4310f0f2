mod check;
mod scheduler;
mod sync;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::check::CheckCommands;
use crate::sync::SyncCommands;

#[derive(Debug, Parser)]
#[command(name = "mwsync-cli")]
#[command(about = "Amazon MWS order import and feed export")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Inspect configured channels
    Channel {
        #[command(subcommand)]
        command: ChannelCommands,
    },
    /// Import orders or export feeds for one channel
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
    /// Check MWS availability and channel credentials
    Check {
        #[command(subcommand)]
        command: CheckCommands,
    },
    /// Run scheduled imports and exports for every active channel until
    /// interrupted
    Schedule,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Verify the database is reachable
    Ping,
    /// Upsert channels from the channels file
    Seed,
}

#[derive(Debug, Subcommand)]
enum ChannelCommands {
    /// List channels and their watermarks
    List {
        /// Include inactive channels
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("mwsync-cli ready; run with --help for commands");
        return Ok(());
    };

    let config = mwsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = mwsync_db::PoolConfig::from_app_config(&config);
    let pool = mwsync_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => run_db(&pool, &config, command).await,
        Commands::Channel {
            command: ChannelCommands::List { all },
        } => run_channel_list(&pool, !all).await,
        Commands::Sync { command } => sync::run_sync(&pool, &config, command).await,
        Commands::Check { command } => check::run_check(&pool, &config, command).await,
        Commands::Schedule => scheduler::run_schedule(pool, config).await,
    }
}

async fn run_db(
    pool: &sqlx::PgPool,
    config: &mwsync_core::AppConfig,
    command: DbCommands,
) -> anyhow::Result<()> {
    match command {
        DbCommands::Migrate => {
            let applied = mwsync_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
        DbCommands::Ping => {
            mwsync_db::ping(pool).await?;
            println!("database is reachable");
        }
        DbCommands::Seed => {
            let file = mwsync_core::channels::load_channels(&config.channels_path)?;
            let seeded = mwsync_db::seed_channels(pool, &file.channels).await?;
            println!(
                "seeded {seeded} channel(s) from {}",
                config.channels_path.display()
            );
        }
    }
    Ok(())
}

async fn run_channel_list(pool: &sqlx::PgPool, active_only: bool) -> anyhow::Result<()> {
    let channels = mwsync_db::list_channels(pool, active_only).await?;
    if channels.is_empty() {
        println!("no channels; run `mwsync-cli db seed` first");
        return Ok(());
    }

    println!(
        "{:<16} {:<24} {:<12} {:<7} {:<25} {}",
        "CODE", "NAME", "SOURCE", "ACTIVE", "LAST ORDER IMPORT", "LAST PRODUCT EXPORT"
    );
    for channel in &channels {
        let exported = channel
            .last_product_export_time
            .map_or_else(|| "never".to_string(), |t| t.to_rfc3339());
        println!(
            "{:<16} {:<24} {:<12} {:<7} {:<25} {}",
            channel.code,
            channel.name,
            channel.source,
            channel.is_active,
            channel.last_order_import_time.to_rfc3339(),
            exported
        );
    }
    Ok(())
}
