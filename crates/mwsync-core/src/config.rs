use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

const DEFAULT_MWS_ENDPOINT: &str = "https://mws.amazonservices.com";
const DEFAULT_IMPORT_CRON: &str = "0 */30 * * * *";
const DEFAULT_EXPORT_CRON: &str = "0 15 * * * *";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("MWSYNC_ENV", "development"))?;

    let log_level = or_default("MWSYNC_LOG_LEVEL", "info");
    let channels_path = PathBuf::from(or_default(
        "MWSYNC_CHANNELS_PATH",
        "./config/channels.yaml",
    ));

    let db_max_connections = parse_u32("MWSYNC_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("MWSYNC_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("MWSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let mws_endpoint = or_default("MWSYNC_MWS_ENDPOINT", DEFAULT_MWS_ENDPOINT);
    if !(mws_endpoint.starts_with("http://") || mws_endpoint.starts_with("https://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "MWSYNC_MWS_ENDPOINT".to_string(),
            reason: format!("'{mws_endpoint}' is not an http(s) URL"),
        });
    }
    let mws_request_timeout_secs = parse_u64("MWSYNC_MWS_REQUEST_TIMEOUT_SECS", "30")?;
    let mws_user_agent = or_default("MWSYNC_MWS_USER_AGENT", "mwsync/0.1 (Language=Rust)");

    let import_cron = or_default("MWSYNC_IMPORT_CRON", DEFAULT_IMPORT_CRON);
    let export_cron = or_default("MWSYNC_EXPORT_CRON", DEFAULT_EXPORT_CRON);

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        channels_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        mws_endpoint,
        mws_request_timeout_secs,
        mws_user_agent,
        import_cron,
        export_cron,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MWSYNC_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
