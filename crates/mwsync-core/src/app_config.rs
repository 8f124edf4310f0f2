use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub channels_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Base URL of the MWS endpoint for the seller's region.
    pub mws_endpoint: String,
    pub mws_request_timeout_secs: u64,
    pub mws_user_agent: String,
    /// Six-field cron expression for scheduled order imports.
    pub import_cron: String,
    /// Six-field cron expression for scheduled pricing/inventory exports.
    pub export_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("channels_path", &self.channels_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("mws_endpoint", &self.mws_endpoint)
            .field("mws_request_timeout_secs", &self.mws_request_timeout_secs)
            .field("mws_user_agent", &self.mws_user_agent)
            .field("import_cron", &self.import_cron)
            .field("export_cron", &self.export_cron)
            .finish()
    }
}
