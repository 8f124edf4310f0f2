pub mod app_config;
pub mod channel;
pub mod channels;
pub mod config;
pub mod orders;
pub mod parties;
pub mod products;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use channel::{Channel, AMAZON_MWS_SOURCE};
pub use config::{load_app_config, load_app_config_from_env};
pub use orders::{NewOrder, NewOrderLine, Order, OrderLine, OrderState};
pub use parties::{
    Address, AddressFields, ContactKind, ContactMechanism, Country, Currency, Party, Subdivision,
};
pub use products::{CodeType, NewProduct, Product, ProductCode};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read channels file {path}: {source}")]
    ChannelsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse channels file: {0}")]
    ChannelsFileParse(#[from] serde_yaml::Error),

    #[error("invalid channel configuration: {0}")]
    Validation(String),
}
