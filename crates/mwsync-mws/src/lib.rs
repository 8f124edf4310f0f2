pub mod api;
pub mod client;
pub mod error;
pub mod types;
pub mod xml;

pub use api::{FeedType, MwsApi, OrderStatus};
pub use client::{MwsClient, MwsCredentials, DEFAULT_ENDPOINT};
pub use error::MwsError;
pub use types::{
    FeedSubmissionCount, FeedSubmissionInfo, MatchedProduct, Money, Order, OrderItem,
    OrderSummary, ProductMatch, ServiceStatus, ShippingAddress,
};
