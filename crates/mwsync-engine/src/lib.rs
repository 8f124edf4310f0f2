//! Order import and feed export against Amazon MWS, independent of where
//! records are persisted.

pub mod driver;
pub mod error;
pub mod feeds;
pub mod importer;
pub mod memory;
pub mod resolver;
pub mod store;

pub use driver::{
    CatalogSelection, ExportReport, ImportReport, OrderFailure, RunOutcome, ServiceCheck,
    SettingsCheck, SyncDriver,
};
pub use error::{EngineError, StoreError};
pub use feeds::{build_catalog_feed, build_inventory_feed, build_pricing_feed, FeedEnvelope};
pub use importer::{import_order, ImportedOrder, SHIPPING_LINE_LABEL};
pub use memory::MemoryStore;
pub use resolver::{EntityResolver, Location};
pub use store::Store;
