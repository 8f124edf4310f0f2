//! Assembly of `AmazonEnvelope` feed documents.
//!
//! ```xml
//! <AmazonEnvelope xmlns:xsi="..." xsi:noNamespaceSchemaLocation="amznenvelope.xsd">
//!   <Header><DocumentVersion>1.01</DocumentVersion><MerchantIdentifier>..</MerchantIdentifier></Header>
//!   <MessageType>Product|Price|Inventory</MessageType>
//!   <PurgeAndReplace>false</PurgeAndReplace>
//!   <Message><MessageID>{product id}</MessageID><OperationType>Update</OperationType>...</Message>
//! </AmazonEnvelope>
//! ```

use mwsync_core::{Channel, Product, ProductCode};
use mwsync_mws::FeedType;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::EngineError;

pub const DOCUMENT_VERSION: &str = "1.01";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str = "amznenvelope.xsd";
const OPERATION_UPDATE: &str = "Update";
const MISC_PRODUCT_TYPE: &str = "Misc_Other";

/// A rendered feed ready for submission.
#[derive(Debug, Clone)]
pub struct FeedEnvelope {
    pub feed_type: FeedType,
    /// Ids of the products that became messages, in document order.
    pub product_ids: Vec<i64>,
    pub document: String,
}

impl FeedEnvelope {
    #[must_use]
    pub fn message_count(&self) -> usize {
        self.product_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }
}

struct FeedWriter {
    writer: Writer<Vec<u8>>,
}

fn encoding_error(err: impl std::fmt::Display) -> EngineError {
    EngineError::FeedEncoding(err.to_string())
}

impl FeedWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), EngineError> {
        self.writer.write_event(event).map_err(encoding_error)
    }

    fn open(&mut self, name: &str) -> Result<(), EngineError> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn close(&mut self, name: &str) -> Result<(), EngineError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), EngineError> {
        self.open(name)?;
        self.event(Event::Text(BytesText::new(text)))?;
        self.close(name)
    }

    fn begin_envelope(&mut self, merchant_id: &str, feed_type: FeedType) -> Result<(), EngineError> {
        self.event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut root = BytesStart::new("AmazonEnvelope");
        root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
        root.push_attribute(("xsi:noNamespaceSchemaLocation", SCHEMA_LOCATION));
        self.event(Event::Start(root))?;

        self.open("Header")?;
        self.text_element("DocumentVersion", DOCUMENT_VERSION)?;
        self.text_element("MerchantIdentifier", merchant_id)?;
        self.close("Header")?;
        self.text_element("MessageType", feed_type.message_type())?;
        self.text_element("PurgeAndReplace", "false")
    }

    fn begin_message(&mut self, product: &Product) -> Result<(), EngineError> {
        self.open("Message")?;
        self.text_element("MessageID", &product.id.to_string())?;
        self.text_element("OperationType", OPERATION_UPDATE)
    }

    fn finish(mut self) -> Result<String, EngineError> {
        self.close("AmazonEnvelope")?;
        String::from_utf8(self.writer.into_inner()).map_err(encoding_error)
    }
}

fn missing_sku(product: &Product) -> EngineError {
    EngineError::MissingProductMetadata {
        product: product.name.clone(),
        missing: "Product Code".to_string(),
    }
}

/// The SKU and standard identifier a catalog message is keyed by.
fn listing_keys(product: &Product) -> Result<(&str, &ProductCode), EngineError> {
    let sku = product.sku().ok_or_else(|| missing_sku(product))?;
    let identifier =
        product
            .standard_identifier()
            .ok_or_else(|| EngineError::MissingProductMetadata {
                product: product.name.clone(),
                missing: "Amazon Product Identifiers".to_string(),
            })?;
    Ok((sku, identifier))
}

/// Checks that a product can be listed: it has a SKU and a standard
/// identifier.
///
/// # Errors
///
/// Returns [`EngineError::MissingProductMetadata`] naming what is missing.
pub fn check_listable(product: &Product) -> Result<(), EngineError> {
    listing_keys(product).map(|_| ())
}

/// Builds a `_POST_PRODUCT_DATA_` feed with one message per product.
///
/// # Errors
///
/// Returns [`EngineError::MissingProductMetadata`] if any product lacks a SKU
/// or a standard identifier; no document is produced in that case.
pub fn build_catalog_feed(
    channel: &Channel,
    products: &[Product],
) -> Result<FeedEnvelope, EngineError> {
    let mut feed = FeedWriter::new();
    feed.begin_envelope(&channel.merchant_id, FeedType::Product)?;

    let mut product_ids = Vec::with_capacity(products.len());
    for product in products {
        let (sku, identifier) = listing_keys(product)?;

        feed.begin_message(product)?;
        feed.open("Product")?;
        feed.text_element("SKU", sku)?;
        feed.open("StandardProductID")?;
        feed.text_element("Type", identifier.code_type.feed_label())?;
        feed.text_element("Value", &identifier.code)?;
        feed.close("StandardProductID")?;
        feed.open("DescriptionData")?;
        feed.text_element("Title", &product.name)?;
        feed.text_element("Description", product.description.as_deref().unwrap_or(""))?;
        feed.close("DescriptionData")?;
        feed.open("ProductData")?;
        feed.open("Miscellaneous")?;
        feed.text_element("ProductType", MISC_PRODUCT_TYPE)?;
        feed.close("Miscellaneous")?;
        feed.close("ProductData")?;
        feed.close("Product")?;
        feed.close("Message")?;

        product_ids.push(product.id);
    }

    Ok(FeedEnvelope {
        feed_type: FeedType::Product,
        product_ids,
        document: feed.finish()?,
    })
}

/// Builds a `_POST_PRODUCT_PRICING_DATA_` feed from the products' list
/// prices. Products not linked to the channel are left out.
///
/// # Errors
///
/// Returns [`EngineError::MissingProductMetadata`] if a linked product has no
/// SKU.
pub fn build_pricing_feed(
    channel: &Channel,
    products: &[Product],
) -> Result<FeedEnvelope, EngineError> {
    let mut feed = FeedWriter::new();
    feed.begin_envelope(&channel.merchant_id, FeedType::Pricing)?;

    let mut product_ids = Vec::new();
    for product in products.iter().filter(|p| p.is_linked_to(channel.id)) {
        let sku = product.sku().ok_or_else(|| missing_sku(product))?;

        feed.begin_message(product)?;
        feed.open("Price")?;
        feed.text_element("SKU", sku)?;
        let mut price = BytesStart::new("StandardPrice");
        price.push_attribute(("currency", channel.currency_code.as_str()));
        feed.event(Event::Start(price))?;
        feed.event(Event::Text(BytesText::new(&product.list_price.to_string())))?;
        feed.close("StandardPrice")?;
        feed.close("Price")?;
        feed.close("Message")?;

        product_ids.push(product.id);
    }

    Ok(FeedEnvelope {
        feed_type: FeedType::Pricing,
        product_ids,
        document: feed.finish()?,
    })
}

/// Rounds a stock quantity to the whole number reported to Amazon.
#[must_use]
pub fn feed_quantity(quantity: Decimal) -> Decimal {
    quantity
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// Builds a `_POST_INVENTORY_AVAILABILITY_DATA_` feed. Each product comes
/// with its quantity in the channel's warehouse; products with nothing in
/// stock and products not linked to the channel are left out.
///
/// # Errors
///
/// Returns [`EngineError::MissingProductMetadata`] if a reported product has
/// no SKU.
pub fn build_inventory_feed(
    channel: &Channel,
    stock: &[(Product, Decimal)],
) -> Result<FeedEnvelope, EngineError> {
    let mut feed = FeedWriter::new();
    feed.begin_envelope(&channel.merchant_id, FeedType::Inventory)?;

    let mut product_ids = Vec::new();
    for (product, quantity) in stock {
        let quantity = feed_quantity(*quantity);
        if quantity <= Decimal::ZERO || !product.is_linked_to(channel.id) {
            continue;
        }
        let sku = product.sku().ok_or_else(|| missing_sku(product))?;

        feed.begin_message(product)?;
        feed.open("Inventory")?;
        feed.text_element("SKU", sku)?;
        feed.text_element("Quantity", &quantity.to_string())?;
        feed.text_element("FulfillmentLatency", &product.delivery_time.to_string())?;
        feed.close("Inventory")?;
        feed.close("Message")?;

        product_ids.push(product.id);
    }

    Ok(FeedEnvelope {
        feed_type: FeedType::Inventory,
        product_ids,
        document: feed.finish()?,
    })
}

#[cfg(test)]
#[path = "feeds_test.rs"]
mod tests;
