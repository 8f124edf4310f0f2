use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of a standard (non-seller) product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeType {
    Asin,
    Ean,
    Upc,
    Isbn,
    Gtin,
}

impl CodeType {
    /// Order in which identifiers are preferred when a product carries several.
    pub const PRECEDENCE: [CodeType; 5] = [
        CodeType::Asin,
        CodeType::Ean,
        CodeType::Upc,
        CodeType::Isbn,
        CodeType::Gtin,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CodeType::Asin => "asin",
            CodeType::Ean => "ean",
            CodeType::Upc => "upc",
            CodeType::Isbn => "isbn",
            CodeType::Gtin => "gtin",
        }
    }

    /// Label used in `StandardProductID/Type` of a catalog feed.
    #[must_use]
    pub fn feed_label(self) -> &'static str {
        match self {
            CodeType::Asin => "ASIN",
            CodeType::Ean => "EAN",
            CodeType::Upc => "UPC",
            CodeType::Isbn => "ISBN",
            CodeType::Gtin => "GTIN",
        }
    }
}

impl std::fmt::Display for CodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asin" => Ok(CodeType::Asin),
            "ean" => Ok(CodeType::Ean),
            "upc" => Ok(CodeType::Upc),
            "isbn" => Ok(CodeType::Isbn),
            "gtin" => Ok(CodeType::Gtin),
            other => Err(format!("unknown product code type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCode {
    pub code_type: CodeType,
    pub code: String,
}

/// A sellable product variant together with the template-level fields the
/// feeds need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub template_id: i64,
    /// Template name; used as the catalog title.
    pub name: String,
    /// Seller SKU. A product without one cannot be listed.
    pub code: Option<String>,
    pub description: Option<String>,
    pub list_price: Decimal,
    pub cost_price: Decimal,
    pub default_uom: String,
    pub export_to_amazon: bool,
    /// Days between order and dispatch, reported as `FulfillmentLatency`.
    pub delivery_time: i32,
    /// At most one code per [`CodeType`].
    pub codes: Vec<ProductCode>,
    /// Channels this product has been exported to.
    pub channel_ids: Vec<i64>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the code of the given kind, if present.
    #[must_use]
    pub fn code_of(&self, code_type: CodeType) -> Option<&ProductCode> {
        self.codes.iter().find(|c| c.code_type == code_type)
    }

    /// Returns the identifier to publish as `StandardProductID`: the first
    /// present in ASIN, EAN, UPC, ISBN, GTIN order.
    #[must_use]
    pub fn standard_identifier(&self) -> Option<&ProductCode> {
        CodeType::PRECEDENCE
            .iter()
            .find_map(|code_type| self.code_of(*code_type))
    }

    /// Returns the SKU when it is set and non-blank.
    #[must_use]
    pub fn sku(&self) -> Option<&str> {
        self.code.as_deref().filter(|c| !c.trim().is_empty())
    }

    #[must_use]
    pub fn is_linked_to(&self, channel_id: i64) -> bool {
        self.channel_ids.contains(&channel_id)
    }
}

/// Values for a product (and its template) created from marketplace data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub list_price: Decimal,
    pub cost_price: Decimal,
    pub default_uom: String,
    pub sale_uom: String,
    pub salable: bool,
    pub account_revenue: Option<String>,
    pub account_expense: Option<String>,
    pub codes: Vec<ProductCode>,
    /// Channel the product is linked to on creation.
    pub channel_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_product(codes: Vec<ProductCode>) -> Product {
        Product {
            id: 7,
            template_id: 3,
            name: "Blue Mug".to_string(),
            code: Some("MUG-BLUE".to_string()),
            description: Some("A blue mug".to_string()),
            list_price: Decimal::new(1299, 2),
            cost_price: Decimal::new(500, 2),
            default_uom: "Unit".to_string(),
            export_to_amazon: true,
            delivery_time: 2,
            codes,
            channel_ids: vec![1],
            updated_at: Utc::now(),
        }
    }

    fn code(code_type: CodeType, code: &str) -> ProductCode {
        ProductCode {
            code_type,
            code: code.to_string(),
        }
    }

    #[test]
    fn standard_identifier_prefers_asin() {
        let product = make_product(vec![
            code(CodeType::Upc, "123456789012"),
            code(CodeType::Ean, "1234567890123"),
            code(CodeType::Asin, "BUYGBS6866"),
        ]);
        let id = product.standard_identifier().expect("identifier");
        assert_eq!(id.code_type, CodeType::Asin);
        assert_eq!(id.code, "BUYGBS6866");
    }

    #[test]
    fn standard_identifier_falls_through_precedence() {
        let product = make_product(vec![
            code(CodeType::Gtin, "00012345678905"),
            code(CodeType::Upc, "123456789012"),
        ]);
        assert_eq!(
            product.standard_identifier().map(|c| c.code_type),
            Some(CodeType::Upc)
        );
    }

    #[test]
    fn standard_identifier_none_without_codes() {
        assert!(make_product(vec![]).standard_identifier().is_none());
    }

    #[test]
    fn code_of_finds_each_kind() {
        let product = make_product(vec![
            code(CodeType::Asin, "BUYGBS6866"),
            code(CodeType::Upc, "123456789012"),
            code(CodeType::Ean, "1234567890123"),
        ]);
        assert_eq!(product.code_of(CodeType::Ean).unwrap().code, "1234567890123");
        assert_eq!(product.code_of(CodeType::Upc).unwrap().code, "123456789012");
        assert!(product.code_of(CodeType::Isbn).is_none());
    }

    #[test]
    fn blank_sku_is_treated_as_missing() {
        let mut product = make_product(vec![]);
        product.code = Some("   ".to_string());
        assert!(product.sku().is_none());
        product.code = None;
        assert!(product.sku().is_none());
    }

    #[test]
    fn code_type_parses_case_insensitively() {
        assert_eq!("ASIN".parse::<CodeType>(), Ok(CodeType::Asin));
        assert_eq!("gtin".parse::<CodeType>(), Ok(CodeType::Gtin));
        assert!("sku".parse::<CodeType>().is_err());
        assert_eq!(CodeType::Isbn.feed_label(), "ISBN");
    }
}
