//! HTTP client for Amazon Marketplace Web Service.
//!
//! Each call is an HTTP `POST` to the section's versioned path with the
//! operation and its parameters in the query string. Responses are XML;
//! an `ErrorResponse` document is surfaced as [`MwsError::Api`] whatever the
//! HTTP status, and the `<Action>Result` element of a successful response is
//! decoded into the typed payloads of [`crate::types`].

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::api::{FeedType, MwsApi, OrderStatus};
use crate::error::MwsError;
use crate::types::{
    one_or_many, ApiErrorDetail, FeedSubmissionCount, FeedSubmissionInfo, GetOrderResult, Order,
    OrderItem, OrderItemsPage, OrderListPage, OrderSummary, ProductMatch, ServiceStatus,
    SubmitFeedResult,
};
use crate::xml::parse_document;

pub const DEFAULT_ENDPOINT: &str = "https://mws.amazonservices.com";
const DEFAULT_USER_AGENT: &str = "mwsync/0.1 (Language=Rust)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Orders,
    Products,
    Feeds,
}

impl Section {
    fn path(self) -> &'static str {
        match self {
            Section::Orders => "Orders/2013-09-01",
            Section::Products => "Products/2011-10-01",
            Section::Feeds => "",
        }
    }

    fn version(self) -> &'static str {
        match self {
            Section::Orders => "2013-09-01",
            Section::Products => "2011-10-01",
            Section::Feeds => "2009-01-01",
        }
    }

    /// Name of the seller-identifier parameter; the Feeds section predates
    /// the `SellerId` convention.
    fn seller_param(self) -> &'static str {
        match self {
            Section::Feeds => "Merchant",
            Section::Orders | Section::Products => "SellerId",
        }
    }
}

/// Seller credentials sent with every request.
#[derive(Clone)]
pub struct MwsCredentials {
    pub merchant_id: String,
    pub access_key: String,
}

impl std::fmt::Debug for MwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MwsCredentials")
            .field("merchant_id", &self.merchant_id)
            .field("access_key", &"[redacted]")
            .finish()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorResponse {
    #[serde(default, deserialize_with = "one_or_many")]
    error: Vec<ApiErrorDetail>,
}

/// Client for one seller account on one MWS endpoint.
///
/// Use [`MwsClient::new`] for the production endpoint or
/// [`MwsClient::with_base_url`] to point at a regional endpoint or a mock
/// server.
pub struct MwsClient {
    client: Client,
    credentials: MwsCredentials,
    base_url: Url,
}

impl MwsClient {
    /// Creates a client pointed at the North America MWS endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`MwsError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(credentials: MwsCredentials, timeout_secs: u64) -> Result<Self, MwsError> {
        Self::with_base_url(credentials, timeout_secs, DEFAULT_ENDPOINT, DEFAULT_USER_AGENT)
    }

    /// Creates a client with a custom endpoint and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`MwsError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`MwsError::InvalidEndpoint`] if `base_url` is not
    /// a valid URL.
    pub fn with_base_url(
        credentials: MwsCredentials,
        timeout_secs: u64,
        base_url: &str,
        user_agent: &str,
    ) -> Result<Self, MwsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Section paths are joined onto the base, which therefore has to end
        // in exactly one slash.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url =
            Url::parse(&normalised).map_err(|_| MwsError::InvalidEndpoint(base_url.to_string()))?;

        Ok(Self {
            client,
            credentials,
            base_url,
        })
    }

    fn build_url(
        &self,
        section: Section,
        action: &str,
        extra: &[(String, String)],
    ) -> Result<Url, MwsError> {
        let mut url = self
            .base_url
            .join(section.path())
            .map_err(|_| MwsError::InvalidEndpoint(self.base_url.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("Action", action);
            pairs.append_pair(section.seller_param(), &self.credentials.merchant_id);
            pairs.append_pair("AWSAccessKeyId", &self.credentials.access_key);
            pairs.append_pair("Version", section.version());
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Sends one request and returns the content of its `<Action>Result`
    /// element.
    async fn call(
        &self,
        section: Section,
        action: &str,
        params: &[(String, String)],
        body: Option<&[u8]>,
    ) -> Result<Value, MwsError> {
        let url = self.build_url(section, action, params)?;
        tracing::debug!(action, "calling MWS");

        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "text/xml; charset=UTF-8")
                .body(body.to_vec());
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let (root, mut document) = match parse_document(&text) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(MwsError::UnexpectedStatus {
                    status: status.as_u16(),
                    body: text,
                });
            }
            Err(e) => return Err(e),
        };

        if root == "ErrorResponse" {
            return Err(Self::api_error(document));
        }
        if !status.is_success() {
            return Err(MwsError::UnexpectedStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        let result_key = format!("{action}Result");
        document
            .get_mut(&result_key)
            .map(Value::take)
            .ok_or_else(|| MwsError::payload(action, format!("missing {result_key}")))
    }

    fn api_error(document: Value) -> MwsError {
        let detail = serde_json::from_value::<ErrorResponse>(document)
            .ok()
            .and_then(|r| r.error.into_iter().next());

        match detail {
            Some(detail) => MwsError::Api {
                code: detail.code,
                message: detail.message.unwrap_or_default(),
            },
            None => MwsError::Api {
                code: "Unknown".to_string(),
                message: "unparseable ErrorResponse".to_string(),
            },
        }
    }

    fn decode<T: DeserializeOwned>(context: &str, value: Value) -> Result<T, MwsError> {
        serde_json::from_value(value).map_err(|e| MwsError::payload(context, e))
    }

    async fn order_list_page(
        &self,
        action: &str,
        params: &[(String, String)],
    ) -> Result<OrderListPage, MwsError> {
        let value = self.call(Section::Orders, action, params, None).await?;
        Self::decode(action, value)
    }

    async fn order_items_page(
        &self,
        action: &str,
        params: &[(String, String)],
    ) -> Result<OrderItemsPage, MwsError> {
        let value = self.call(Section::Orders, action, params, None).await?;
        Self::decode(action, value)
    }
}

fn pair(key: impl Into<String>, value: impl Into<String>) -> (String, String) {
    (key.into(), value.into())
}

/// MWS list parameters are flattened as `<prefix>.1`, `<prefix>.2`, ...
fn list_params(prefix: &str, values: &[&str]) -> Vec<(String, String)> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| pair(format!("{prefix}.{}", i + 1), *v))
        .collect()
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl MwsApi for MwsClient {
    async fn list_orders(
        &self,
        marketplace_id: &str,
        created_after: DateTime<Utc>,
        statuses: &[OrderStatus],
    ) -> Result<Vec<OrderSummary>, MwsError> {
        let mut params = vec![
            pair("MarketplaceId.Id.1", marketplace_id),
            pair("CreatedAfter", format_timestamp(created_after)),
        ];
        let statuses: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        params.extend(list_params("OrderStatus.Status", &statuses));

        let mut page = self.order_list_page("ListOrders", &params).await?;
        let mut orders = Vec::new();
        loop {
            orders.extend(page.orders.take().unwrap_or_default().order);
            let Some(token) = page.next_token.take() else {
                break;
            };
            tracing::debug!(fetched = orders.len(), "following ListOrders NextToken");
            page = self
                .order_list_page("ListOrdersByNextToken", &[pair("NextToken", token)])
                .await?;
        }
        Ok(orders)
    }

    async fn get_order(&self, amazon_order_id: &str) -> Result<Order, MwsError> {
        let params = [pair("AmazonOrderId.Id.1", amazon_order_id)];
        let value = self.call(Section::Orders, "GetOrder", &params, None).await?;
        let context = format!("GetOrder(AmazonOrderId={amazon_order_id})");
        let result: GetOrderResult = Self::decode(&context, value)?;

        result
            .orders
            .and_then(|o| o.order.into_iter().next())
            .ok_or_else(|| MwsError::payload(context, "no Order element"))
    }

    async fn list_order_items(&self, amazon_order_id: &str) -> Result<Vec<OrderItem>, MwsError> {
        let mut page = self
            .order_items_page(
                "ListOrderItems",
                &[pair("AmazonOrderId", amazon_order_id)],
            )
            .await?;
        let mut items = Vec::new();
        loop {
            if let Some(page_items) = page.order_items.take() {
                items.extend(page_items.order_item);
            }
            let Some(token) = page.next_token.take() else {
                break;
            };
            page = self
                .order_items_page("ListOrderItemsByNextToken", &[pair("NextToken", token)])
                .await?;
        }
        Ok(items)
    }

    async fn get_matching_product_for_id(
        &self,
        marketplace_id: &str,
        id_type: &str,
        ids: &[&str],
    ) -> Result<Vec<ProductMatch>, MwsError> {
        let mut params = vec![pair("MarketplaceId", marketplace_id), pair("IdType", id_type)];
        params.extend(list_params("IdList.Id", ids));

        let action = "GetMatchingProductForId";
        let value = self.call(Section::Products, action, &params, None).await?;
        one_or_many(value).map_err(|e| MwsError::payload(action, e))
    }

    async fn submit_feed(
        &self,
        feed: &[u8],
        feed_type: FeedType,
        marketplace_ids: &[&str],
    ) -> Result<FeedSubmissionInfo, MwsError> {
        let mut params = vec![pair("FeedType", feed_type.as_str())];
        params.extend(list_params("MarketplaceIdList.Id", marketplace_ids));

        let action = "SubmitFeed";
        let value = self
            .call(Section::Feeds, action, &params, Some(feed))
            .await?;
        let result: SubmitFeedResult = Self::decode(action, value)?;
        Ok(result.feed_submission_info)
    }

    async fn get_service_status(&self) -> Result<ServiceStatus, MwsError> {
        let action = "GetServiceStatus";
        let value = self.call(Section::Orders, action, &[], None).await?;
        Self::decode(action, value)
    }

    async fn get_feed_submission_count(&self) -> Result<FeedSubmissionCount, MwsError> {
        let action = "GetFeedSubmissionCount";
        let value = self.call(Section::Feeds, action, &[], None).await?;
        Self::decode(action, value)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
