use thiserror::Error;

/// Errors returned by the MWS client.
#[derive(Debug, Error)]
pub enum MwsError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body is not well-formed XML.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The response parsed as XML but does not match the expected payload
    /// shape. `reason` names the missing or malformed field.
    #[error("unexpected payload for {context}: {reason}")]
    Payload { context: String, reason: String },

    /// MWS answered with an `ErrorResponse`.
    #[error("MWS API error {code}: {message}")]
    Api { code: String, message: String },

    /// Non-2xx response that did not carry a parseable `ErrorResponse`.
    #[error("unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("invalid MWS endpoint '{0}'")]
    InvalidEndpoint(String),
}

impl MwsError {
    pub(crate) fn payload(context: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Payload {
            context: context.into(),
            reason: reason.to_string(),
        }
    }
}
