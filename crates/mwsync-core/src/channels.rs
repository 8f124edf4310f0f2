use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::channel::AMAZON_MWS_SOURCE;
use crate::ConfigError;

fn default_source() -> String {
    AMAZON_MWS_SOURCE.to_string()
}

fn default_uom() -> String {
    "Unit".to_string()
}

fn default_active() -> bool {
    true
}

/// A channel as declared in `channels.yaml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub code: String,
    pub name: String,
    #[serde(default = "default_source")]
    pub source: String,
    pub merchant_id: String,
    pub marketplace_id: String,
    pub access_key: String,
    pub secret_key: String,
    pub currency_code: String,
    #[serde(default = "default_uom")]
    pub default_uom: String,
    pub default_account_revenue: Option<String>,
    pub default_account_expense: Option<String>,
    pub warehouse: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl std::fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelConfig")
            .field("code", &self.code)
            .field("name", &self.name)
            .field("source", &self.source)
            .field("merchant_id", &self.merchant_id)
            .field("marketplace_id", &self.marketplace_id)
            .field("access_key", &"[redacted]")
            .field("secret_key", &"[redacted]")
            .field("currency_code", &self.currency_code)
            .field("warehouse", &self.warehouse)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
pub struct ChannelsFile {
    pub channels: Vec<ChannelConfig>,
}

/// Load and validate the channel declarations from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_channels(path: &Path) -> Result<ChannelsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ChannelsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_channels(&content)
}

/// Parse and validate channel declarations from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text is not valid YAML or fails validation.
pub fn parse_channels(content: &str) -> Result<ChannelsFile, ConfigError> {
    let channels_file: ChannelsFile = serde_yaml::from_str(content)?;
    validate_channels(&channels_file)?;
    Ok(channels_file)
}

fn validate_channels(channels_file: &ChannelsFile) -> Result<(), ConfigError> {
    let mut seen_codes = HashSet::new();

    for channel in &channels_file.channels {
        if channel.code.trim().is_empty() {
            return Err(ConfigError::Validation(
                "channel code must be non-empty".to_string(),
            ));
        }

        if !seen_codes.insert(channel.code.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate channel code: '{}'",
                channel.code
            )));
        }

        if channel.source != AMAZON_MWS_SOURCE {
            continue;
        }

        let required = [
            ("merchant_id", &channel.merchant_id),
            ("marketplace_id", &channel.marketplace_id),
            ("access_key", &channel.access_key),
            ("secret_key", &channel.secret_key),
            ("warehouse", &channel.warehouse),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "channel '{}' is missing {field}",
                    channel.code
                )));
            }
        }

        if channel.currency_code.len() != 3 {
            return Err(ConfigError::Validation(format!(
                "channel '{}' has invalid currency code '{}'",
                channel.code, channel.currency_code
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r"
channels:
  - code: amazon-us
    name: Amazon US
    merchant_id: A1MERCHANT
    marketplace_id: ATVPDKIKX0DER
    access_key: AKIAEXAMPLE
    secret_key: secret
    currency_code: USD
    warehouse: WH
";

    #[test]
    fn parses_valid_file_with_defaults() {
        let file = parse_channels(VALID).expect("valid channels file");
        assert_eq!(file.channels.len(), 1);
        let channel = &file.channels[0];
        assert_eq!(channel.source, "amazon_mws");
        assert_eq!(channel.default_uom, "Unit");
        assert!(channel.is_active);
        assert!(channel.default_account_revenue.is_none());
    }

    #[test]
    fn rejects_duplicate_codes() {
        let yaml = format!(
            "{VALID}  - code: AMAZON-US\n    name: Dup\n    merchant_id: M\n    marketplace_id: X\n    access_key: A\n    secret_key: S\n    currency_code: USD\n    warehouse: WH\n"
        );
        let err = parse_channels(&yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate channel code"));
    }

    #[test]
    fn rejects_missing_credentials_for_mws_channel() {
        let yaml = VALID.replace("secret_key: secret", "secret_key: ''");
        let err = parse_channels(&yaml).unwrap_err();
        assert!(err.to_string().contains("missing secret_key"), "{err}");
    }

    #[test]
    fn other_sources_skip_credential_checks() {
        let yaml = r"
channels:
  - code: webshop
    name: Web shop
    source: webshop
    merchant_id: ''
    marketplace_id: ''
    access_key: ''
    secret_key: ''
    currency_code: EUR
    warehouse: ''
";
        assert!(parse_channels(yaml).is_ok());
    }

    #[test]
    fn rejects_bad_currency_code() {
        let yaml = VALID.replace("currency_code: USD", "currency_code: DOLLAR");
        let err = parse_channels(&yaml).unwrap_err();
        assert!(err.to_string().contains("invalid currency code"));
    }

    #[test]
    fn debug_redacts_secret() {
        let file = parse_channels(VALID).unwrap();
        let debug = format!("{:?}", file.channels[0]);
        assert!(!debug.contains("AKIAEXAMPLE"));
    }

    #[test]
    fn load_channels_from_repo_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("channels.yaml");
        let file = load_channels(&path).expect("failed to load config/channels.yaml");
        assert!(!file.channels.is_empty());
        assert!(file.channels.iter().any(|c| c.is_active));
    }
}
