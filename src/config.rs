//! Run configuration, loaded from the process environment
//!
//! Required: KRAKEN_API_KEY, KRAKEN_PRIVATE_KEY, BITCOIN_AMOUNT and
//! PRICE_THRESHOLD. PAYMENT_CURRENCY, BASE_ASSET, KRAKEN_API_URL and
//! HTTP_TIMEOUT_SECS fall back to defaults.
//! Any problem here aborts the run before network I/O.

use crate::auth::{decode_secret, AuthError};
use crate::types::{Credentials, TradingPair};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.kraken.com";
pub const DEFAULT_BASE_ASSET: &str = "XBT";
pub const DEFAULT_PAYMENT_CURRENCY: &str = "EUR";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable is not set")]
    Missing(&'static str),
    #[error("{var} environment variable is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("KRAKEN_PRIVATE_KEY is unusable: {0}")]
    Credentials(#[from] AuthError),
}

/// Everything one run needs
#[derive(Debug, Clone)]
pub struct DcaConfig {
    pub credentials: Credentials,
    pub quantity_to_buy: Decimal,
    pub price_threshold: Decimal,
    pub pair: TradingPair,
    /// REST base URL without trailing slash
    pub api_url: String,
    pub http_timeout: Duration,
}

impl DcaConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let price_threshold = parse_positive_decimal("PRICE_THRESHOLD", &require("PRICE_THRESHOLD")?)?;
        let quantity_to_buy = parse_positive_decimal("BITCOIN_AMOUNT", &require("BITCOIN_AMOUNT")?)?;

        let api_key = require("KRAKEN_API_KEY")?;
        if api_key.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ConfigError::Invalid {
                var: "KRAKEN_API_KEY",
                reason: "contains whitespace".to_string(),
            });
        }
        let api_secret = require("KRAKEN_PRIVATE_KEY")?;
        decode_secret(&api_secret)?;

        let base = get("BASE_ASSET").unwrap_or_else(|| DEFAULT_BASE_ASSET.to_string());
        let quote = get("PAYMENT_CURRENCY").unwrap_or_else(|| DEFAULT_PAYMENT_CURRENCY.to_string());
        validate_asset("BASE_ASSET", &base)?;
        validate_asset("PAYMENT_CURRENCY", &quote)?;

        let api_url = get("KRAKEN_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let parsed = Url::parse(&api_url).map_err(|e| ConfigError::Invalid {
            var: "KRAKEN_API_URL",
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                var: "KRAKEN_API_URL",
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        let http_timeout = match get("HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "HTTP_TIMEOUT_SECS",
                        reason: format!("expected a positive integer, got {:?}", raw),
                    })
                }
            },
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let config = Self {
            credentials: Credentials::new(api_key, api_secret),
            quantity_to_buy,
            price_threshold,
            pair: TradingPair::new(base, quote),
            api_url: api_url.trim_end_matches('/').to_string(),
            http_timeout,
        };

        info!(
            "Config loaded: pair={} amount={} threshold={} key={}",
            config.pair,
            config.quantity_to_buy,
            config.price_threshold,
            config.credentials.api_key_redacted()
        );

        Ok(config)
    }
}

fn parse_positive_decimal(var: &'static str, raw: &str) -> Result<Decimal, ConfigError> {
    let value = Decimal::from_str(raw).map_err(|e| ConfigError::Invalid {
        var,
        reason: format!("{:?} is not a decimal: {}", raw, e),
    })?;
    if value <= Decimal::ZERO {
        return Err(ConfigError::Invalid {
            var,
            reason: format!("must be positive, got {}", value),
        });
    }
    Ok(value)
}

fn validate_asset(var: &'static str, asset: &str) -> Result<(), ConfigError> {
    if asset.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            var,
            reason: format!("{:?} is not an asset code", asset),
        })
    }
}
