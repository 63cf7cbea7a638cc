//! Type definitions for the DCA bot
//!
//! Everything here is built fresh for a single run and dropped at its end.

use crate::auth::redact_key;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base/quote asset pair, e.g. XBT/EUR.
///
/// Kraken names the same market differently depending on the endpoint, so
/// both encodings are derived here and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradingPair {
    pub base: String,
    pub quote: String,
}

impl TradingPair {
    pub fn new(base: impl AsRef<str>, quote: impl AsRef<str>) -> Self {
        Self {
            base: base.as_ref().trim().to_ascii_uppercase(),
            quote: quote.as_ref().trim().to_ascii_uppercase(),
        }
    }

    /// Altname used to query the public Ticker endpoint (e.g. "XBTEUR")
    pub fn altname(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }

    /// Legacy X/Z-prefixed name (e.g. "XXBTZEUR").
    ///
    /// Ticker results are keyed by it and AddOrder's `pair` field takes it.
    pub fn legacy_name(&self) -> String {
        format!("X{}Z{}", self.base, self.quote)
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// API credentials. The secret stays Base64 encoded until signing time.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// API key for display/logging - redacted
    pub fn api_key_redacted(&self) -> String {
        redact_key(&self.api_key)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key_redacted())
            .field("api_secret", &"****")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "market"),
        }
    }
}

/// The one order a run may place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    pub pair: TradingPair,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub volume: Decimal,
}

impl OrderSpec {
    pub fn market_buy(pair: TradingPair, volume: Decimal) -> Self {
        Self {
            pair,
            side: OrderSide::Buy,
            order_type: OrderType::Market,
            volume,
        }
    }

    /// AddOrder form body. Field order is fixed: the signature covers these
    /// exact bytes.
    pub fn form_body(&self, nonce: u64) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("nonce", &nonce.to_string())
            .append_pair("ordertype", &self.order_type.to_string())
            .append_pair("pair", &self.pair.legacy_name())
            .append_pair("type", &self.side.to_string())
            .append_pair("volume", &self.volume.to_string())
            .finish()
    }
}

/// A request ready to go out: the signature is only valid for this body.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub path: String,
    pub body: String,
    pub signature: String,
}

impl fmt::Debug for SignedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedRequest")
            .field("path", &self.path)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

/// Last trade price for a pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerSnapshot {
    pub pair: TradingPair,
    pub last_trade_price: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Skip,
}

/// Status and body of an HTTP response, untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// What came back from an AddOrder attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReply {
    /// The exchange answered (any status)
    Response(RawResponse),
    /// The request may have reached the exchange but no answer was read
    Interrupted { reason: String },
}

/// Result of one run, reported to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OrderOutcome {
    Skipped {
        observed_price: Decimal,
        threshold: Decimal,
    },
    Placed {
        description: String,
        transaction_id: String,
    },
    /// The exchange rejected the order, or never got it
    Failed { reason: String },
    /// Order fate unknown: it has to be checked on the exchange by hand
    Ambiguous { reason: String },
}

impl OrderOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        OrderOutcome::Failed {
            reason: reason.into(),
        }
    }

    /// Skipped and Placed are both a successful run.
    pub fn is_success(&self) -> bool {
        matches!(self, OrderOutcome::Skipped { .. } | OrderOutcome::Placed { .. })
    }
}

impl fmt::Display for OrderOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderOutcome::Skipped {
                observed_price,
                threshold,
            } => write!(
                f,
                "Price {} is above threshold {}. No order placed.",
                observed_price, threshold
            ),
            OrderOutcome::Placed {
                description,
                transaction_id,
            } => write!(
                f,
                "Successfully placed order: {} (txid {})",
                description, transaction_id
            ),
            OrderOutcome::Failed { reason } => write!(f, "Failed to place order: {}", reason),
            OrderOutcome::Ambiguous { reason } => write!(
                f,
                "Order status unknown ({}); verify on the exchange before the next run",
                reason
            ),
        }
    }
}
