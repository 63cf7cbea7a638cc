//! Public market data: last trade price from the Kraken Ticker endpoint

use crate::types::{TickerSnapshot, TradingPair};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

pub const TICKER_PATH: &str = "/0/public/Ticker";

/// Errors from the price-fetch stage. Either one aborts the run before
/// any order is attempted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    #[error("Market data unavailable: {0}")]
    MarketUnavailable(String),
    #[error("Malformed ticker response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    #[serde(default)]
    error: Vec<Value>,
    result: Option<HashMap<String, Value>>,
}

/// The part of a ticker entry we read; `c` is [last trade price, lot volume]
#[derive(Debug, Deserialize)]
struct TickerEntry {
    c: Vec<String>,
}

pub struct MarketDataClient {
    client: Client,
    base_url: String,
}

impl MarketDataClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch the last trade price for `pair`
    pub async fn fetch_last_price(
        &self,
        pair: &TradingPair,
    ) -> Result<TickerSnapshot, MarketDataError> {
        let url = format!("{}{}", self.base_url, TICKER_PATH);
        let response = self
            .client
            .get(&url)
            .query(&[("pair", pair.altname())])
            .send()
            .await
            .map_err(|e| MarketDataError::MarketUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MarketDataError::MarketUnavailable(format!(
                "Failed to retrieve price for the pair {}: HTTP {}",
                pair.altname(),
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MarketDataError::MarketUnavailable(e.to_string()))?;
        debug!("Ticker response ({}): {}", status, body);

        let last_trade_price = parse_last_price(&body, pair)?;
        info!("Last trade price for {}: {}", pair, last_trade_price);

        Ok(TickerSnapshot {
            pair: pair.clone(),
            last_trade_price,
        })
    }
}

/// Read `result.<pair>.c[0]` from a Ticker body as an exact decimal.
///
/// The entry is looked up by legacy name first, then by altname.
pub fn parse_last_price(body: &str, pair: &TradingPair) -> Result<Decimal, MarketDataError> {
    let response: TickerResponse = serde_json::from_str(body)
        .map_err(|e| MarketDataError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    if !response.error.is_empty() {
        return Err(MarketDataError::MarketUnavailable(format!(
            "Kraken API error: {}",
            join_errors(&response.error)
        )));
    }

    let result = response
        .result
        .ok_or_else(|| MarketDataError::MalformedResponse("No result in response".to_string()))?;

    let (legacy, alt) = (pair.legacy_name(), pair.altname());
    let entry = result
        .get(&legacy)
        .or_else(|| result.get(&alt))
        .ok_or_else(|| {
            MarketDataError::MalformedResponse(format!("No ticker entry for {} or {}", legacy, alt))
        })?;

    let entry = TickerEntry::deserialize(entry)
        .map_err(|e| MarketDataError::MalformedResponse(format!("bad ticker entry: {}", e)))?;

    let last = entry
        .c
        .first()
        .ok_or_else(|| MarketDataError::MalformedResponse("empty last-trade field".to_string()))?;

    // Decimal::from_str always uses '.' as the separator, whatever the host locale
    let price = Decimal::from_str(last.trim()).map_err(|e| {
        MarketDataError::MalformedResponse(format!("unparseable price {:?}: {}", last, e))
    })?;

    if price <= Decimal::ZERO {
        return Err(MarketDataError::MalformedResponse(format!(
            "non-positive price {}",
            price
        )));
    }

    Ok(price)
}

pub(crate) fn join_errors(errors: &[Value]) -> String {
    errors
        .iter()
        .map(|e| match e.as_str() {
            Some(s) => s.to_string(),
            None => e.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
