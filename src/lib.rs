//! kraken_dca - price-capped recurring market buys on Kraken
//!
//! Each invocation reads the last trade price, compares it with a ceiling
//! and, only at or below it, places one signed market-buy order.

pub mod auth;
pub mod classifier;
pub mod config;
pub mod executor;
pub mod intent;
pub mod market_data;
pub mod runner;
pub mod types;

#[cfg(test)]
mod mock_exchange;

pub use auth::{sign, AuthError, NonceSource, SequenceNonce, WallClockNonce};
pub use classifier::{classify, classify_reply};
pub use config::{ConfigError, DcaConfig};
pub use executor::{OrderSubmitter, SubmitError};
pub use intent::decide;
pub use market_data::{MarketDataClient, MarketDataError};
pub use runner::{log_outcome, DcaRunner, RunError};
pub use types::{
    Credentials, Decision, OrderOutcome, OrderSpec, RawResponse, SignedRequest, SubmitReply,
    TickerSnapshot, TradingPair,
};

use std::time::Duration;

/// HTTP client shared by every request of a run. No default headers.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("kraken_dca/", env!("CARGO_PKG_VERSION")))
        .build()
}
