//! One DCA run - async-first design
//!
//! config -> ticker -> decide -> (maybe) AddOrder -> classify.
//! Nothing survives between runs.

use crate::auth::{AuthError, NonceSource};
use crate::classifier::classify_reply;
use crate::config::{ConfigError, DcaConfig};
use crate::executor::{OrderSubmitter, SubmitError};
use crate::intent::decide;
use crate::market_data::{MarketDataClient, MarketDataError};
use crate::types::{Decision, OrderOutcome, OrderSpec};
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Conditions that end a run without an outcome. None of them can leave
/// an order behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    MarketData(#[from] MarketDataError),
    #[error(transparent)]
    InvalidCredentials(#[from] AuthError),
}

pub struct DcaRunner {
    market: MarketDataClient,
    submitter: OrderSubmitter,
}

impl DcaRunner {
    /// `client` is shared by both endpoints; it must not carry auth headers.
    pub fn new(client: Client, api_url: &str, nonces: Arc<dyn NonceSource>) -> Self {
        Self {
            market: MarketDataClient::new(client.clone(), api_url),
            submitter: OrderSubmitter::new(client, api_url, nonces),
        }
    }

    /// Perform a single run
    pub async fn run(&self, config: &DcaConfig) -> Result<OrderOutcome, RunError> {
        let run_id = Uuid::new_v4();
        self.run_inner(config)
            .instrument(info_span!("dca_run", %run_id))
            .await
    }

    async fn run_inner(&self, config: &DcaConfig) -> Result<OrderOutcome, RunError> {
        let snapshot = self.market.fetch_last_price(&config.pair).await?;
        let observed_price = snapshot.last_trade_price;

        if decide(observed_price, config.price_threshold) == Decision::Skip {
            let outcome = OrderOutcome::Skipped {
                observed_price,
                threshold: config.price_threshold,
            };
            log_outcome(&outcome);
            return Ok(outcome);
        }

        info!(
            "Price {} is at or below threshold {}, buying {} {}",
            observed_price, config.price_threshold, config.quantity_to_buy, config.pair.base
        );

        let order = OrderSpec::market_buy(config.pair.clone(), config.quantity_to_buy);
        let outcome = match self.submitter.submit(&order, &config.credentials).await {
            Ok(reply) => classify_reply(&reply),
            Err(SubmitError::Auth(e)) => return Err(RunError::InvalidCredentials(e)),
            Err(SubmitError::NotSent(reason)) => OrderOutcome::failed(reason),
        };

        log_outcome(&outcome);
        Ok(outcome)
    }
}

/// Log an outcome at the level an operator should see it
pub fn log_outcome(outcome: &OrderOutcome) {
    match outcome {
        OrderOutcome::Skipped { .. } => info!("{}", outcome),
        OrderOutcome::Placed {
            description,
            transaction_id,
        } => {
            info!("Successfully placed order: {}", description);
            info!("Transaction ID: {}", transaction_id);
        }
        OrderOutcome::Failed { .. } => error!("{}", outcome),
        OrderOutcome::Ambiguous { .. } => warn!("{}", outcome),
    }
}
