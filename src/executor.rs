//! Order Submitter
//!
//! Signs and sends the AddOrder request. Exactly one POST per call, never
//! retried: a retry with a new nonce could buy twice.

use crate::auth::{sign, AuthError, NonceSource};
use crate::types::{Credentials, OrderSpec, RawResponse, SignedRequest, SubmitReply};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const ADD_ORDER_PATH: &str = "/0/private/AddOrder";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The request could not be built; nothing left the process.
    #[error("Request not sent: {0}")]
    NotSent(String),
}

pub struct OrderSubmitter {
    client: Client,
    base_url: String,
    nonces: Arc<dyn NonceSource>,
}

impl OrderSubmitter {
    pub fn new(client: Client, base_url: impl Into<String>, nonces: Arc<dyn NonceSource>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            nonces,
        }
    }

    /// Build the signed AddOrder request for `order` with a fresh nonce
    pub fn sign_order(
        &self,
        order: &OrderSpec,
        credentials: &Credentials,
    ) -> Result<SignedRequest, AuthError> {
        let nonce = self.nonces.next_nonce();
        let body = order.form_body(nonce);
        let signature = sign(ADD_ORDER_PATH, &body, &nonce.to_string(), &credentials.api_secret)?;

        Ok(SignedRequest {
            path: ADD_ORDER_PATH.to_string(),
            body,
            signature,
        })
    }

    /// Submit `order` and hand back whatever the exchange answered.
    ///
    /// A send failure, or a 2xx whose body is lost, is reported as
    /// `Interrupted`: the exchange may still have accepted the order.
    pub async fn submit(
        &self,
        order: &OrderSpec,
        credentials: &Credentials,
    ) -> Result<SubmitReply, SubmitError> {
        let signed = self.sign_order(order, credentials)?;

        info!(
            "Placing {} {} order for {} {} (key {})",
            order.order_type,
            order.side,
            order.volume,
            order.pair,
            credentials.api_key_redacted()
        );
        debug!("AddOrder body: {}", signed.body);

        // Headers are built per request; the shared client carries none.
        let request = self
            .client
            .post(format!("{}{}", self.base_url, signed.path))
            .header("API-Key", &credentials.api_key)
            .header("API-Sign", &signed.signature)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(signed.body)
            .build()
            .map_err(|e| SubmitError::NotSent(e.to_string()))?;

        let response = match self.client.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("AddOrder request interrupted: {}", e);
                return Ok(SubmitReply::Interrupted {
                    reason: describe_transport_error(&e),
                });
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => {
                debug!("AddOrder response ({}): {}", status, body);
                Ok(SubmitReply::Response(RawResponse { status, body }))
            }
            // A non-2xx status already says the order was not accepted.
            Err(e) if !(200..300).contains(&status) => {
                warn!("AddOrder response body lost (status {}): {}", status, e);
                Ok(SubmitReply::Response(RawResponse {
                    status,
                    body: String::new(),
                }))
            }
            Err(e) => {
                warn!("AddOrder response body lost (status {}): {}", status, e);
                Ok(SubmitReply::Interrupted {
                    reason: format!("status {} but body unreadable: {}", status, e),
                })
            }
        }
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}
