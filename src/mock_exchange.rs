//! In-process stand-in for the Kraken REST API, used by tests.
//!
//! Serves canned Ticker/AddOrder replies on 127.0.0.1 and records every
//! AddOrder call it receives.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

pub const TEST_API_KEY: &str = "TESTKEY-0123456789";
/// Bytes 0x00..=0x3f, Base64 encoded
pub const TEST_SECRET: &str =
    "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8gISIjJCUmJygpKissLS4vMDEyMzQ1Njc4OTo7PD0+Pw==";

/// One AddOrder request as the exchange saw it
#[derive(Debug, Clone)]
pub struct RecordedOrder {
    pub api_key: Option<String>,
    pub api_sign: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl RecordedOrder {
    pub fn field(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(self.body.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

#[derive(Clone)]
struct MockState {
    ticker: (u16, String),
    add_order: (u16, String),
    add_order_delay: Option<Duration>,
    ticker_queries: Arc<Mutex<Vec<String>>>,
    orders: Arc<Mutex<Vec<RecordedOrder>>>,
}

pub struct MockExchangeBuilder {
    state: MockState,
}

impl MockExchangeBuilder {
    pub fn ticker(mut self, status: u16, body: &str) -> Self {
        self.state.ticker = (status, body.to_string());
        self
    }

    pub fn add_order(mut self, status: u16, body: &str) -> Self {
        self.state.add_order = (status, body.to_string());
        self
    }

    pub fn add_order_delay(mut self, delay: Duration) -> Self {
        self.state.add_order_delay = Some(delay);
        self
    }

    pub async fn start(self) -> MockExchange {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = self.state;

        let app = Router::new()
            .route("/0/public/Ticker", get(ticker))
            .route("/0/private/AddOrder", post(add_order))
            .with_state(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockExchange {
            base_url: format!("http://{}", addr),
            state,
        }
    }
}

pub struct MockExchange {
    base_url: String,
    state: MockState,
}

impl MockExchange {
    pub fn builder() -> MockExchangeBuilder {
        MockExchangeBuilder {
            state: MockState {
                ticker: (200, r#"{"error":[],"result":{}}"#.to_string()),
                add_order: (200, r#"{"error":[]}"#.to_string()),
                add_order_delay: None,
                ticker_queries: Arc::new(Mutex::new(Vec::new())),
                orders: Arc::new(Mutex::new(Vec::new())),
            },
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    /// `pair` query values received on the Ticker endpoint
    pub fn ticker_queries(&self) -> Vec<String> {
        self.state.ticker_queries.lock().unwrap().clone()
    }

    pub fn orders(&self) -> Vec<RecordedOrder> {
        self.state.orders.lock().unwrap().clone()
    }

    /// Base URL of a port nothing listens on
    pub async fn unreachable_url() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }
}

fn reply((status, body): &(u16, String)) -> (StatusCode, String) {
    (StatusCode::from_u16(*status).unwrap(), body.clone())
}

async fn ticker(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, String) {
    if let Some(pair) = params.get("pair") {
        state.ticker_queries.lock().unwrap().push(pair.clone());
    }
    reply(&state.ticker)
}

async fn add_order(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    state.orders.lock().unwrap().push(RecordedOrder {
        api_key: header("API-Key"),
        api_sign: header("API-Sign"),
        content_type: header("content-type"),
        body,
    });

    if let Some(delay) = state.add_order_delay {
        tokio::time::sleep(delay).await;
    }
    reply(&state.add_order)
}
