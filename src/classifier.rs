//! Turns an AddOrder reply into an `OrderOutcome`.
//!
//! Never fails: whatever the exchange sends back ends up as an outcome.

use crate::market_data::join_errors;
use crate::types::{OrderOutcome, RawResponse, SubmitReply};
use serde::Deserialize;
use serde_json::Value;

pub const UNEXPECTED_STRUCTURE: &str = "unexpected response structure";

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct AddOrderResponse {
    result: AddOrderResult,
}

#[derive(Debug, Deserialize)]
struct AddOrderResult {
    descr: OrderDescription,
    txid: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OrderDescription {
    order: String,
}

/// Classify an HTTP response from AddOrder
pub fn classify(response: &RawResponse) -> OrderOutcome {
    if !response.is_success() {
        return OrderOutcome::failed(format!("transport error: {}", response.status));
    }

    let envelope: ErrorEnvelope = match serde_json::from_str(&response.body) {
        Ok(envelope) => envelope,
        Err(_) => return OrderOutcome::failed(UNEXPECTED_STRUCTURE),
    };
    if !envelope.error.is_empty() {
        return OrderOutcome::failed(join_errors(&envelope.error));
    }

    match serde_json::from_str::<AddOrderResponse>(&response.body) {
        Ok(AddOrderResponse { result }) => match result.txid.into_iter().next() {
            Some(transaction_id) => OrderOutcome::Placed {
                description: result.descr.order,
                transaction_id,
            },
            None => OrderOutcome::failed(UNEXPECTED_STRUCTURE),
        },
        Err(_) => OrderOutcome::failed(UNEXPECTED_STRUCTURE),
    }
}

/// Classify the submitter's reply; a lost reply is ambiguous, not failed.
pub fn classify_reply(reply: &SubmitReply) -> OrderOutcome {
    match reply {
        SubmitReply::Response(response) => classify(response),
        SubmitReply::Interrupted { reason } => OrderOutcome::Ambiguous {
            reason: reason.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(body: &str) -> RawResponse {
        RawResponse::new(200, body)
    }

    #[test]
    fn test_placed() {
        let outcome = classify(&ok(
            r#"{"error":[],"result":{"descr":{"order":"buy 0.001 XBTEUR @ market"},"txid":["ABC123","DEF456"]}}"#,
        ));
        assert_eq!(
            outcome,
            OrderOutcome::Placed {
                description: "buy 0.001 XBTEUR @ market".to_string(),
                transaction_id: "ABC123".to_string(),
            }
        );
    }

    #[test]
    fn test_placed_without_error_field() {
        let outcome = classify(&ok(
            r#"{"result":{"descr":{"order":"buy 0.5 XBTUSD @ market"},"txid":["O1"]}}"#,
        ));
        assert!(matches!(outcome, OrderOutcome::Placed { .. }));
    }

    #[test]
    fn test_exchange_errors_are_joined() {
        let outcome = classify(&ok(
            r#"{"error":["EOrder:Insufficient funds","EGeneral:Invalid arguments"]}"#,
        ));
        assert_eq!(
            outcome,
            OrderOutcome::failed("EOrder:Insufficient funds, EGeneral:Invalid arguments")
        );
    }

    #[test]
    fn test_errors_win_over_result() {
        let outcome = classify(&ok(
            r#"{"error":["EAPI:Invalid nonce"],"result":{"descr":{"order":"x"},"txid":["T"]}}"#,
        ));
        assert_eq!(outcome, OrderOutcome::failed("EAPI:Invalid nonce"));
    }

    #[test]
    fn test_transport_status() {
        let outcome = classify(&RawResponse::new(503, r#"{"error":[]}"#));
        assert_eq!(outcome, OrderOutcome::failed("transport error: 503"));
    }

    #[test]
    fn test_unexpected_structures() {
        let bodies = [
            r#"{"error":[]}"#,
            r#"{"error":[],"result":{}}"#,
            r#"{"error":[],"result":{"descr":{"order":"buy"},"txid":[]}}"#,
            r#"{"error":[],"result":{"descr":{},"txid":["T"]}}"#,
            r#"{"error":[],"result":{"descr":{"order":"buy"},"txid":"T"}}"#,
            r#"{"error":[],"result":"ok"}"#,
            r#"[1,2,3]"#,
            "<html>gateway</html>",
            "",
        ];
        for body in bodies {
            assert_eq!(
                classify(&ok(body)),
                OrderOutcome::failed(UNEXPECTED_STRUCTURE),
                "body: {}",
                body
            );
        }
    }

    #[test]
    fn test_interrupted_reply_is_ambiguous() {
        let reply = SubmitReply::Interrupted {
            reason: "timed out".to_string(),
        };
        assert_eq!(
            classify_reply(&reply),
            OrderOutcome::Ambiguous {
                reason: "timed out".to_string()
            }
        );
    }
}
