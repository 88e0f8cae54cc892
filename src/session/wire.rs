//! JSON frame layout for the game-server socket.
//!
//! Requests carry a client-assigned id; the server answers with a `response`
//! frame echoing that id and either a `result` payload or an `error` string.
//! Everything else the server sends is a named `event` frame.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request bodies the client can send.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum RequestBody {
    GetBankrollHistory,
    Divest { amount: u64 },
}

/// Outgoing frame: request body plus correlation id.
#[derive(Debug, Clone, Serialize)]
pub struct ClientFrame {
    pub id: u64,
    #[serde(flatten)]
    pub body: RequestBody,
}

/// Incoming frames.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerFrame {
    Response {
        id: u64,
        #[serde(default)]
        result: Value,
        #[serde(default)]
        error: Option<String>,
    },
    Event {
        #[serde(flatten)]
        event: EventFrame,
    },
}

/// Server-pushed events, tagged by name. Payload fields feed the state
/// mirror; the event itself is fanned out to subscribers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum EventFrame {
    BankrollChanged { bankroll: u64 },
    GameEnded,
    BankrollStatsChanged { stake: f64 },
    UnameChanged { uname: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_divest_request() {
        let frame = ClientFrame {
            id: 7,
            body: RequestBody::Divest { amount: 12_000 },
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["method"], "divest");
        assert_eq!(json["amount"], 12_000);
    }

    #[test]
    fn test_serialize_history_request_has_no_amount() {
        let frame = ClientFrame {
            id: 1,
            body: RequestBody::GetBankrollHistory,
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["method"], "getBankrollHistory");
        assert!(json.get("amount").is_none());
    }

    #[test]
    fn test_parse_success_response() {
        let raw = r#"{"type":"response","id":3,"result":[]}"#;
        let frame: ServerFrame = serde_json::from_str(raw).unwrap();
        match frame {
            ServerFrame::Response { id, result, error } => {
                assert_eq!(id, 3);
                assert!(result.is_array());
                assert!(error.is_none());
            }
            _ => panic!("expected response frame"),
        }
    }

    #[test]
    fn test_parse_error_response() {
        let raw = r#"{"type":"response","id":9,"error":"NOT_IN_BETWEEN_GAMES"}"#;
        let frame: ServerFrame = serde_json::from_str(raw).unwrap();
        match frame {
            ServerFrame::Response { id, error, .. } => {
                assert_eq!(id, 9);
                assert_eq!(error.as_deref(), Some("NOT_IN_BETWEEN_GAMES"));
            }
            _ => panic!("expected response frame"),
        }
    }

    #[test]
    fn test_parse_game_ended_event() {
        let raw = r#"{"type":"event","name":"gameEnded"}"#;
        let frame: ServerFrame = serde_json::from_str(raw).unwrap();
        match frame {
            ServerFrame::Event { event } => assert_eq!(event, EventFrame::GameEnded),
            _ => panic!("expected event frame"),
        }
    }

    #[test]
    fn test_parse_bankroll_changed_event_payload() {
        let raw = r#"{"type":"event","name":"bankrollChanged","bankroll":250000}"#;
        let frame: ServerFrame = serde_json::from_str(raw).unwrap();
        match frame {
            ServerFrame::Event { event } => {
                assert_eq!(event, EventFrame::BankrollChanged { bankroll: 250_000 });
            }
            _ => panic!("expected event frame"),
        }
    }
}
