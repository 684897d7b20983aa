use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::game::{PlayerScore, Question, Status, UserAnswer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Answer,
    GameState,
    Time,
}

/// Outer frame shape shared by every message on the socket.
///
/// `data` is written as a JSON-encoded string. Inbound frames whose `data` is
/// already a JSON object are accepted as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub message_type: MessageType,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRequest {
    pub now: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeReply {
    pub diff_receive: i64,
    #[serde(default)]
    pub ts: u64,
    pub ts_received: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSubmission {
    pub id: String,
    pub timestamp: u64,
    pub user: String,
}

/// Full game snapshot as broadcast by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateFrame {
    pub status: Status,
    pub action_start: u64,
    pub next_action: u64,
    // present-but-null is fine, absent is a partial frame
    #[serde(deserialize_with = "Option::deserialize")]
    pub current_question: Option<Question>,
    pub players: Vec<PlayerScore>,
    pub given_answers: Vec<UserAnswer>,
    pub hide_answers: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid envelope: {0}")]
    Envelope(serde_json::Error),
    #[error("invalid {kind:?} payload: {source}")]
    Payload {
        kind: MessageType,
        source: serde_json::Error,
    },
    #[error("unexpected message type {0:?}")]
    UnexpectedType(MessageType),
    #[error("serialization failed: {0}")]
    Serialize(serde_json::Error),
    #[error("status {0:?} requires a current question")]
    MissingQuestion(Status),
    #[error("duplicate player {0:?} in score list")]
    DuplicatePlayer(String),
    #[error("action window ends before it starts ({start} > {end})")]
    InvalidWindow { start: u64, end: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    GameState(GameStateFrame),
    Time(TimeReply),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Time(TimeRequest),
    Answer(AnswerSubmission),
}

impl Inbound {
    pub fn message_type(&self) -> MessageType {
        match self {
            Inbound::GameState(_) => MessageType::GameState,
            Inbound::Time(_) => MessageType::Time,
        }
    }

    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(FrameError::Envelope)?;
        match envelope.message_type {
            MessageType::GameState => {
                decode_payload(MessageType::GameState, envelope.data).map(Inbound::GameState)
            }
            MessageType::Time => decode_payload(MessageType::Time, envelope.data).map(Inbound::Time),
            other => Err(FrameError::UnexpectedType(other)),
        }
    }

    pub fn encode(&self) -> Result<String, FrameError> {
        match self {
            Inbound::GameState(frame) => encode_payload(MessageType::GameState, frame),
            Inbound::Time(reply) => encode_payload(MessageType::Time, reply),
        }
    }
}

impl Outbound {
    pub fn message_type(&self) -> MessageType {
        match self {
            Outbound::Time(_) => MessageType::Time,
            Outbound::Answer(_) => MessageType::Answer,
        }
    }

    pub fn encode(&self) -> Result<String, FrameError> {
        match self {
            Outbound::Time(request) => encode_payload(MessageType::Time, request),
            Outbound::Answer(answer) => encode_payload(MessageType::Answer, answer),
        }
    }

    pub fn decode(text: &str) -> Result<Self, FrameError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(FrameError::Envelope)?;
        match envelope.message_type {
            MessageType::Time => decode_payload(MessageType::Time, envelope.data).map(Outbound::Time),
            MessageType::Answer => {
                decode_payload(MessageType::Answer, envelope.data).map(Outbound::Answer)
            }
            other => Err(FrameError::UnexpectedType(other)),
        }
    }
}

fn encode_payload<T: Serialize>(kind: MessageType, payload: &T) -> Result<String, FrameError> {
    let data = serde_json::to_string(payload).map_err(FrameError::Serialize)?;
    let envelope = Envelope {
        message_type: kind,
        data: Value::String(data),
    };
    serde_json::to_string(&envelope).map_err(FrameError::Serialize)
}

fn decode_payload<T: DeserializeOwned>(kind: MessageType, data: Value) -> Result<T, FrameError> {
    let result = match data {
        Value::String(text) => serde_json::from_str(&text),
        other => serde_json::from_value(other),
    };
    result.map_err(|source| FrameError::Payload { kind, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_json() -> String {
        serde_json::json!({
            "status": "Ready",
            "action_start": 0,
            "next_action": 0,
            "current_question": null,
            "players": [],
            "given_answers": [],
            "hide_answers": false
        })
        .to_string()
    }

    #[test]
    fn test_decode_string_encoded_game_state() {
        let text = serde_json::json!({
            "message_type": "GameState",
            "data": state_json(),
        })
        .to_string();

        match Inbound::decode(&text).unwrap() {
            Inbound::GameState(frame) => {
                assert_eq!(frame.status, Status::Ready);
                assert!(frame.current_question.is_none());
            }
            other => panic!("Expected GameState, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_time_reply_with_object_data() {
        let text = r#"{"message_type":"Time","data":{"diff_receive":50,"ts_received":1000}}"#;

        let inbound = Inbound::decode(text).unwrap();
        assert_eq!(
            inbound,
            Inbound::Time(TimeReply {
                diff_receive: 50,
                ts: 0,
                ts_received: 1000,
            })
        );
    }

    #[test]
    fn test_missing_question_key_is_partial() {
        let mut value: Value = serde_json::from_str(&state_json()).unwrap();
        value.as_object_mut().unwrap().remove("current_question");
        let text = serde_json::json!({
            "message_type": "GameState",
            "data": value.to_string(),
        })
        .to_string();

        let err = Inbound::decode(&text).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Payload {
                kind: MessageType::GameState,
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_unknown_and_unexpected_types() {
        let unknown = r#"{"message_type":"Chat","data":"{}"}"#;
        assert!(matches!(
            Inbound::decode(unknown),
            Err(FrameError::Envelope(_))
        ));

        let answer = r#"{"message_type":"Answer","data":"{}"}"#;
        assert!(matches!(
            Inbound::decode(answer),
            Err(FrameError::UnexpectedType(MessageType::Answer))
        ));

        assert!(matches!(
            Inbound::decode("not json"),
            Err(FrameError::Envelope(_))
        ));
    }

    #[test]
    fn test_outbound_data_is_json_string() {
        let outbound = Outbound::Answer(AnswerSubmission {
            id: "A1".to_string(),
            timestamp: 1950,
            user: "lars".to_string(),
        });

        let text = outbound.encode().unwrap();
        let envelope: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(envelope["message_type"], "Answer");

        let data = envelope["data"].as_str().expect("data should be a string");
        let payload: Value = serde_json::from_str(data).unwrap();
        assert_eq!(payload["id"], "A1");
        assert_eq!(payload["timestamp"], 1950);
        assert_eq!(payload["user"], "lars");

        assert_eq!(Outbound::decode(&text).unwrap(), outbound);
    }
}
