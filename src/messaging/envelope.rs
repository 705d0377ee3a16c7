use serde::{Deserialize, Serialize};

use crate::reconciliation::Notification;

// ============================================================================
// Topic Envelope
// ============================================================================
//
// Notifications arrive wrapped by the fan-out topic:
//
//   { "Type": "Notification", "MessageId": "...", "TopicArn": "...",
//     "Message": "<notification JSON as a string>", "Timestamp": "..." }
//
// Field names are also accepted in lowercase.
//
// ============================================================================

pub const EXPECTED_TYPE: &str = "Notification";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicEnvelope {
    #[serde(rename = "Type", alias = "type")]
    pub kind: String,

    #[serde(rename = "MessageId", alias = "messageid", alias = "message_id", default)]
    pub message_id: Option<String>,

    #[serde(rename = "TopicArn", alias = "topicarn", alias = "topic_arn", default)]
    pub topic_arn: Option<String>,

    #[serde(rename = "Message", alias = "message")]
    pub message: String,

    #[serde(rename = "Timestamp", alias = "timestamp", default)]
    pub timestamp: Option<String>,
}

impl TopicEnvelope {
    pub fn wrap(notification: &Notification) -> Result<Self, serde_json::Error> {
        Ok(Self {
            kind: EXPECTED_TYPE.to_string(),
            message_id: None,
            topic_arn: None,
            message: serde_json::to_string(notification)?,
            timestamp: None,
        })
    }
}

/// Reasons a queue message is dropped before reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(#[source] serde_json::Error),

    #[error("Unexpected envelope type: {0:?}")]
    UnexpectedType(String),

    #[error("Malformed notification payload: {0}")]
    MalformedPayload(#[source] serde_json::Error),
}

impl MessageError {
    pub fn reason(&self) -> &'static str {
        match self {
            MessageError::MalformedEnvelope(_) => "malformed_envelope",
            MessageError::UnexpectedType(_) => "unexpected_type",
            MessageError::MalformedPayload(_) => "malformed_payload",
        }
    }
}

/// Unwraps the envelope and decodes the notification it carries.
pub fn decode_notification(body: &[u8]) -> Result<Notification, MessageError> {
    let envelope: TopicEnvelope =
        serde_json::from_slice(body).map_err(MessageError::MalformedEnvelope)?;

    if envelope.kind != EXPECTED_TYPE {
        return Err(MessageError::UnexpectedType(envelope.kind));
    }

    serde_json::from_str(&envelope.message).map_err(MessageError::MalformedPayload)
}
