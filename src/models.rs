use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Recipient of broadcast and status messages.
pub const EVERYONE: &str = "Todos";
pub const JOIN_TEXT: &str = "entra na sala...";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Milliseconds since the Unix epoch.
    pub last_status: i64,
}

impl Participant {
    pub fn new(name: String, last_status: i64) -> Self {
        Self { id: None, name, last_status }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Message,
    PrivateMessage,
    Status,
}

impl MessageType {
    /// Types a client is allowed to post.
    pub fn from_client(value: &str) -> Option<Self> {
        match value {
            "message" => Some(Self::Message),
            "private_message" => Some(Self::PrivateMessage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageType,
    /// Wall-clock `HH:MM:SS` of submission.
    pub time: String,
}

impl Message {
    pub fn join_announcement(name: &str, time: String) -> Self {
        Self {
            id: None,
            from: name.to_owned(),
            to: EVERYONE.to_owned(),
            text: JOIN_TEXT.to_owned(),
            kind: MessageType::Status,
            time,
        }
    }

    /// Private messages are only shown to their two parties; everything
    /// else is public. An anonymous viewer sees no private messages.
    pub fn is_visible_to(&self, user: Option<&str>) -> bool {
        match self.kind {
            MessageType::PrivateMessage => {
                user.is_some_and(|user| self.to == user || self.from == user)
            }
            MessageType::Message | MessageType::Status => true,
        }
    }
}

/// Keeps an explicit JSON `null` as `Some(Value::Null)`; only an absent
/// key (via `#[serde(default)]`) becomes `None`.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Body of `POST /participants`, as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewParticipant {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `POST /messages`, as received. `from` and `time` are accepted
/// but always replaced by the server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMessage {
    #[serde(default, deserialize_with = "present")]
    pub to: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub text: Option<Value>,
    #[serde(default, rename = "type", deserialize_with = "present")]
    pub kind: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub from: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub time: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A message about to be validated: the client's fields plus the identity
/// and timestamp the server stamps on it.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub from: Option<String>,
    pub to: Option<Value>,
    pub text: Option<Value>,
    pub kind: Option<Value>,
    pub time: String,
    pub extra: Map<String, Value>,
}

impl MessageDraft {
    pub fn stamp(body: NewMessage, sender: Option<&str>, time: String) -> Self {
        let NewMessage { to, text, kind, extra, .. } = body;
        Self {
            from: sender.map(str::to_owned),
            to,
            text,
            kind,
            time,
            extra,
        }
    }
}
