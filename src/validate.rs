//! Payload checks run before anything touches the store.
//!
//! Every rule is evaluated and each violation contributes one message, so a
//! client sees all of its mistakes at once.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{Message, MessageDraft, MessageType, NewParticipant};

const TYPE_PATTERN: &str = "/^(private_message|message)$/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid payload: {}", .messages.join("; "))]
pub struct ValidationError {
    pub messages: Vec<String>,
}

#[derive(Debug, Default)]
struct Violations(Vec<String>);

impl Violations {
    /// Records why `value` is not a non-empty string, returning it if it is.
    fn required_str(&mut self, field: &str, value: Option<&Value>) -> Option<String> {
        match value {
            None => self.0.push(format!(r#""{field}" is required"#)),
            Some(Value::String(s)) if s.is_empty() => {
                self.0.push(format!(r#""{field}" is not allowed to be empty"#))
            }
            Some(Value::String(s)) => return Some(s.clone()),
            Some(_) => self.0.push(format!(r#""{field}" must be a string"#)),
        }
        None
    }

    fn message_type(&mut self, value: Option<&Value>) -> Option<MessageType> {
        match value {
            None => Some(MessageType::Message),
            Some(Value::String(s)) => {
                let kind = MessageType::from_client(s);
                if kind.is_none() {
                    self.0.push(format!(
                        r#""type" with value "{s}" fails to match the required pattern: {TYPE_PATTERN}"#
                    ));
                }
                kind
            }
            Some(_) => {
                self.0.push(r#""type" must be a string"#.to_owned());
                None
            }
        }
    }

    fn unknown_keys(&mut self, extra: &Map<String, Value>) {
        self.0
            .extend(extra.keys().map(|key| format!(r#""{key}" is not allowed"#)));
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, ValidationError> {
        match value {
            Some(value) if self.0.is_empty() => Ok(value),
            _ => Err(ValidationError { messages: self.0 }),
        }
    }
}

/// Returns the participant name if the payload is acceptable.
pub fn validate_participant(payload: &NewParticipant) -> Result<String, ValidationError> {
    let mut violations = Violations::default();
    let name = violations.required_str("name", payload.name.as_ref());
    violations.unknown_keys(&payload.extra);

    violations.finish(name)
}

/// Turns a stamped draft into a storable message. A draft without `type`
/// becomes a public message.
pub fn validate_message(draft: &MessageDraft) -> Result<Message, ValidationError> {
    let mut violations = Violations::default();
    let from_value = draft.from.clone().map(Value::String);
    let from = violations.required_str("from", from_value.as_ref());
    let to = violations.required_str("to", draft.to.as_ref());
    let text = violations.required_str("text", draft.text.as_ref());
    let kind = violations.message_type(draft.kind.as_ref());
    violations.unknown_keys(&draft.extra);

    let message = match (from, to, text, kind) {
        (Some(from), Some(to), Some(text), Some(kind)) => Some(Message {
            id: None,
            from,
            to,
            text,
            kind,
            time: draft.time.clone(),
        }),
        _ => None,
    };

    violations.finish(message)
}
