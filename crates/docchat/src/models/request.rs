use serde::{Deserialize, Serialize};

use super::message::ChatMessage;

/// The action that produced a [`SendMessageRequest`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    #[default]
    SubmitMessage,
    RegenerateMessage,
}

/// Payload a chat client sends when the user submits or regenerates a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub trigger: Trigger,
}

impl SendMessageRequest {
    pub fn new<S: Into<String>>(id: S, messages: Vec<ChatMessage>, trigger: Trigger) -> Self {
        SendMessageRequest {
            id: id.into(),
            messages,
            trigger,
        }
    }
}
