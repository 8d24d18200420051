use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::role::Role;
use super::search::SearchResult;

/// Key under which a citation's snippet travels in `providerMetadata`.
pub const RESULT_METADATA_KEY: &str = "result";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
/// One discrete content unit within a chat message
pub enum MessagePart {
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        text: String,
    },
    Reasoning {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    SourceUrl {
        source_id: String,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider_metadata: Option<Value>,
    },
    #[serde(rename_all = "camelCase")]
    File {
        media_type: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
    /// Parts this crate has no use for, such as `step-start` markers.
    #[serde(other)]
    Unsupported,
}

impl MessagePart {
    pub fn text<S: Into<String>>(text: S) -> Self {
        MessagePart::Text {
            id: None,
            text: text.into(),
        }
    }

    pub fn source(result: &SearchResult) -> Self {
        MessagePart::SourceUrl {
            source_id: result.id.clone(),
            url: result.uri.clone(),
            title: Some(result.title.clone()),
            provider_metadata: Some(snippet_metadata(&result.snippet)),
        }
    }

    /// Get the text if this is a Text variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessagePart::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn snippet(&self) -> Option<&str> {
        match self {
            MessagePart::SourceUrl {
                provider_metadata: Some(metadata),
                ..
            } => metadata
                .get(RESULT_METADATA_KEY)
                .and_then(|result| result.get("snippet"))
                .and_then(Value::as_str),
            _ => None,
        }
    }
}

pub fn snippet_metadata(snippet: &str) -> Value {
    json!({ RESULT_METADATA_KEY: { "snippet": snippet } })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message in the chat transcript
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

impl ChatMessage {
    pub fn new<S: Into<String>>(id: S, role: Role) -> Self {
        ChatMessage {
            id: id.into(),
            role,
            parts: Vec::new(),
        }
    }

    pub fn user<S: Into<String>>(id: S) -> Self {
        Self::new(id, Role::User)
    }

    pub fn assistant<S: Into<String>>(id: S) -> Self {
        Self::new(id, Role::Assistant)
    }

    /// Add any MessagePart to the message
    pub fn with_part(mut self, part: MessagePart) -> Self {
        self.parts.push(part);
        self
    }

    /// Add text content to the message
    pub fn with_text<S: Into<String>>(self, text: S) -> Self {
        self.with_part(MessagePart::text(text))
    }

    /// All text parts joined by a single space, in part order
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(MessagePart::as_text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
