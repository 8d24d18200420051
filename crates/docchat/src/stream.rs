//! Event vocabulary of the UI message stream
//!
//! A text unit is always framed as `text-start`, `text-delta`, `text-end` under
//! one id. Citations are a single atomic `source-url` event. Over HTTP each
//! event becomes one server-sent `data:` frame and the stream is closed with
//! `data: [DONE]`.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::IdGenerator;
use crate::models::message::snippet_metadata;
use crate::models::search::SearchResult;

/// Header that tells the widget which stream protocol the body speaks.
pub const UI_MESSAGE_STREAM_HEADER: &str = "x-vercel-ai-ui-message-stream";
pub const UI_MESSAGE_STREAM_VERSION: &str = "v1";

const DONE_FRAME: &str = "data: [DONE]\n\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamEvent {
    TextStart {
        id: String,
    },
    TextDelta {
        id: String,
        delta: String,
    },
    TextEnd {
        id: String,
    },
    #[serde(rename_all = "camelCase")]
    SourceUrl {
        source_id: String,
        url: String,
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider_metadata: Option<Value>,
    },
}

impl StreamEvent {
    /// Format this event as one server-sent event frame
    pub fn to_sse(&self) -> String {
        let encoded = serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"));
        format!("data: {}\n\n", encoded)
    }

    pub fn is_source(&self) -> bool {
        matches!(self, StreamEvent::SourceUrl { .. })
    }
}

/// Terminal frame written after the last event
pub fn done_frame() -> String {
    DONE_FRAME.to_string()
}

/// Accumulates the ordered event sequence of one response.
pub struct StreamWriter<'a> {
    ids: &'a dyn IdGenerator,
    events: Vec<StreamEvent>,
}

impl<'a> StreamWriter<'a> {
    pub fn new(ids: &'a dyn IdGenerator) -> Self {
        Self {
            ids,
            events: Vec::new(),
        }
    }

    /// Emit one complete text unit under a fresh id
    pub fn write_text<S: Into<String>>(&mut self, content: S) -> &mut Self {
        let id = self.ids.generate();
        self.events.push(StreamEvent::TextStart { id: id.clone() });
        self.events.push(StreamEvent::TextDelta {
            id: id.clone(),
            delta: content.into(),
        });
        self.events.push(StreamEvent::TextEnd { id });
        self
    }

    pub fn write_source(&mut self, result: &SearchResult) -> &mut Self {
        self.events.push(StreamEvent::SourceUrl {
            source_id: result.id.clone(),
            url: result.uri.clone(),
            title: result.title.clone(),
            provider_metadata: Some(snippet_metadata(&result.snippet)),
        });
        self
    }

    pub fn finish(self) -> Vec<StreamEvent> {
        self.events
    }
}
