use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::doc_search::DocSearchResponse;
use crate::errors::ConversationError;
use crate::ids::IdGenerator;
use crate::models::message::{ChatMessage, MessagePart};
use crate::models::request::{SendMessageRequest, Trigger};
use crate::models::role::Role;
use crate::stream::StreamEvent;

/// Where the transcript is in its request cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    /// Waiting for input.
    Ready,
    /// A request was sent, nothing received yet.
    Submitted,
    /// Events are being folded into the in-flight assistant message.
    Streaming,
    /// The last request failed; see [`Conversation::error`].
    Error,
}

/// Client-side transcript that turns stream events into chat messages.
///
/// Allows at most one request in flight. Messages are append-only except the
/// in-flight assistant message.
pub struct Conversation {
    id: String,
    ids: Arc<dyn IdGenerator>,
    messages: Vec<ChatMessage>,
    status: ChatStatus,
    open_text: HashSet<String>,
    error: Option<String>,
}

impl Conversation {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            id: ids.generate(),
            ids,
            messages: Vec::new(),
            status: ChatStatus::Ready,
            open_text: HashSet::new(),
            error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn status(&self) -> ChatStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn ensure_idle(&self) -> Result<(), ConversationError> {
        match self.status {
            ChatStatus::Ready | ChatStatus::Error => Ok(()),
            ChatStatus::Submitted | ChatStatus::Streaming => Err(ConversationError::Busy),
        }
    }

    fn request(&self, trigger: Trigger) -> SendMessageRequest {
        SendMessageRequest::new(self.id.clone(), self.messages.clone(), trigger)
    }

    /// Append a user message and build the request that asks for its answer.
    pub fn submit(&mut self, text: &str) -> Result<SendMessageRequest, ConversationError> {
        self.ensure_idle()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ConversationError::EmptyInput);
        }

        let message = ChatMessage::user(self.ids.generate()).with_text(text);
        self.messages.push(message);
        self.status = ChatStatus::Submitted;
        self.error = None;
        Ok(self.request(Trigger::SubmitMessage))
    }

    /// Drop the last answer and ask again for the same user message.
    pub fn regenerate(&mut self) -> Result<SendMessageRequest, ConversationError> {
        self.ensure_idle()?;
        if self.messages.last().map(|m| m.role) == Some(Role::Assistant) {
            self.messages.pop();
        }
        if self.messages.last().map(|m| m.role) != Some(Role::User) {
            return Err(ConversationError::NothingToRegenerate);
        }

        self.status = ChatStatus::Submitted;
        self.error = None;
        Ok(self.request(Trigger::RegenerateMessage))
    }

    /// Fold one stream event into the in-flight assistant message.
    pub fn apply(&mut self, event: &StreamEvent) -> Result<(), ConversationError> {
        match self.status {
            ChatStatus::Submitted => {
                let message = ChatMessage::assistant(self.ids.generate());
                self.messages.push(message);
                self.status = ChatStatus::Streaming;
            }
            ChatStatus::Streaming => {}
            ChatStatus::Ready | ChatStatus::Error => return Err(ConversationError::NotStreaming),
        }

        let message = match self.messages.last_mut() {
            Some(message) if message.role == Role::Assistant => message,
            _ => return Err(ConversationError::NotStreaming),
        };

        match event {
            StreamEvent::TextStart { id } => {
                message.parts.push(MessagePart::Text {
                    id: Some(id.clone()),
                    text: String::new(),
                });
                self.open_text.insert(id.clone());
            }
            StreamEvent::TextDelta { id, delta } => {
                if !self.open_text.contains(id) {
                    return Err(ConversationError::UnknownTextPart(id.clone()));
                }
                let part = message.parts.iter_mut().rev().find_map(|part| match part {
                    MessagePart::Text {
                        id: Some(part_id),
                        text,
                    } if part_id == id => Some(text),
                    _ => None,
                });
                match part {
                    Some(text) => text.push_str(delta),
                    None => return Err(ConversationError::UnknownTextPart(id.clone())),
                }
            }
            StreamEvent::TextEnd { id } => {
                if !self.open_text.remove(id) {
                    return Err(ConversationError::UnknownTextPart(id.clone()));
                }
            }
            StreamEvent::SourceUrl {
                source_id,
                url,
                title,
                provider_metadata,
            } => {
                message.parts.push(MessagePart::SourceUrl {
                    source_id: source_id.clone(),
                    url: url.clone(),
                    title: Some(title.clone()),
                    provider_metadata: provider_metadata.clone(),
                });
            }
        }
        Ok(())
    }

    /// The stream ended normally.
    pub fn finish(&mut self) -> Result<(), ConversationError> {
        match self.status {
            ChatStatus::Submitted | ChatStatus::Streaming => {
                if !self.open_text.is_empty() {
                    warn!(open = self.open_text.len(), "stream ended with unterminated text parts");
                    self.open_text.clear();
                }
                self.status = ChatStatus::Ready;
                Ok(())
            }
            ChatStatus::Ready | ChatStatus::Error => Err(ConversationError::NotStreaming),
        }
    }

    /// The request failed without a usable stream.
    ///
    /// Partial output is discarded and the failed user message is removed;
    /// its text is returned so it can be put back into the input box.
    pub fn fail<S: Into<String>>(&mut self, message: S) -> Option<String> {
        if self.status == ChatStatus::Streaming
            && self.messages.last().map(|m| m.role) == Some(Role::Assistant)
        {
            self.messages.pop();
        }
        self.open_text.clear();
        self.status = ChatStatus::Error;
        self.error = Some(message.into());

        match self.messages.last() {
            Some(last) if last.role == Role::User => {
                let restored = last.text();
                self.messages.pop();
                debug!("restoring failed user message to input");
                Some(restored)
            }
            _ => None,
        }
    }

    pub fn clear_error(&mut self) {
        if self.status == ChatStatus::Error {
            self.status = ChatStatus::Ready;
        }
        self.error = None;
    }

    /// Drop the whole transcript.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.open_text.clear();
        self.status = ChatStatus::Ready;
        self.error = None;
    }

    /// Consume a complete adapter response.
    ///
    /// Returns the restored input text when the turn failed, whether the
    /// failure arrived as a bare error, as an error stream, or as a stream
    /// that could not be folded into a message.
    pub fn receive(
        &mut self,
        response: &DocSearchResponse,
    ) -> Result<Option<String>, ConversationError> {
        match self.status {
            ChatStatus::Submitted | ChatStatus::Streaming => {}
            ChatStatus::Ready | ChatStatus::Error => return Err(ConversationError::NotStreaming),
        }

        match response {
            DocSearchResponse::Stream {
                events,
                failed: true,
                ..
            } => Ok(self.fail(error_text(events))),
            DocSearchResponse::Stream { events, .. } => {
                let folded = events
                    .iter()
                    .try_for_each(|event| self.apply(event))
                    .and_then(|_| self.finish());
                match folded {
                    Ok(()) => Ok(None),
                    Err(err) => {
                        warn!(error = %err, "discarding a stream that could not be applied");
                        Ok(self.fail(err.to_string()))
                    }
                }
            }
            DocSearchResponse::Error { message, .. } => Ok(self.fail(message.clone())),
        }
    }
}

// The sentence carried by the text deltas of an error stream
fn error_text(events: &[StreamEvent]) -> String {
    events
        .iter()
        .filter_map(|event| match event {
            StreamEvent::TextDelta { delta, .. } => Some(delta.as_str()),
            _ => None,
        })
        .collect()
}
