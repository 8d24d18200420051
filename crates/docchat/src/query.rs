use crate::errors::{DocSearchError, DocSearchResult};
use crate::models::message::ChatMessage;
use crate::models::role::Role;

/// Derive the search query from the last message of a transcript.
///
/// Only a trailing user message yields a query: its text parts are joined
/// with a space and trimmed. Anything else, including an empty transcript,
/// is a [`DocSearchError::MissingQuery`].
pub fn extract_query(messages: &[ChatMessage]) -> DocSearchResult<String> {
    let query = match messages.last() {
        Some(message) if message.role == Role::User => message.text(),
        _ => String::new(),
    };

    let query = query.trim();
    if query.is_empty() {
        return Err(DocSearchError::MissingQuery);
    }
    Ok(query.to_string())
}
