use thiserror::Error;

use crate::doc_search::Phase;

/// Failures raised while answering a single chat turn.
///
/// Every variant is collapsed into one user-facing sentence at the
/// [`DocSearch`](crate::doc_search::DocSearch) boundary.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DocSearchError {
    #[error("No query found in user message")]
    MissingQuery,

    #[error("Invalid chat request: {0}")]
    InvalidRequest(String),

    #[error("Search API failed: {status} {reason}")]
    UpstreamHttp { status: u16, reason: String },

    #[error("Search request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed search response: {0}")]
    MalformedResponse(String),

    #[error("Invalid search phase transition: {from:?} -> {to:?}")]
    InvalidTransition { from: Phase, to: Phase },
}

pub type DocSearchResult<T> = Result<T, DocSearchError>;

/// Misuse of the client-side transcript.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    #[error("Message is empty")]
    EmptyInput,

    #[error("A request is already in flight")]
    Busy,

    #[error("There is no user message to regenerate a reply for")]
    NothingToRegenerate,

    #[error("No streaming response is in progress")]
    NotStreaming,

    #[error("Unknown text part: {0}")]
    UnknownTextPart(String),
}
