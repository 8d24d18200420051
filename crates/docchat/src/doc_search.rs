use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use url::Url;

use crate::backends::base::SearchBackend;
use crate::backends::http::HttpSearchBackend;
use crate::errors::{DocSearchError, DocSearchResult};
use crate::ids::{IdGenerator, NanoIdGenerator};
use crate::models::request::SendMessageRequest;
use crate::models::search::SearchResult;
use crate::query::extract_query;
use crate::stream::{StreamEvent, StreamWriter};

pub const NO_RESULTS_MESSAGE: &str = "I couldn't find any relevant information for your query.";
pub const ERROR_PREFIX: &str = "Sorry, there was an error processing your request: ";

pub fn summary_message(count: usize) -> String {
    format!("I found {} relevant result(s) for your query:\n\n", count)
}

pub fn error_message(err: &DocSearchError) -> String {
    format!("{}{}", ERROR_PREFIX, err)
}

/// Progress of a single invocation.
///
/// `Idle -> Validating -> (Fetching -> Emitting -> Done) | Failed`. `Done` and
/// `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    Fetching,
    Emitting,
    Done,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Failed)
    }

    fn can_advance_to(self, next: Phase) -> bool {
        use Phase::*;
        match (self, next) {
            (Idle, Validating) => true,
            (Validating, Fetching) => true,
            (Fetching, Emitting) => true,
            (Emitting, Done) => true,
            (Validating | Fetching | Emitting, Failed) => true,
            _ => false,
        }
    }
}

#[derive(Debug)]
pub struct PhaseTracker {
    phase: Phase,
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self { phase: Phase::Idle }
    }
}

impl PhaseTracker {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn advance(&mut self, next: Phase) -> DocSearchResult<()> {
        if !self.phase.can_advance_to(next) {
            return Err(DocSearchError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        debug!(from = ?self.phase, to = ?next, "doc search phase");
        self.phase = next;
        Ok(())
    }
}

/// How a failed turn is reported to the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// A normal 200 stream holding one error text unit.
    #[default]
    Stream,
    /// A bare non-200 response without a stream.
    Status,
}

impl FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "stream" => Ok(ErrorPolicy::Stream),
            "status" => Ok(ErrorPolicy::Status),
            other => Err(format!("unknown error policy: {}", other)),
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorPolicy::Stream => write!(f, "stream"),
            ErrorPolicy::Status => write!(f, "status"),
        }
    }
}

/// The complete answer to one chat turn
#[derive(Debug, Clone, PartialEq)]
pub enum DocSearchResponse {
    /// Events to stream back, in order.
    Stream {
        status: u16,
        events: Vec<StreamEvent>,
        /// The events carry an error sentence rather than search results.
        failed: bool,
    },
    /// A bare error response with a plain text body.
    Error { status: u16, message: String },
}

impl DocSearchResponse {
    pub fn status(&self) -> u16 {
        match self {
            DocSearchResponse::Stream { status, .. } | DocSearchResponse::Error { status, .. } => {
                *status
            }
        }
    }

    /// True for every failed turn, whichever policy shaped the response.
    pub fn is_error(&self) -> bool {
        match self {
            DocSearchResponse::Stream { failed, .. } => *failed,
            DocSearchResponse::Error { .. } => true,
        }
    }

    pub fn events(&self) -> &[StreamEvent] {
        match self {
            DocSearchResponse::Stream { events, .. } => events,
            DocSearchResponse::Error { .. } => &[],
        }
    }
}

fn error_status(err: &DocSearchError) -> u16 {
    match err {
        DocSearchError::MissingQuery | DocSearchError::InvalidRequest(_) => 400,
        DocSearchError::UpstreamHttp { .. }
        | DocSearchError::Network(_)
        | DocSearchError::MalformedResponse(_) => 502,
        _ => 500,
    }
}

/// Answers chat turns by searching the documentation backend.
///
/// Holds no per-conversation state, so one instance can serve concurrent
/// conversations.
#[derive(Clone)]
pub struct DocSearch {
    backend: Arc<dyn SearchBackend>,
    ids: Arc<dyn IdGenerator>,
    error_policy: ErrorPolicy,
}

impl DocSearch {
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            ids: Arc::new(NanoIdGenerator),
            error_policy: ErrorPolicy::default(),
        }
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    /// Answer one request. Never fails: errors become a single error signal.
    pub async fn respond(&self, request: &SendMessageRequest) -> DocSearchResponse {
        let mut tracker = PhaseTracker::default();
        match self.run(request, &mut tracker).await {
            Ok(events) => DocSearchResponse::Stream {
                status: 200,
                events,
                failed: false,
            },
            Err(err) => {
                error!(request_id = %request.id, phase = ?tracker.phase(), error = %err, "doc search failed");
                // A failure can only be observed before Done.
                let _ = tracker.advance(Phase::Failed);
                self.failure(&err)
            }
        }
    }

    async fn run(
        &self,
        request: &SendMessageRequest,
        tracker: &mut PhaseTracker,
    ) -> DocSearchResult<Vec<StreamEvent>> {
        tracker.advance(Phase::Validating)?;
        let query = extract_query(&request.messages)?;

        tracker.advance(Phase::Fetching)?;
        info!(request_id = %request.id, trigger = ?request.trigger, "searching documentation");
        let results = self.backend.search(&query).await?;

        tracker.advance(Phase::Emitting)?;
        let events = self.render(&results);

        tracker.advance(Phase::Done)?;
        debug!(
            request_id = %request.id,
            result_count = results.len(),
            event_count = events.len(),
            "doc search complete"
        );
        Ok(events)
    }

    fn render(&self, results: &[SearchResult]) -> Vec<StreamEvent> {
        let mut writer = StreamWriter::new(self.ids.as_ref());
        if results.is_empty() {
            writer.write_text(NO_RESULTS_MESSAGE);
        } else {
            writer.write_text(summary_message(results.len()));
            for result in results {
                writer.write_source(result);
            }
        }
        writer.finish()
    }

    /// Shape a failure according to the error policy.
    pub fn failure(&self, err: &DocSearchError) -> DocSearchResponse {
        let message = error_message(err);
        match self.error_policy {
            ErrorPolicy::Stream => {
                let mut writer = StreamWriter::new(self.ids.as_ref());
                writer.write_text(message);
                DocSearchResponse::Stream {
                    status: 200,
                    events: writer.finish(),
                    failed: true,
                }
            }
            ErrorPolicy::Status => DocSearchResponse::Error {
                status: error_status(err),
                message,
            },
        }
    }
}

/// One-shot entry point: search `search_url` with `api_key` for `request`.
pub async fn doc_search(
    request: &SendMessageRequest,
    search_url: Url,
    api_key: &str,
) -> DocSearchResponse {
    DocSearch::new(Arc::new(HttpSearchBackend::new(search_url, api_key)))
        .respond(request)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::{MockBackend, MockReply};
    use crate::ids::SequentialIdGenerator;
    use crate::models::message::{snippet_metadata, ChatMessage};
    use crate::models::request::Trigger;

    fn result(id: &str, title: &str) -> SearchResult {
        SearchResult {
            id: id.to_string(),
            uri: format!("https://docs/{}", id),
            title: title.to_string(),
            snippet: format!("about {}", title),
        }
    }

    fn request(messages: Vec<ChatMessage>) -> SendMessageRequest {
        SendMessageRequest::new("chat-1", messages, Trigger::SubmitMessage)
    }

    fn adapter(reply: MockReply) -> (Arc<MockBackend>, DocSearch) {
        let backend = Arc::new(MockBackend::new(reply));
        let doc_search = DocSearch::new(backend.clone())
            .with_ids(Arc::new(SequentialIdGenerator::new("id")));
        (backend, doc_search)
    }

    #[tokio::test]
    async fn test_results_stream_summary_then_sources_in_order() {
        let (backend, doc_search) = adapter(MockReply::Results(vec![
            result("b", "Second"),
            result("a", "First"),
        ]));
        let response = doc_search
            .respond(&request(vec![ChatMessage::user("m1").with_text(" sync? ")]))
            .await;

        assert_eq!(backend.queries(), vec!["sync?".to_string()]);
        assert_eq!(response.status(), 200);
        assert!(!response.is_error());
        assert_eq!(
            response.events(),
            [
                StreamEvent::TextStart { id: "id-0".into() },
                StreamEvent::TextDelta {
                    id: "id-0".into(),
                    delta: summary_message(2)
                },
                StreamEvent::TextEnd { id: "id-0".into() },
                StreamEvent::SourceUrl {
                    source_id: "b".into(),
                    url: "https://docs/b".into(),
                    title: "Second".into(),
                    provider_metadata: Some(snippet_metadata("about Second")),
                },
                StreamEvent::SourceUrl {
                    source_id: "a".into(),
                    url: "https://docs/a".into(),
                    title: "First".into(),
                    provider_metadata: Some(snippet_metadata("about First")),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_no_results_emits_single_fallback_unit() {
        let (_, doc_search) = adapter(MockReply::Results(vec![]));
        let response = doc_search
            .respond(&request(vec![ChatMessage::user("m1").with_text("nothing")]))
            .await;

        let events = response.events();
        assert_eq!(events.len(), 3);
        assert!(!events.iter().any(StreamEvent::is_source));
        assert_eq!(
            events[1],
            StreamEvent::TextDelta {
                id: "id-0".into(),
                delta: NO_RESULTS_MESSAGE.into()
            }
        );
    }

    #[tokio::test]
    async fn test_missing_query_fails_before_search() {
        let (backend, doc_search) = adapter(MockReply::Results(vec![result("a", "A")]));
        let response = doc_search
            .respond(&request(vec![
                ChatMessage::user("m1").with_text("question"),
                ChatMessage::assistant("m2").with_text("answer"),
            ]))
            .await;

        assert!(backend.queries().is_empty());
        assert_eq!(
            response.events()[1],
            StreamEvent::TextDelta {
                id: "id-0".into(),
                delta: format!("{}No query found in user message", ERROR_PREFIX),
            }
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_streams_one_error_unit() {
        let (backend, doc_search) = adapter(MockReply::Status(500));
        let response = doc_search
            .respond(&request(vec![ChatMessage::user("m1").with_text("q")]))
            .await;

        assert_eq!(backend.queries().len(), 1);
        assert_eq!(response.status(), 200);
        assert!(response.is_error());
        let events = response.events();
        assert_eq!(events.len(), 3);
        assert!(!events.iter().any(StreamEvent::is_source));
        match &events[1] {
            StreamEvent::TextDelta { delta, .. } => {
                assert!(delta.starts_with(ERROR_PREFIX));
                assert!(delta.contains("Search API failed: 500"));
            }
            other => panic!("Expected text delta, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_policy_returns_bare_error() {
        let (_, doc_search) = adapter(MockReply::Malformed);
        let doc_search = doc_search.with_error_policy(ErrorPolicy::Status);
        let response = doc_search
            .respond(&request(vec![ChatMessage::user("m1").with_text("q")]))
            .await;

        assert_eq!(response.status(), 502);
        assert!(response.is_error());
        assert!(response.events().is_empty());

        let response = doc_search.respond(&request(vec![])).await;
        assert_eq!(
            response,
            DocSearchResponse::Error {
                status: 400,
                message: format!("{}No query found in user message", ERROR_PREFIX),
            }
        );
    }

    #[test]
    fn test_invalid_request_follows_policy() {
        let (_, doc_search) = adapter(MockReply::Results(vec![]));
        let err = DocSearchError::InvalidRequest("missing field `messages`".into());

        let response = doc_search.failure(&err);
        assert_eq!(response.status(), 200);
        assert!(response.is_error());
        assert_eq!(response.events().len(), 3);

        let response = doc_search.with_error_policy(ErrorPolicy::Status).failure(&err);
        assert_eq!(
            response,
            DocSearchResponse::Error {
                status: 400,
                message: format!("{}Invalid chat request: missing field `messages`", ERROR_PREFIX),
            }
        );
    }

    #[test]
    fn test_terminal_phases_do_not_transition() {
        let mut tracker = PhaseTracker::default();
        tracker.advance(Phase::Validating).unwrap();
        tracker.advance(Phase::Failed).unwrap();
        assert!(tracker.phase().is_terminal());
        assert!(matches!(
            tracker.advance(Phase::Fetching),
            Err(DocSearchError::InvalidTransition {
                from: Phase::Failed,
                to: Phase::Fetching
            })
        ));

        let mut tracker = PhaseTracker::default();
        assert!(tracker.advance(Phase::Fetching).is_err());
        for phase in [Phase::Validating, Phase::Fetching, Phase::Emitting, Phase::Done] {
            tracker.advance(phase).unwrap();
        }
        assert!(tracker.advance(Phase::Failed).is_err());
    }

    #[test]
    fn test_error_policy_parsing() {
        assert_eq!("Stream".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::Stream);
        assert_eq!("status".parse::<ErrorPolicy>().unwrap(), ErrorPolicy::Status);
        assert!("bogus".parse::<ErrorPolicy>().is_err());
    }
}
