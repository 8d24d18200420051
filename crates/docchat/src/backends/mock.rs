use async_trait::async_trait;
use std::sync::Mutex;

use super::base::SearchBackend;
use crate::errors::{DocSearchError, DocSearchResult};
use crate::models::search::SearchResult;

/// Canned behaviour for [`MockBackend`]
#[derive(Debug, Clone)]
pub enum MockReply {
    Results(Vec<SearchResult>),
    Status(u16),
    Malformed,
}

/// A backend that answers every query the same way and records what it was asked
pub struct MockBackend {
    reply: MockReply,
    queries: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchBackend for MockBackend {
    async fn search(&self, query: &str) -> DocSearchResult<Vec<SearchResult>> {
        self.queries.lock().unwrap().push(query.to_string());
        match &self.reply {
            MockReply::Results(results) => Ok(results.clone()),
            MockReply::Status(status) => Err(DocSearchError::UpstreamHttp {
                status: *status,
                reason: "Mock failure".to_string(),
            }),
            MockReply::Malformed => Err(DocSearchError::MalformedResponse(
                "missing field `data`".to_string(),
            )),
        }
    }
}
