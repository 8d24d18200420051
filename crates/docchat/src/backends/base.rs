use async_trait::async_trait;

use crate::errors::DocSearchResult;
use crate::models::search::SearchResult;

/// A documentation search service the adapter can query
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Run one search for an already validated, trimmed query.
    ///
    /// Implementations must issue at most one upstream call and must not retry.
    async fn search(&self, query: &str) -> DocSearchResult<Vec<SearchResult>>;
}
