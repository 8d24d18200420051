use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, trace};
use url::Url;

use super::base::SearchBackend;
use crate::errors::{DocSearchError, DocSearchResult};
use crate::models::search::{SearchResponse, SearchResult};

pub const QUERY_PARAM: &str = "query";

/// Search backend reached with `GET <search_url>?query=...` and a bearer token.
///
/// No timeout is configured on the client; callers that need a deadline wrap
/// the call themselves.
#[derive(Debug, Clone)]
pub struct HttpSearchBackend {
    client: Client,
    search_url: Url,
    api_key: String,
}

impl HttpSearchBackend {
    pub fn new(search_url: Url, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            search_url,
            api_key: api_key.into(),
        }
    }

    /// Reuse an existing connection pool.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn search_url(&self) -> &Url {
        &self.search_url
    }

    /// The endpoint with the `query` parameter set, other parameters kept.
    pub fn request_url(&self, query: &str) -> Url {
        let mut url = self.search_url.clone();
        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != QUERY_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(retained)
            .append_pair(QUERY_PARAM, query);
        url
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn search(&self, query: &str) -> DocSearchResult<Vec<SearchResult>> {
        let url = self.request_url(query);
        debug!(url = %self.search_url, "Sending search request");

        let response = self
            .client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Network error during search request");
                DocSearchError::Network(e)
            })?;

        let status = response.status();
        debug!(status = %status, "Received search response");

        if !status.is_success() {
            error!(status = status.as_u16(), "Search API returned an error status");
            return Err(DocSearchError::UpstreamHttp {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body = response.text().await.map_err(|e| {
            error!(error = %e, "Failed to read search response body");
            DocSearchError::Network(e)
        })?;
        trace!(body = %body, "Search response body");

        let parsed: SearchResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Failed to parse search response");
            DocSearchError::MalformedResponse(e.to_string())
        })?;

        let results = parsed.into_results();
        debug!(result_count = results.len(), "Search completed");
        Ok(results)
    }
}
