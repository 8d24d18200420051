use std::collections::HashMap;

use docchat::models::search::{SearchResponse, SearchResult};
use tracing_subscriber::EnvFilter;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

const API_KEY_ENV: &str = "STUB_SEARCH_API_KEY";

fn canned_results() -> Vec<SearchResult> {
    [
        (
            "1",
            "https://docs.example.com/getting-started/connect",
            "Connecting to the database",
            "Use the driver's connect() call with your connection string...",
        ),
        (
            "2",
            "https://docs.example.com/guides/pooling",
            "Connection pooling",
            "Reuse connections across requests by configuring the pool size.",
        ),
        (
            "3",
            "docs/reference/auth.md",
            "Authentication",
            "API keys are passed as a bearer token in the Authorization header.",
        ),
        (
            "4",
            "docs/reference/errors.md",
            "Error codes",
            "",
        ),
    ]
    .into_iter()
    .map(|(id, uri, title, snippet)| SearchResult {
        id: id.to_string(),
        uri: uri.to_string(),
        title: title.to_string(),
        snippet: snippet.to_string(),
    })
    .collect()
}

// A result matches when any query term of three or more letters appears in it
fn matches(result: &SearchResult, query: &str) -> bool {
    let haystack = format!("{} {}", result.title, result.snippet).to_lowercase();
    query
        .split_whitespace()
        .map(|term| term.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|term| term.len() >= 3)
        .any(|term| haystack.contains(term))
}

fn search(
    params: HashMap<String, String>,
    authorization: Option<String>,
    api_key: Option<String>,
) -> Response {
    if let Some(key) = api_key {
        if authorization.as_deref() != Some(format!("Bearer {}", key).as_str()) {
            tracing::warn!("rejected search without a valid bearer token");
            return warp::reply::with_status("Unauthorized", StatusCode::UNAUTHORIZED)
                .into_response();
        }
    }

    let query = params
        .get("query")
        .map(|q| q.trim().to_lowercase())
        .unwrap_or_default();
    let results: Vec<SearchResult> = canned_results()
        .into_iter()
        .filter(|result| query.is_empty() || matches(result, &query))
        .collect();

    tracing::info!(query = %query, results = results.len(), "search");
    warp::reply::json(&SearchResponse::new(results)).into_response()
}

fn routes(
    api_key: Option<String>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    warp::path!("search")
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(warp::header::optional::<String>("authorization"))
        .and(warp::any().map(move || api_key.clone()))
        .map(search)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let api_key = std::env::var(API_KEY_ENV).ok();
    if api_key.is_none() {
        tracing::info!("{} not set, accepting any bearer token", API_KEY_ENV);
    }

    println!("Stub search running at http://127.0.0.1:3001/search");
    warp::serve(routes(api_key)).run(([127, 0, 0, 1], 3001)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    type Response = warp::http::Response<warp::hyper::body::Bytes>;

    async fn get(path: &str, token: Option<&str>, api_key: Option<&str>) -> Response {
        let mut request = warp::test::request().method("GET").path(path);
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {}", token));
        }
        request.reply(&routes(api_key.map(str::to_string))).await
    }

    async fn results(response: Response) -> Vec<SearchResult> {
        let body = response.into_body();
        serde_json::from_slice::<SearchResponse>(&body)
            .unwrap()
            .into_results()
    }

    #[tokio::test]
    async fn test_filters_by_query() {
        let response = get("/search?query=pooling%20size", Some("k"), Some("k")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let results = results(response).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "2");
    }

    #[tokio::test]
    async fn test_empty_query_returns_everything() {
        let response = get("/search?query=", None, None).await;
        assert_eq!(results(response).await.len(), canned_results().len());
    }

    #[tokio::test]
    async fn test_unmatched_query_returns_no_results() {
        let response = get("/search?query=kubernetes", None, None).await;
        assert!(results(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_requires_matching_token() {
        let response = get("/search?query=connect", Some("wrong"), Some("k")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = get("/search?query=connect", None, Some("k")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
