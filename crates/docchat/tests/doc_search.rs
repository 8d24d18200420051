use std::sync::Arc;

use docchat::backends::http::HttpSearchBackend;
use docchat::conversation::{ChatStatus, Conversation};
use docchat::doc_search::{summary_message, ERROR_PREFIX};
use docchat::ids::SequentialIdGenerator;
use docchat::models::message::{snippet_metadata, ChatMessage, MessagePart};
use docchat::models::request::{SendMessageRequest, Trigger};
use docchat::stream::StreamEvent;
use docchat::{doc_search, DocSearch, DocSearchResponse, ErrorPolicy};
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn search_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/search", server.uri())).unwrap()
}

fn ask(text: &str) -> SendMessageRequest {
    SendMessageRequest::new(
        "chat-1",
        vec![ChatMessage::user("m1").with_text(text)],
        Trigger::SubmitMessage,
    )
}

#[tokio::test]
async fn test_single_result_example() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("query", "How do I connect?"))
        .and(header("Authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"search": [
                {"id": "1", "uri": "https://docs/x", "title": "Connecting", "snippet": "Use the driver..."}
            ]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let response = doc_search(&ask("How do I connect?"), search_url(&server), "secret").await;

    assert_eq!(response.status(), 200);
    let events = response.events();
    assert_eq!(events.len(), 4);
    match (&events[0], &events[1], &events[2]) {
        (
            StreamEvent::TextStart { id: start },
            StreamEvent::TextDelta { id: delta_id, delta },
            StreamEvent::TextEnd { id: end },
        ) => {
            assert_eq!(start, delta_id);
            assert_eq!(start, end);
            assert_eq!(delta, "I found 1 relevant result(s) for your query:\n\n");
        }
        other => panic!("Expected a summary text unit, got {:?}", other),
    }
    assert_eq!(
        events[3],
        StreamEvent::SourceUrl {
            source_id: "1".into(),
            url: "https://docs/x".into(),
            title: "Connecting".into(),
            provider_metadata: Some(snippet_metadata("Use the driver...")),
        }
    );
    server.verify().await;
}

#[tokio::test]
async fn test_missing_query_never_reaches_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = SendMessageRequest::new(
        "chat-1",
        vec![
            ChatMessage::user("m1").with_text("question"),
            ChatMessage::assistant("m2").with_text("answer"),
        ],
        Trigger::RegenerateMessage,
    );
    let response = doc_search(&request, search_url(&server), "secret").await;

    assert_eq!(response.events().len(), 3);
    server.verify().await;
}

#[tokio::test]
async fn test_upstream_error_under_status_policy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpSearchBackend::new(search_url(&server), "wrong");
    let response = DocSearch::new(Arc::new(backend))
        .with_error_policy(ErrorPolicy::Status)
        .respond(&ask("anything"))
        .await;

    assert_eq!(
        response,
        DocSearchResponse::Error {
            status: 502,
            message: format!("{}Search API failed: 401 Unauthorized", ERROR_PREFIX),
        }
    );
    server.verify().await;
}

#[tokio::test]
async fn test_conversation_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"search": [
                {"id": "a", "url": "https://docs/a", "title": "A", "snippet": "first"},
                {"id": "b", "url": "https://docs/b", "title": "B", "snippet": "second"}
            ]}
        })))
        .mount(&server)
        .await;

    let ids = Arc::new(SequentialIdGenerator::new("x"));
    let doc_search = DocSearch::new(Arc::new(HttpSearchBackend::new(search_url(&server), "k")))
        .with_ids(ids.clone());
    let mut chat = Conversation::new(ids);

    let request = chat.submit("sync tables").unwrap();
    let response = doc_search.respond(&request).await;
    assert_eq!(chat.receive(&response).unwrap(), None);

    assert_eq!(chat.status(), ChatStatus::Ready);
    let answer = &chat.messages()[1];
    assert_eq!(answer.parts[0].as_text(), Some(summary_message(2).as_str()));
    let sources: Vec<&str> = answer
        .parts
        .iter()
        .filter_map(|part| match part {
            MessagePart::SourceUrl { source_id, .. } => Some(source_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(sources, vec!["a", "b"]);
}
