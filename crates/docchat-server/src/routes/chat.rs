use crate::state::AppState;
use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use docchat::models::request::SendMessageRequest;
use docchat::stream::{done_frame, StreamEvent, UI_MESSAGE_STREAM_HEADER, UI_MESSAGE_STREAM_VERSION};
use docchat::errors::DocSearchError;
use docchat::DocSearchResponse;
use futures::Stream;
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

// Server-sent event response speaking the UI message stream protocol
pub struct SseResponse {
    rx: ReceiverStream<String>,
    status: StatusCode,
}

impl SseResponse {
    fn new(rx: ReceiverStream<String>, status: StatusCode) -> Self {
        Self { rx, status }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        let status = self.status;
        let body = Body::from_stream(self);

        (
            status,
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
                (header::CONNECTION, "keep-alive"),
                (
                    HeaderName::from_static(UI_MESSAGE_STREAM_HEADER),
                    UI_MESSAGE_STREAM_VERSION,
                ),
            ],
            body,
        )
            .into_response()
    }
}

// Push the already complete event sequence through the channel, then close it
fn stream_events(events: Vec<StreamEvent>, tx: mpsc::Sender<String>) {
    tokio::spawn(async move {
        for event in events {
            if let Err(e) = tx.send(event.to_sse()).await {
                tracing::warn!("Client went away before the stream finished: {}", e);
                return;
            }
        }
        let _ = tx.send(done_frame()).await;
    });
}

async fn handler(
    State(state): State<AppState>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Response {
    let response = match payload {
        Ok(Json(request)) => {
            tracing::debug!(
                request_id = %request.id,
                messages = request.messages.len(),
                "chat request"
            );
            state.doc_search.respond(&request).await
        }
        Err(rejection) => {
            tracing::warn!(status = %rejection.status(), "rejected chat request: {}", rejection.body_text());
            state
                .doc_search
                .failure(&DocSearchError::InvalidRequest(rejection.body_text()))
        }
    };

    match response {
        DocSearchResponse::Stream { status, events, .. } => {
            let (tx, rx) = mpsc::channel(100);
            stream_events(events, tx);
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
            SseResponse::new(ReceiverStream::new(rx), status).into_response()
        }
        DocSearchResponse::Error { status, message } => {
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, message).into_response()
        }
    }
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(handler))
        .with_state(state)
}
