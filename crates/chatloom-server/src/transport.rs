use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use chatloom_engine::EventStream;
use futures::StreamExt;
use std::convert::Infallible;
use tracing::warn;

/// Pump a turn's events into an SSE body, one `data: {json}` frame per
/// event.
///
/// Production runs in a spawned task feeding a bounded channel; when the
/// client disconnects the receiver drops, the next send fails, and the
/// event stream is dropped at its current suspension point. No further
/// events are produced.
pub fn sse_body(mut events: EventStream) -> Body {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<Bytes>(64);

    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize SSE event");
                    return;
                }
            };
            if tx.send(Bytes::from(format!("data: {json}\n\n"))).await.is_err() {
                return;
            }
        }
    });

    Body::from_stream(async_stream::stream! {
        while let Some(chunk) = rx.recv().await {
            yield Ok::<Bytes, Infallible>(chunk);
        }
    })
}

/// Wrap an SSE body with the standard event-stream headers.
pub fn sse_response(body: Body) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    (headers, body).into_response()
}
