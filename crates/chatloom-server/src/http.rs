use crate::dispatch::{self, Outcome};
use crate::transport::{sse_body, sse_response};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chatloom_engine::TurnEngine;
use chatloom_store::{RequestContext, Store, StoreError};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::debug;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub engine: Arc<TurnEngine>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, msg) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };
        let body = Json(serde_json::json!({ "error": msg }));
        (code, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        // Local dev server; the UI runs on another origin.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Single protocol endpoint. The request's `type` field selects the
/// operation; turn requests answer with SSE, everything else with JSON.
async fn chat(State(st): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    debug!(bytes = body.len(), "chat request");
    let request =
        serde_json::from_slice(&body).map_err(|e| ApiError::Validation(e.to_string()))?;

    let context = RequestContext::default();
    match dispatch::process(&st, request, &context).await? {
        Outcome::Stream(events) => Ok(sse_response(sse_body(events))),
        Outcome::Json(value) => Ok(Json(value).into_response()),
    }
}
