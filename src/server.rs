//! HTTP surface: the two-tab page plus JSON endpoints for ingest, chat,
//! and feedback.
//!
//! Errors never crash a session; the handler puts the error string where
//! the result would have gone and the page renders it.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use rig::embeddings::EmbeddingModel;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::generator::CompletionProvider;
use crate::pipeline::RagPipeline;
use crate::types::RagError;

/// Shared application state.
pub struct AppState<E, G>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
    G: CompletionProvider,
{
    pub pipeline: RagPipeline<E, G>,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    /// Success line or the propagated error string; this field is the
    /// panel's status output either way.
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub liked: bool,
    pub message: String,
}

/// Builds the application router.
pub fn router<E, G>(state: Arc<AppState<E, G>>) -> Router
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
    G: CompletionProvider + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/scrape", post(scrape::<E, G>))
        .route("/chat", post(chat::<E, G>))
        .route("/feedback", post(feedback))
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

async fn health() -> &'static str {
    "ok"
}

async fn scrape<E, G>(
    State(state): State<Arc<AppState<E, G>>>,
    Json(request): Json<ScrapeRequest>,
) -> Json<ScrapeResponse>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
    G: CompletionProvider + 'static,
{
    let outcome = match Url::parse(request.url.trim()) {
        Ok(url) => state.pipeline.ingest(&url).await,
        Err(err) => Err(RagError::Navigation {
            url: request.url.clone(),
            reason: err.to_string(),
        }),
    };

    let status = match outcome {
        Ok(report) => report.status_line(),
        Err(err) => {
            tracing::warn!(url = %request.url, error = %err, "ingest failed");
            err.to_string()
        }
    };
    Json(ScrapeResponse { status })
}

async fn chat<E, G>(
    State(state): State<Arc<AppState<E, G>>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse>
where
    E: EmbeddingModel + Clone + Send + Sync + 'static,
    G: CompletionProvider + 'static,
{
    let reply = match state.pipeline.answer(&request.message).await {
        Ok(reply) => reply.answer,
        Err(err) => {
            tracing::warn!(error = %err, "chat failed");
            err.to_string()
        }
    };
    Json(ChatResponse { reply })
}

/// Fire-and-forget observability hook; no pipeline effect.
async fn feedback(Json(request): Json<FeedbackRequest>) -> StatusCode {
    if request.liked {
        tracing::info!(message = %request.message, "response upvoted");
    } else {
        tracing::info!(message = %request.message, "response downvoted");
    }
    StatusCode::NO_CONTENT
}
