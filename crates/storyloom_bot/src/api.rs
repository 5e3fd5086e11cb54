//! HTTP API for reading and resetting the story.

use crate::{PipelineMessage, StoryPipeline, StorySnapshot};
use async_trait::async_trait;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use storyloom_interface::{ChangeFeed, GenerationDriver, KeyValueStore};
use tokio::sync::mpsc;

/// Read access to a pipeline's story, independent of its backends.
#[async_trait]
pub trait StoryView: Send + Sync {
    /// Current persisted story.
    async fn story(&self) -> StorySnapshot;
}

#[async_trait]
impl<F, D, S> StoryView for StoryPipeline<F, D, S>
where
    F: ChangeFeed,
    D: GenerationDriver,
    S: KeyValueStore,
{
    async fn story(&self) -> StorySnapshot {
        self.snapshot().await
    }
}

/// API state: the story and the bot's control channel.
#[derive(Clone)]
pub struct ApiState {
    story: Arc<dyn StoryView>,
    commands: mpsc::Sender<PipelineMessage>,
}

impl ApiState {
    /// Creates new API state.
    pub fn new(story: Arc<dyn StoryView>, commands: mpsc::Sender<PipelineMessage>) -> Self {
        Self { story, commands }
    }
}

/// Creates the story API router.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/story", get(get_story))
        .route("/reset", post(reset_story))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn get_story(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.story.story().await;
    let lines = snapshot.lines();
    (
        StatusCode::OK,
        Json(json!({
            "phrases": snapshot.phrases,
            "wordCount": snapshot.word_count,
            "cursor": snapshot.cursor,
            "lines": lines,
        })),
    )
}

/// Reset, then poll right away.
async fn reset_story(State(state): State<ApiState>) -> impl IntoResponse {
    let sent = state.commands.send(PipelineMessage::Reset).await.is_ok()
        && state.commands.send(PipelineMessage::RunCycle).await.is_ok();
    if sent {
        (StatusCode::ACCEPTED, Json(json!({"status": "reset"})))
    } else {
        tracing::warn!("Reset requested but the story bot is not running");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "Story bot is not running"})),
        )
    }
}
