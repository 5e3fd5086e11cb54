//! HTTP endpoint turning one edit into one phrase.

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storyloom_interface::GenerationDriver;
use storyloom_narrative::PhraseSynthesizer;

/// Body of `POST /get-word`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseRequest {
    /// Story text so far; only its tail is used
    #[serde(default)]
    pub story_so_far: String,
    /// Raw edit text to draw vocabulary from
    pub edit_text: String,
}

/// Successful response; empty when the edit had no usable vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraseResponse {
    /// The synthesized phrase
    pub selected_word: String,
}

/// Failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Terse description
    pub error: String,
}

/// Creates the phrase router (`POST /get-word`).
pub fn phrase_router<D>(synthesizer: Arc<PhraseSynthesizer<D>>) -> Router
where
    D: GenerationDriver + 'static,
{
    Router::new()
        .route("/get-word", post(get_word::<D>))
        .with_state(synthesizer)
}

async fn get_word<D>(
    State(synthesizer): State<Arc<PhraseSynthesizer<D>>>,
    request: Result<Json<PhraseRequest>, JsonRejection>,
) -> Response
where
    D: GenerationDriver + 'static,
{
    let request = match request {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Malformed phrase request");
            return (
                rejection.status(),
                Json(ErrorBody {
                    error: rejection.body_text(),
                }),
            )
                .into_response();
        }
    };

    match synthesizer
        .compose(&request.story_so_far, &request.edit_text)
        .await
    {
        Ok(phrase) => (
            StatusCode::OK,
            Json(PhraseResponse {
                selected_word: phrase.unwrap_or_default(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Phrase request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Failed to generate phrase".to_string(),
                }),
            )
                .into_response()
        }
    }
}
