//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Body rejections (bad JSON, wrong content type) become 400s like any other
//! client-input error.

use std::sync::Arc;
use axum::{
  extract::{rejection::JsonRejection, State},
  response::IntoResponse,
  Json,
};
use tracing::{instrument, warn};

use crate::error::ApiError;
use crate::logic::{chat_explanation, generate_quiz, random_topic};
use crate::protocol::*;
use crate::state::AppState;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
  payload.map(|Json(v)| v).map_err(|rejection| {
    warn!(target: "quizgen", error = %rejection.body_text(), "Rejected request body");
    ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut {
    ok: true,
    model_configured: state.gateway.is_some(),
    model: state.model_name().unwrap_or_default().to_string(),
  })
}

#[instrument(level = "info", skip(state, payload))]
pub async fn http_generate_quiz(
  State(state): State<Arc<AppState>>,
  payload: Result<Json<GenerateQuizIn>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let input = body(payload)?;
  let questions = generate_quiz(&state, &input).await?;
  Ok(Json(questions))
}

#[instrument(level = "info", skip(state, payload))]
pub async fn http_get_random_topic(
  State(state): State<Arc<AppState>>,
  payload: Result<Json<RandomTopicIn>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let input = body(payload)?;
  let suggestion = random_topic(&state, &input).await?;
  Ok(Json(RandomTopicOut { topic: suggestion.topic }))
}

#[instrument(level = "info", skip(state, payload))]
pub async fn http_chat_explanation(
  State(state): State<Arc<AppState>>,
  payload: Result<Json<ChatExplanationIn>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let input = body(payload)?;
  let ai_message = chat_explanation(&state, &input).await?;
  Ok(Json(ChatExplanationOut { ai_message }))
}
