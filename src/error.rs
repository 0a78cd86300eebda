//! Error taxonomy for the HTTP handlers. Every failure ends up here and is
//! rendered as a JSON body `{"error": message, ...diagnostics}`.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::extract::Extraction;
use crate::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum ApiError {
  /// Missing or invalid request fields, detected before any model call.
  #[error("{0}")]
  BadRequest(String),
  /// The model service rejected the API key.
  #[error("Server configuration error: the model API key is not valid.")]
  InvalidCredential(String),
  /// No API key was configured at startup.
  #[error("Server configuration error: the model API key is not set.")]
  MissingCredential,
  /// Any other failure of the model call.
  #[error("An unexpected error occurred while contacting the model.")]
  Upstream(String),
  #[error("Failed to parse the model response as JSON.")]
  Malformed { raw: String, cleaned: String, detail: String },
  #[error("The model response did not have the expected structure.")]
  ShapeMismatch { raw: String, parsed: Value, detail: String },
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
      ApiError::MissingCredential
      | ApiError::Upstream(_)
      | ApiError::Malformed { .. }
      | ApiError::ShapeMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn body(&self) -> Value {
    let error = self.to_string();
    match self {
      ApiError::BadRequest(_) | ApiError::MissingCredential => json!({ "error": error }),
      ApiError::InvalidCredential(detail) | ApiError::Upstream(detail) => {
        json!({ "error": error, "details": detail })
      }
      ApiError::Malformed { raw, cleaned, detail } => json!({
        "error": error,
        "details": detail,
        "rawText": raw,
        "cleanedText": cleaned,
      }),
      ApiError::ShapeMismatch { raw, parsed, detail } => json!({
        "error": error,
        "details": detail,
        "rawText": raw,
        "parsedValue": parsed,
      }),
    }
  }

  /// Map a non-Ok extraction outcome. `Ok` has no error counterpart.
  pub fn from_extraction<T>(outcome: Extraction<T>) -> Result<T, ApiError> {
    match outcome {
      Extraction::Ok(value) => Ok(value),
      Extraction::ShapeMismatch { raw, parsed, detail } => Err(ApiError::ShapeMismatch { raw, parsed, detail }),
      Extraction::Malformed { raw, cleaned, detail } => Err(ApiError::Malformed { raw, cleaned, detail }),
    }
  }
}

impl From<GatewayError> for ApiError {
  fn from(e: GatewayError) -> Self {
    if e.is_invalid_credential() {
      return ApiError::InvalidCredential(e.to_string());
    }
    match e {
      GatewayError::MissingCredential => ApiError::MissingCredential,
      other => ApiError::Upstream(other.to_string()),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.status(), Json(self.body())).into_response()
  }
}
