//! Model gateway: one text-generation call per request.
//!
//! `ModelGateway` is the seam the request logic talks to. `GeminiGateway` is the
//! production implementation, a minimal client for the Gemini `generateContent`
//! REST endpoint. Calls are instrumented and log the model name, latency and
//! response size (not contents).
//!
//! NOTE: the API key travels in the `x-goog-api-key` header, never in the URL,
//! so transport errors (which carry the URL) cannot leak it.

use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, instrument};

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Sampling knobs for a single call. `None` leaves the model default in place.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GenerationConfig {
  pub temperature: Option<f32>,
}

impl GenerationConfig {
  pub fn with_temperature(temperature: f32) -> Self {
    Self { temperature: Some(temperature) }
  }
}

#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("model API key is not configured")]
  MissingCredential,
  #[error("model API error{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
  Upstream { status: Option<u16>, message: String },
  #[error("model transport error: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("model returned no text{}", .reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default())]
  EmptyResponse { reason: Option<String> },
}

impl GatewayError {
  /// True when the service rejected the credential. Never worth retrying.
  pub fn is_invalid_credential(&self) -> bool {
    match self {
      GatewayError::Upstream { status, message } => {
        matches!(status, Some(401) | Some(403))
          || message.contains("API key not valid")
          || message.contains("API_KEY_INVALID")
      }
      _ => false,
    }
  }
}

#[async_trait]
pub trait ModelGateway: Send + Sync {
  /// Model identifier, for logs and the health endpoint.
  fn model(&self) -> &str;

  /// Send `prompt` and return the raw reply text.
  async fn generate(&self, prompt: &str, config: GenerationConfig) -> Result<String, GatewayError>;
}

#[derive(Clone)]
pub struct GeminiGateway {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl GeminiGateway {
  pub fn new(api_key: String, base_url: String, model: String) -> Result<Self, GatewayError> {
    if api_key.trim().is_empty() {
      return Err(GatewayError::MissingCredential);
    }
    // No timeout override: the transport default applies.
    let client = reqwest::Client::builder().build()?;
    Ok(Self { client, api_key, base_url, model })
  }

  fn endpoint(&self) -> String {
    format!("{}/models/{}:generateContent", self.base_url.trim_end_matches('/'), self.model)
  }
}

#[async_trait]
impl ModelGateway for GeminiGateway {
  fn model(&self) -> &str {
    &self.model
  }

  #[instrument(level = "info", target = "gateway", skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len(), temperature = ?config.temperature))]
  async fn generate(&self, prompt: &str, config: GenerationConfig) -> Result<String, GatewayError> {
    let req = GenerateContentRequest {
      contents: vec![Content { parts: vec![Part { text: prompt.to_string() }] }],
      generation_config: config.temperature.map(|temperature| GenerationConfigReq { temperature }),
    };

    let start = Instant::now();
    let res = self
      .client
      .post(self.endpoint())
      .header(API_KEY_HEADER, self.api_key.as_str())
      .header(USER_AGENT, "quizgen-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .json(&req)
      .send()
      .await?;

    let status = res.status();
    let body = res.text().await?;
    let elapsed = start.elapsed();

    if !status.is_success() {
      let message = extract_api_error(&body).unwrap_or(body);
      error!(target: "gateway", ?elapsed, status = status.as_u16(), "Model call failed");
      return Err(GatewayError::Upstream { status: Some(status.as_u16()), message });
    }

    let text = parse_generate_response(&body)?;
    info!(target: "gateway", ?elapsed, response_len = text.len(), "Model response received");
    Ok(text)
  }
}

/// Pull the reply text out of a successful `generateContent` body.
/// Multiple parts of the first candidate are concatenated.
pub fn parse_generate_response(body: &str) -> Result<String, GatewayError> {
  let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|e| GatewayError::Upstream {
    status: None,
    message: format!("unreadable response body: {}", e),
  })?;

  let text: String = parsed
    .candidates
    .first()
    .and_then(|c| c.content.as_ref())
    .map(|c| c.parts.iter().map(|p| p.text.as_str()).collect())
    .unwrap_or_default();

  if text.is_empty() {
    let reason = parsed
      .prompt_feedback
      .and_then(|f| f.block_reason)
      .or_else(|| parsed.candidates.first().and_then(|c| c.finish_reason.clone()));
    return Err(GatewayError::EmptyResponse { reason });
  }
  Ok(text)
}

/// Try to extract a clean error message from a Google API error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

// --- generateContent DTOs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
  contents: Vec<Content>,
  #[serde(skip_serializing_if = "Option::is_none")]
  generation_config: Option<GenerationConfigReq>,
}
#[derive(Serialize, Deserialize)]
struct Content { #[serde(default)] parts: Vec<Part> }
#[derive(Serialize, Deserialize)]
struct Part { #[serde(default)] text: String }
#[derive(Serialize)]
struct GenerationConfigReq { temperature: f32 }

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)] candidates: Vec<Candidate>,
  #[serde(default)] prompt_feedback: Option<PromptFeedback>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
  #[serde(default)] content: Option<Content>,
  #[serde(default)] finish_reason: Option<String>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback { #[serde(default)] block_reason: Option<String> }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn request_omits_generation_config_by_default() {
    let req = GenerateContentRequest {
      contents: vec![Content { parts: vec![Part { text: "hi".into() }] }],
      generation_config: None,
    };
    assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"contents":[{"parts":[{"text":"hi"}]}]}"#);

    let req = GenerateContentRequest {
      contents: vec![],
      generation_config: GenerationConfig::with_temperature(0.9).temperature.map(|temperature| GenerationConfigReq { temperature }),
    };
    let v = serde_json::to_value(&req).unwrap();
    assert!((v["generationConfig"]["temperature"].as_f64().unwrap() - 0.9).abs() < 1e-6);
  }

  #[test]
  fn parses_and_concatenates_candidate_parts() {
    let body = r#"{"candidates":[{"content":{"parts":[{"text":"[1,"},{"text":"2]"}],"role":"model"},"finishReason":"STOP"}]}"#;
    assert_eq!(parse_generate_response(body).unwrap(), "[1,2]");
  }

  #[test]
  fn blocked_prompt_is_empty_response_with_reason() {
    let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
    match parse_generate_response(body) {
      Err(GatewayError::EmptyResponse { reason }) => assert_eq!(reason.as_deref(), Some("SAFETY")),
      other => panic!("expected EmptyResponse, got {:?}", other),
    }
  }

  #[test]
  fn api_error_message_is_extracted() {
    let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT"}}"#;
    assert_eq!(extract_api_error(body).as_deref(), Some("API key not valid. Please pass a valid API key."));
    assert_eq!(extract_api_error("<html>oops</html>"), None);
  }

  #[test]
  fn invalid_credential_classification() {
    let by_message = GatewayError::Upstream { status: Some(400), message: "API key not valid. Please pass a valid API key.".into() };
    let by_status = GatewayError::Upstream { status: Some(403), message: "forbidden".into() };
    let other = GatewayError::Upstream { status: Some(500), message: "internal".into() };
    assert!(by_message.is_invalid_credential());
    assert!(by_status.is_invalid_credential());
    assert!(!other.is_invalid_credential());
    assert!(!GatewayError::MissingCredential.is_invalid_credential());
  }

  #[test]
  fn error_display_includes_status() {
    let e = GatewayError::Upstream { status: Some(429), message: "quota".into() };
    assert_eq!(e.to_string(), "model API error (HTTP 429): quota");
    let e = GatewayError::EmptyResponse { reason: None };
    assert_eq!(e.to_string(), "model returned no text");
  }

  #[test]
  fn empty_key_is_rejected() {
    assert!(matches!(
      GeminiGateway::new("  ".into(), DEFAULT_BASE_URL.into(), DEFAULT_MODEL.into()),
      Err(GatewayError::MissingCredential)
    ));
  }

  #[test]
  fn endpoint_joins_base_and_model() {
    let gw = GeminiGateway::new("k".into(), "https://example.test/v1beta/".into(), "m-1".into()).unwrap();
    assert_eq!(gw.endpoint(), "https://example.test/v1beta/models/m-1:generateContent");
  }
}
