//! Public request/response structs for the HTTP endpoints (serde ready).
//! Field names are camelCase on the wire. Inbound fields are optional so that
//! missing values become a 400 with a readable message instead of a rejection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizIn {
  pub topic: Option<String>,
  pub difficulty: Option<String>,
  pub question_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RandomTopicIn {
  pub difficulty: Option<String>,
}

#[derive(Serialize)]
pub struct RandomTopicOut {
  pub topic: String,
}

/// `question` and `chatHistory` are kept as raw JSON and shape-checked by the
/// chat logic, so a wrong type yields a specific message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExplanationIn {
  pub question: Option<Value>,
  pub user_message: Option<String>,
  pub chat_history: Option<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatExplanationOut {
  pub ai_message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthOut {
  pub ok: bool,
  pub model_configured: bool,
  pub model: String,
}
