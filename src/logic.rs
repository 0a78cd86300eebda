//! Core behavior behind the three endpoints.
//!
//! Each operation validates its input, builds a prompt, makes exactly one model
//! call and maps the outcome. Nothing is shared between requests except the
//! read-only `AppState`.

use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::domain::{quiz_violation, ChatMessage, QuizQuestion, TopicSuggestion, QUESTION_TYPE_MULTIPLE_CHOICE};
use crate::error::ApiError;
use crate::extract::{extract, Extraction};
use crate::gateway::{GenerationConfig, ModelGateway};
use crate::protocol::{ChatExplanationIn, GenerateQuizIn, RandomTopicIn};
use crate::state::AppState;
use crate::util::trunc_for_log;

/// Topic suggestions should vary between calls.
pub const TOPIC_TEMPERATURE: f32 = 0.9;

const LOG_PREVIEW: usize = 300;

fn gateway(state: &AppState) -> Result<&dyn ModelGateway, ApiError> {
  state.gateway.as_deref().ok_or(ApiError::MissingCredential)
}

/// `Some(trimmed)` when present and non-blank.
fn required(field: Option<&str>) -> Option<&str> {
  field.map(str::trim).filter(|s| !s.is_empty())
}

fn log_extraction<T>(target: &'static str, outcome: &Extraction<T>) {
  match outcome {
    Extraction::Ok(_) => {}
    Extraction::Malformed { raw, detail, .. } => {
      error!(target: "quizgen", endpoint = target, %detail, raw = %trunc_for_log(raw, LOG_PREVIEW), "Model output is not valid JSON");
    }
    Extraction::ShapeMismatch { raw, detail, .. } => {
      error!(target: "quizgen", endpoint = target, %detail, raw = %trunc_for_log(raw, LOG_PREVIEW), "Model output has unexpected shape");
    }
  }
}

#[instrument(level = "info", skip(state, input), fields(topic = ?input.topic, difficulty = ?input.difficulty))]
pub async fn generate_quiz(state: &AppState, input: &GenerateQuizIn) -> Result<Vec<QuizQuestion>, ApiError> {
  if input.question_type.as_deref() != Some(QUESTION_TYPE_MULTIPLE_CHOICE) {
    return Err(ApiError::BadRequest(format!(
      "Invalid or missing questionType. Only \"{}\" is supported.",
      QUESTION_TYPE_MULTIPLE_CHOICE
    )));
  }
  let (topic, difficulty) = match (required(input.topic.as_deref()), required(input.difficulty.as_deref())) {
    (Some(t), Some(d)) => (t, d),
    _ => return Err(ApiError::BadRequest("Topic and difficulty are required.".into())),
  };

  let gw = gateway(state)?;
  let prompt = state.prompts.quiz_prompt(topic, difficulty, QUESTION_TYPE_MULTIPLE_CHOICE);
  let raw = gw.generate(&prompt, GenerationConfig::default()).await.map_err(|e| {
    error!(target: "quiz", error = %e, "Model call failed during quiz generation");
    ApiError::from(e)
  })?;

  let outcome = extract::<Vec<QuizQuestion>>(&raw);
  log_extraction("generate-quiz", &outcome);
  let questions = ApiError::from_extraction(outcome)?;

  if state.strict_validation {
    if let Some(detail) = quiz_violation(&questions) {
      warn!(target: "quiz", %detail, "Quiz failed strict validation");
      let parsed = serde_json::to_value(&questions).unwrap_or(Value::Null);
      return Err(ApiError::ShapeMismatch { raw, parsed, detail });
    }
  }

  info!(target: "quiz", %topic, %difficulty, count = questions.len(), "Quiz generated");
  Ok(questions)
}

#[instrument(level = "info", skip(state, input), fields(difficulty = ?input.difficulty))]
pub async fn random_topic(state: &AppState, input: &RandomTopicIn) -> Result<TopicSuggestion, ApiError> {
  let difficulty = required(input.difficulty.as_deref())
    .ok_or_else(|| ApiError::BadRequest("Difficulty is required.".into()))?;

  let gw = gateway(state)?;
  let prompt = state.prompts.topic_prompt(difficulty);
  let raw = gw
    .generate(&prompt, GenerationConfig::with_temperature(TOPIC_TEMPERATURE))
    .await
    .map_err(|e| {
      error!(target: "topic", error = %e, "Model call failed during topic suggestion");
      ApiError::from(e)
    })?;

  let outcome = extract::<TopicSuggestion>(&raw);
  log_extraction("get-random-topic", &outcome);
  let suggestion = ApiError::from_extraction(outcome)?;

  let topic = suggestion.topic.trim();
  if state.strict_validation && topic.is_empty() {
    warn!(target: "topic", "Topic failed strict validation");
    let parsed = serde_json::to_value(&suggestion).unwrap_or(Value::Null);
    return Err(ApiError::ShapeMismatch { raw, parsed, detail: "topic is empty".into() });
  }

  info!(target: "topic", %difficulty, %topic, "Topic suggested");
  Ok(TopicSuggestion { topic: topic.to_string() })
}

#[instrument(level = "info", skip(state, input), fields(message_len = ?input.user_message.as_deref().map(str::len)))]
pub async fn chat_explanation(state: &AppState, input: &ChatExplanationIn) -> Result<String, ApiError> {
  let question = input
    .question
    .clone()
    .filter(Value::is_object)
    .and_then(|q| serde_json::from_value::<QuizQuestion>(q).ok())
    .ok_or_else(|| {
      ApiError::BadRequest(
        "A valid question (questionText, options, correctAnswer, explanation) is required.".into(),
      )
    })?;
  let user_message = required(input.user_message.as_deref())
    .ok_or_else(|| ApiError::BadRequest("userMessage must not be empty.".into()))?;
  let history = match &input.chat_history {
    Some(v @ Value::Array(_)) => serde_json::from_value::<Vec<ChatMessage>>(v.clone())
      .map_err(|e| ApiError::BadRequest(format!("chatHistory contains an invalid message: {}", e)))?,
    _ => return Err(ApiError::BadRequest("chatHistory must be an array.".into())),
  };

  let gw = gateway(state)?;
  let prompt = state.prompts.chat_prompt(&question, &history, user_message);
  let reply = gw.generate(&prompt, GenerationConfig::default()).await.map_err(|e| {
    error!(target: "chat", error = %e, "Model call failed during chat explanation");
    ApiError::from(e)
  })?;

  info!(target: "chat", history_len = history.len(), reply_len = reply.len(), "Chat reply generated");
  Ok(reply)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::gateway::GatewayError;
  use async_trait::async_trait;
  use std::sync::{Arc, Mutex};

  /// Replays one canned reply and records every call.
  struct Canned {
    reply: Result<String, String>,
    calls: Mutex<Vec<(String, GenerationConfig)>>,
  }

  impl Canned {
    fn ok(text: &str) -> Arc<Self> {
      Arc::new(Self { reply: Ok(text.into()), calls: Mutex::new(vec![]) })
    }
    fn err(message: &str) -> Arc<Self> {
      Arc::new(Self { reply: Err(message.into()), calls: Mutex::new(vec![]) })
    }
    fn calls(&self) -> Vec<(String, GenerationConfig)> {
      self.calls.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl ModelGateway for Canned {
    fn model(&self) -> &str {
      "canned"
    }
    async fn generate(&self, prompt: &str, config: GenerationConfig) -> Result<String, GatewayError> {
      self.calls.lock().unwrap().push((prompt.to_string(), config));
      self.reply.clone().map_err(|message| GatewayError::Upstream { status: None, message })
    }
  }

  fn quiz_in(question_type: Option<&str>) -> GenerateQuizIn {
    GenerateQuizIn {
      topic: Some("World War II".into()),
      difficulty: Some("High School".into()),
      question_type: question_type.map(String::from),
    }
  }

  const QUIZ: &str = r#"[
    {"questionText":"Q1","options":["a","b","c","d"],"correctAnswer":"a","explanation":"e"},
    {"questionText":"Q2","options":["a","b","c","d"],"correctAnswer":"b","explanation":"e"},
    {"questionText":"Q3","options":["a","b","c","d"],"correctAnswer":"c","explanation":"e"}
  ]"#;

  #[tokio::test]
  async fn unsupported_question_type_never_calls_the_model() {
    let gw = Canned::ok(QUIZ);
    let state = AppState::with_gateway(gw.clone());
    for qt in [None, Some("True/False"), Some("multiple choice"), Some(" Multiple Choice ")] {
      let err = generate_quiz(&state, &quiz_in(qt)).await.unwrap_err();
      assert!(matches!(err, ApiError::BadRequest(_)));
    }
    assert!(gw.calls().is_empty());
  }

  #[tokio::test]
  async fn blank_topic_is_rejected() {
    let gw = Canned::ok(QUIZ);
    let state = AppState::with_gateway(gw.clone());
    let mut input = quiz_in(Some(QUESTION_TYPE_MULTIPLE_CHOICE));
    input.topic = Some("   ".into());
    assert!(matches!(generate_quiz(&state, &input).await, Err(ApiError::BadRequest(_))));
    assert!(gw.calls().is_empty());
  }

  #[tokio::test]
  async fn quiz_passes_through_with_default_config() {
    let gw = Canned::ok(QUIZ);
    let state = AppState::with_gateway(gw.clone());
    let questions = generate_quiz(&state, &quiz_in(Some(QUESTION_TYPE_MULTIPLE_CHOICE))).await.unwrap();
    assert_eq!(questions.len(), 3);
    let calls = gw.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0.contains("World War II"));
    assert_eq!(calls[0].1, GenerationConfig::default());
  }

  #[tokio::test]
  async fn strict_validation_rejects_wrong_answer() {
    let bad = QUIZ.replace(r#""correctAnswer":"c""#, r#""correctAnswer":"z""#);
    let mut state = AppState::with_gateway(Canned::ok(&bad));
    assert!(generate_quiz(&state, &quiz_in(Some(QUESTION_TYPE_MULTIPLE_CHOICE))).await.is_ok());

    state.strict_validation = true;
    match generate_quiz(&state, &quiz_in(Some(QUESTION_TYPE_MULTIPLE_CHOICE))).await {
      Err(ApiError::ShapeMismatch { detail, parsed, .. }) => {
        assert!(detail.starts_with("question 3:"));
        assert!(parsed.is_array());
      }
      other => panic!("expected ShapeMismatch, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn topic_uses_elevated_temperature_and_trims() {
    let gw = Canned::ok("```json\n{\"topic\": \"  ancient rome \"}\n```");
    let state = AppState::with_gateway(gw.clone());
    let out = random_topic(&state, &RandomTopicIn { difficulty: Some("Easy".into()) }).await.unwrap();
    assert_eq!(out.topic, "ancient rome");
    assert_eq!(gw.calls()[0].1, GenerationConfig::with_temperature(TOPIC_TEMPERATURE));
  }

  #[tokio::test]
  async fn topic_extraction_failures_are_reported() {
    let state = AppState::with_gateway(Canned::ok("Sure! How about volcanoes?"));
    let input = RandomTopicIn { difficulty: Some("Easy".into()) };
    assert!(matches!(random_topic(&state, &input).await, Err(ApiError::Malformed { .. })));

    let state = AppState::with_gateway(Canned::ok(r#"{"topic": ["rome"]}"#));
    assert!(matches!(random_topic(&state, &input).await, Err(ApiError::ShapeMismatch { .. })));
  }

  #[tokio::test]
  async fn blank_topic_is_rejected_only_when_strict() {
    let input = RandomTopicIn { difficulty: Some("Easy".into()) };
    let mut state = AppState::with_gateway(Canned::ok(r#"{"topic": "  "}"#));
    assert_eq!(random_topic(&state, &input).await.unwrap().topic, "");

    state.strict_validation = true;
    match random_topic(&state, &input).await {
      Err(ApiError::ShapeMismatch { detail, .. }) => assert_eq!(detail, "topic is empty"),
      other => panic!("expected ShapeMismatch, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn missing_gateway_is_a_configuration_error() {
    let state = AppState { gateway: None, prompts: Default::default(), strict_validation: false };
    let err = random_topic(&state, &RandomTopicIn { difficulty: Some("Easy".into()) }).await.unwrap_err();
    assert!(matches!(err, ApiError::MissingCredential));
  }

  #[tokio::test]
  async fn chat_returns_raw_reply_verbatim() {
    let gw = Canned::ok("  Because 1945 is when the war ended.\n");
    let state = AppState::with_gateway(gw.clone());
    let input = ChatExplanationIn {
      question: Some(serde_json::json!({
        "questionText": "When?", "options": ["1943","1944","1945","1946"],
        "correctAnswer": "1945", "explanation": "Surrender."
      })),
      user_message: Some("Why 1945?".into()),
      chat_history: Some(serde_json::json!([
        {"sender": "ai", "text": "Hi!"},
        {"sender": "user", "text": "Why 1945?"}
      ])),
    };
    let reply = chat_explanation(&state, &input).await.unwrap();
    assert_eq!(reply, "  Because 1945 is when the war ended.\n");
    let prompt = &gw.calls()[0].0;
    assert!(prompt.contains("Student: Why 1945?"));
    assert_eq!(prompt.matches("Why 1945?").count(), 1);
  }

  #[tokio::test]
  async fn chat_prompt_carries_message_absent_from_history() {
    let gw = Canned::ok("It is the year of surrender.");
    let state = AppState::with_gateway(gw.clone());
    let input = ChatExplanationIn {
      question: Some(serde_json::json!({
        "questionText": "When?", "options": ["1943","1944","1945","1946"],
        "correctAnswer": "1945", "explanation": "Surrender."
      })),
      user_message: Some("  Why is 1945 the answer?  ".into()),
      chat_history: Some(serde_json::json!([])),
    };
    chat_explanation(&state, &input).await.unwrap();
    assert!(gw.calls()[0].0.contains("Student: Why is 1945 the answer?"));
  }

  #[tokio::test]
  async fn chat_rejects_bad_input_without_calling_model() {
    let gw = Canned::ok("unused");
    let state = AppState::with_gateway(gw.clone());
    let question = serde_json::json!({
      "questionText": "When?", "options": ["a","b","c","d"], "correctAnswer": "a", "explanation": "e"
    });

    let cases = [
      ChatExplanationIn { question: None, user_message: Some("hi".into()), chat_history: Some(serde_json::json!([])) },
      ChatExplanationIn {
        question: Some(serde_json::json!(["When?", ["a","b","c","d"], "a", "e"])),
        user_message: Some("hi".into()),
        chat_history: Some(serde_json::json!([])),
      },
      ChatExplanationIn {
        question: Some(serde_json::json!({"questionText": "no options"})),
        user_message: Some("hi".into()),
        chat_history: Some(serde_json::json!([])),
      },
      ChatExplanationIn { question: Some(question.clone()), user_message: Some("  ".into()), chat_history: Some(serde_json::json!([])) },
      ChatExplanationIn { question: Some(question.clone()), user_message: Some("hi".into()), chat_history: None },
      ChatExplanationIn { question: Some(question.clone()), user_message: Some("hi".into()), chat_history: Some(serde_json::json!({"sender": "ai"})) },
      ChatExplanationIn { question: Some(question), user_message: Some("hi".into()), chat_history: Some(serde_json::json!([{"sender": "robot", "text": "x"}])) },
    ];
    for input in &cases {
      assert!(matches!(chat_explanation(&state, input).await, Err(ApiError::BadRequest(_))), "{:?}", input);
    }
    assert!(gw.calls().is_empty());
  }

  #[tokio::test]
  async fn invalid_key_maps_to_credential_error() {
    let state = AppState::with_gateway(Canned::err("API key not valid. Please pass a valid API key."));
    let err = generate_quiz(&state, &quiz_in(Some(QUESTION_TYPE_MULTIPLE_CHOICE))).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidCredential(_)));

    let state = AppState::with_gateway(Canned::err("socket hang up"));
    let err = generate_quiz(&state, &quiz_in(Some(QUESTION_TYPE_MULTIPLE_CHOICE))).await.unwrap_err();
    assert!(matches!(err, ApiError::Upstream(_)));
  }
}
