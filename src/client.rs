//! Client-side state model for the quiz view and the explanation chat.
//!
//! Everything here lives for one page lifetime and never touches the server
//! except through the request bodies it hands out. A front end drives it:
//! call `submit`, send the returned body, then feed the response back in.

use serde::Serialize;
use thiserror::Error;

use crate::domain::{ChatMessage, QuizQuestion, QUESTION_TYPE_MULTIPLE_CHOICE};

/// First message of every transcript.
pub const CHAT_GREETING: &str =
  "Hi! I can help you understand this question and its answer. What would you like to know?";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
  #[error("a request is already in flight")]
  Busy,
  #[error("{0} is required")]
  MissingField(&'static str),
  #[error("no quiz is displayed")]
  NoQuiz,
  #[error("question {0} does not exist")]
  NoSuchQuestion(usize),
  #[error("'{0}' is not one of the options")]
  UnknownOption(String),
  #[error("the answer has already been checked")]
  AlreadyChecked,
  #[error("select an answer first")]
  NothingSelected,
  #[error("the explanation chat opens once the answer is checked")]
  ChatLocked,
  #[error("message is empty")]
  EmptyMessage,
}

// --- Request bodies handed to the front end ---

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequest {
  pub topic: String,
  pub difficulty: String,
  pub question_type: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RandomTopicRequest {
  pub difficulty: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
  pub question: QuizQuestion,
  pub user_message: String,
  pub chat_history: Vec<ChatMessage>,
}

// --- Per-question state ---

/// Selection only moves forward: once checked, the answer is frozen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum QuestionState {
  #[default]
  Unanswered,
  Selected(String),
  Checked(String),
}

#[derive(Debug, Clone)]
pub struct QuizItem {
  pub question: QuizQuestion,
  state: QuestionState,
  chat: Option<ChatTranscript>,
}

impl QuizItem {
  pub fn new(question: QuizQuestion) -> Self {
    Self { question, state: QuestionState::Unanswered, chat: None }
  }

  pub fn state(&self) -> &QuestionState {
    &self.state
  }

  pub fn selected(&self) -> Option<&str> {
    match &self.state {
      QuestionState::Unanswered => None,
      QuestionState::Selected(a) | QuestionState::Checked(a) => Some(a),
    }
  }

  pub fn is_checked(&self) -> bool {
    matches!(self.state, QuestionState::Checked(_))
  }

  /// `Some` only after checking.
  pub fn is_correct(&self) -> Option<bool> {
    match &self.state {
      QuestionState::Checked(a) => Some(*a == self.question.correct_answer),
      _ => None,
    }
  }

  /// The explanation is shown only once the answer is checked.
  pub fn explanation(&self) -> Option<&str> {
    self.is_checked().then_some(self.question.explanation.as_str())
  }

  pub fn select(&mut self, answer: &str) -> Result<(), ClientError> {
    if self.is_checked() {
      return Err(ClientError::AlreadyChecked);
    }
    if !self.question.options.iter().any(|o| o == answer) {
      return Err(ClientError::UnknownOption(answer.to_string()));
    }
    self.state = QuestionState::Selected(answer.to_string());
    Ok(())
  }

  /// Freeze the selection; returns whether it was correct.
  pub fn check(&mut self) -> Result<bool, ClientError> {
    let answer = match &self.state {
      QuestionState::Unanswered => return Err(ClientError::NothingSelected),
      QuestionState::Checked(_) => return Err(ClientError::AlreadyChecked),
      QuestionState::Selected(a) => a.clone(),
    };
    self.state = QuestionState::Checked(answer);
    self.chat = Some(ChatTranscript::new(self.question.clone()));
    Ok(self.is_correct().unwrap_or(false))
  }

  pub fn chat(&self) -> Option<&ChatTranscript> {
    self.chat.as_ref()
  }

  pub fn chat_mut(&mut self) -> Result<&mut ChatTranscript, ClientError> {
    self.chat.as_mut().ok_or(ClientError::ChatLocked)
  }
}

// --- Quiz view ---

#[derive(Debug, Clone, Default)]
pub enum QuizPhase {
  #[default]
  Idle,
  Loading,
  Displayed(Vec<QuizItem>),
  Errored(String),
}

/// Top-level quiz view. Topic fetching has its own flag so it never blocks
/// (or is blocked by) quiz generation.
#[derive(Debug, Clone, Default)]
pub struct QuizView {
  pub topic: String,
  pub difficulty: String,
  phase: QuizPhase,
  topic_loading: bool,
  topic_error: Option<String>,
}

impl QuizView {
  pub fn new(difficulty: impl Into<String>) -> Self {
    Self { difficulty: difficulty.into(), ..Self::default() }
  }

  pub fn phase(&self) -> &QuizPhase {
    &self.phase
  }

  pub fn is_loading(&self) -> bool {
    matches!(self.phase, QuizPhase::Loading)
  }

  pub fn is_topic_loading(&self) -> bool {
    self.topic_loading
  }

  pub fn topic_error(&self) -> Option<&str> {
    self.topic_error.as_deref()
  }

  /// Start generating a quiz. Clears any previous quiz or error.
  pub fn submit(&mut self) -> Result<GenerateQuizRequest, ClientError> {
    if self.is_loading() {
      return Err(ClientError::Busy);
    }
    let topic = self.topic.trim();
    if topic.is_empty() {
      return Err(ClientError::MissingField("topic"));
    }
    if self.difficulty.trim().is_empty() {
      return Err(ClientError::MissingField("difficulty"));
    }
    let req = GenerateQuizRequest {
      topic: topic.to_string(),
      difficulty: self.difficulty.trim().to_string(),
      question_type: QUESTION_TYPE_MULTIPLE_CHOICE.to_string(),
    };
    self.phase = QuizPhase::Loading;
    Ok(req)
  }

  pub fn receive_quiz(&mut self, questions: Vec<QuizQuestion>) {
    self.phase = QuizPhase::Displayed(questions.into_iter().map(QuizItem::new).collect());
  }

  /// Store the server's message verbatim for the error panel.
  pub fn receive_error(&mut self, message: impl Into<String>) {
    self.phase = QuizPhase::Errored(message.into());
  }

  pub fn items(&self) -> &[QuizItem] {
    match &self.phase {
      QuizPhase::Displayed(items) => items,
      _ => &[],
    }
  }

  pub fn item_mut(&mut self, index: usize) -> Result<&mut QuizItem, ClientError> {
    match &mut self.phase {
      QuizPhase::Displayed(items) => items.get_mut(index).ok_or(ClientError::NoSuchQuestion(index)),
      _ => Err(ClientError::NoQuiz),
    }
  }

  /// (correct, checked) over the displayed quiz.
  pub fn score(&self) -> (usize, usize) {
    let checked = self.items().iter().filter(|i| i.is_checked()).count();
    let correct = self.items().iter().filter(|i| i.is_correct() == Some(true)).count();
    (correct, checked)
  }

  pub fn begin_topic_fetch(&mut self) -> Result<RandomTopicRequest, ClientError> {
    if self.topic_loading {
      return Err(ClientError::Busy);
    }
    if self.difficulty.trim().is_empty() {
      return Err(ClientError::MissingField("difficulty"));
    }
    self.topic_loading = true;
    self.topic_error = None;
    Ok(RandomTopicRequest { difficulty: self.difficulty.trim().to_string() })
  }

  /// On success the suggestion replaces the current topic.
  pub fn finish_topic_fetch(&mut self, result: Result<String, String>) {
    self.topic_loading = false;
    match result {
      Ok(topic) => self.topic = topic,
      Err(message) => self.topic_error = Some(message),
    }
  }
}

// --- Explanation chat ---

#[derive(Debug, Clone)]
pub struct ChatTranscript {
  question: QuizQuestion,
  messages: Vec<ChatMessage>,
  pending: bool,
  error: Option<String>,
}

impl ChatTranscript {
  pub fn new(question: QuizQuestion) -> Self {
    Self { question, messages: vec![ChatMessage::ai(CHAT_GREETING)], pending: false, error: None }
  }

  pub fn messages(&self) -> &[ChatMessage] {
    &self.messages
  }

  pub fn is_pending(&self) -> bool {
    self.pending
  }

  pub fn error(&self) -> Option<&str> {
    self.error.as_deref()
  }

  /// Point the transcript at `question`. Resets to the greeting if it changed.
  pub fn rebind(&mut self, question: &QuizQuestion) -> bool {
    if &self.question == question {
      return false;
    }
    *self = Self::new(question.clone());
    true
  }

  /// Append the user's message right away and return the request to send.
  /// The history in the request already includes that message.
  pub fn send(&mut self, text: &str) -> Result<ChatRequest, ClientError> {
    if self.pending {
      return Err(ClientError::Busy);
    }
    let text = text.trim();
    if text.is_empty() {
      return Err(ClientError::EmptyMessage);
    }
    self.messages.push(ChatMessage::user(text));
    self.pending = true;
    self.error = None;
    Ok(ChatRequest {
      question: self.question.clone(),
      user_message: text.to_string(),
      chat_history: self.messages.clone(),
    })
  }

  pub fn receive_reply(&mut self, text: impl Into<String>) {
    self.pending = false;
    self.messages.push(ChatMessage::ai(text));
  }

  /// Keeps the user's message, adds an apology to the transcript and raises the banner.
  pub fn receive_failure(&mut self, message: impl Into<String>) {
    let message = message.into();
    self.pending = false;
    self.messages.push(ChatMessage::ai(format!(
      "Sorry, I couldn't get an explanation right now ({}). Please try again.",
      message
    )));
    self.error = Some(message);
  }
}
