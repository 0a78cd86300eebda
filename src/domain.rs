//! Domain models shared by the backend and the client state model:
//! quiz questions, chat messages and the topic suggestion.

use serde::{Deserialize, Serialize};

/// The only question type the generator supports.
pub const QUESTION_TYPE_MULTIPLE_CHOICE: &str = "Multiple Choice";

/// Questions requested per generated quiz.
pub const QUESTIONS_PER_QUIZ: usize = 3;

/// Options requested per question.
pub const OPTIONS_PER_QUESTION: usize = 4;

/// One generated multiple-choice question, exactly as the model returned it.
/// `correct_answer` is expected to be one of `options`, but that is only
/// enforced when strict validation is enabled (see `QuizQuestion::violation`).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
  pub question_text: String,
  pub options: Vec<String>,
  pub correct_answer: String,
  pub explanation: String,
}

impl QuizQuestion {
  /// First semantic problem with this question, if any.
  pub fn violation(&self) -> Option<String> {
    if self.options.len() != OPTIONS_PER_QUESTION {
      return Some(format!(
        "expected {} options, got {}",
        OPTIONS_PER_QUESTION,
        self.options.len()
      ));
    }
    for (i, opt) in self.options.iter().enumerate() {
      if self.options[..i].contains(opt) {
        return Some(format!("duplicate option '{}'", opt));
      }
    }
    if !self.options.contains(&self.correct_answer) {
      return Some(format!("correctAnswer '{}' is not one of the options", self.correct_answer));
    }
    None
  }
}

/// Semantic check over a whole quiz: question count, then each question in order.
pub fn quiz_violation(questions: &[QuizQuestion]) -> Option<String> {
  if questions.len() != QUESTIONS_PER_QUIZ {
    return Some(format!("expected {} questions, got {}", QUESTIONS_PER_QUIZ, questions.len()));
  }
  questions
    .iter()
    .enumerate()
    .find_map(|(i, q)| q.violation().map(|v| format!("question {}: {}", i + 1, v)))
}

/// Who wrote a chat message.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
  User,
  Ai,
}

/// One entry of an explanation-chat transcript.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
  pub sender: Sender,
  pub text: String,
}

impl ChatMessage {
  pub fn user(text: impl Into<String>) -> Self {
    Self { sender: Sender::User, text: text.into() }
  }

  pub fn ai(text: impl Into<String>) -> Self {
    Self { sender: Sender::Ai, text: text.into() }
  }
}

/// Topic suggested by the model for a difficulty level.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicSuggestion {
  pub topic: String,
}
