//! Prompt construction for the three model calls.
//!
//! Templates have sensible defaults and can be overridden from the `[prompts]`
//! table of the TOML config. Building a prompt is a pure function of the template
//! and its inputs: the same inputs always produce byte-identical text.
//!
//! User text (topic, chat messages) is interpolated verbatim.

use serde::Deserialize;

use crate::domain::{ChatMessage, QuizQuestion, Sender};
use crate::util::fill_template;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  /// Placeholders: {difficulty}
  pub topic_template: String,
  /// Placeholders: {topic}, {difficulty}, {question_type}
  pub quiz_template: String,
  /// Placeholders: {question_text}, {options}, {correct_answer}, {explanation}, {transcript}
  pub chat_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      topic_template: r#"Suggest one random, interesting quiz topic suitable for the difficulty level "{difficulty}".
The topic must be at most 5 words long and match the difficulty level.
Return ONLY a JSON object in exactly this format, with no text outside the JSON:
{"topic": "Your topic here"}"#
        .into(),
      quiz_template: r#"Generate a quiz about "{topic}" for the difficulty level "{difficulty}".
Question type: {question_type}.
Create exactly 3 questions. Each question must have exactly 4 distinct options, one correct answer that is identical to one of the options, and a short explanation of why that answer is correct.
Return ONLY a JSON array, with no text outside the JSON, in exactly this format:
[
  {
    "questionText": "The question?",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correctAnswer": "Option A",
    "explanation": "Why Option A is correct."
  }
]"#
        .into(),
      chat_template: r#"You are a friendly tutor helping a student understand a quiz question they just answered.

Question: {question_text}
Options:
{options}
Correct answer: {correct_answer}
Explanation: {explanation}

Conversation so far:
{transcript}

Reply to the student's latest message, continuing the conversation above.
Answer in plain conversational text, not JSON. Keep it concise and stay on the subject of this question."#
        .into(),
    }
  }
}

impl Prompts {
  /// Topic discovery: asks for `{"topic": string}`.
  pub fn topic_prompt(&self, difficulty: &str) -> String {
    fill_template(&self.topic_template, &[("difficulty", difficulty)])
  }

  /// Quiz generation: asks for a JSON array of 3 questions.
  pub fn quiz_prompt(&self, topic: &str, difficulty: &str, question_type: &str) -> String {
    fill_template(
      &self.quiz_template,
      &[("topic", topic), ("difficulty", difficulty), ("question_type", question_type)],
    )
  }

  /// Explanation chat: free-form reply to `user_message`, continuing `history`.
  /// The message is appended to the transcript unless `history` already ends with it.
  pub fn chat_prompt(&self, question: &QuizQuestion, history: &[ChatMessage], user_message: &str) -> String {
    let options = question
      .options
      .iter()
      .enumerate()
      .map(|(i, opt)| format!("{}) {}", option_label(i), opt))
      .collect::<Vec<_>>()
      .join("\n");
    let transcript = render_transcript(history, user_message);
    fill_template(
      &self.chat_template,
      &[
        ("question_text", question.question_text.as_str()),
        ("options", options.as_str()),
        ("correct_answer", question.correct_answer.as_str()),
        ("explanation", question.explanation.as_str()),
        ("transcript", transcript.as_str()),
      ],
    )
  }
}

fn option_label(i: usize) -> char {
  char::from_u32('A' as u32 + (i % 26) as u32).unwrap_or('?')
}

fn render_transcript(history: &[ChatMessage], user_message: &str) -> String {
  let already_sent = matches!(
    history.last(),
    Some(ChatMessage { sender: Sender::User, text }) if text.trim() == user_message
  );
  let pending = (!already_sent).then(|| ChatMessage::user(user_message));
  history
    .iter()
    .chain(pending.iter())
    .map(|m| {
      let who = match m.sender {
        Sender::User => "Student",
        Sender::Ai => "Tutor",
      };
      format!("{}: {}", who, m.text)
    })
    .collect::<Vec<_>>()
    .join("\n")
}
