//! Quizgen · AI quiz generator backend
//!
//! - Axum JSON API: generate-quiz, get-random-topic, chat-explanation
//! - One Gemini `generateContent` call per request, no server-side state
//! - Static SPA fallback (./static/index.html)
//! - `client`: typed state model for the quiz and explanation-chat views

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod logic;
pub mod prompts;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod util;
