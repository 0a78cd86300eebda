//! Runtime settings: environment variables plus an optional TOML file.
//!
//! Env variables:
//!   PORT                       : u16 (default 3000)
//!   GEMINI_API_KEY             : model credential; without it every model call fails
//!   GEMINI_MODEL_NAME          : default "gemini-1.5-flash-latest"
//!   GEMINI_BASE_URL            : default "https://generativelanguage.googleapis.com/v1beta"
//!   QUIZGEN_CONFIG_PATH        : TOML with `[prompts]` overrides and `[validation]`
//!   QUIZGEN_STRICT_VALIDATION  : "true"/"1" enables the semantic quiz check (overrides TOML)
//!   STATIC_DIR                 : SPA directory (default "./static")
//!
//! TOML schema:
//! ```toml
//! [prompts]
//! topic_template = "..."   # {difficulty}
//! quiz_template = "..."    # {topic} {difficulty} {question_type}
//! chat_template = "..."    # {question_text} {options} {correct_answer} {explanation} {transcript}
//!
//! [validation]
//! strict = false
//! ```

use serde::Deserialize;
use tracing::{error, info};

use crate::gateway::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::prompts::Prompts;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_STATIC_DIR: &str = "./static";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct FileConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub validation: ValidationCfg,
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct ValidationCfg {
  #[serde(default)]
  pub strict: bool,
}

#[derive(Clone, Debug)]
pub struct Settings {
  pub port: u16,
  pub api_key: Option<String>,
  pub model: String,
  pub base_url: String,
  pub static_dir: String,
  pub prompts: Prompts,
  pub strict_validation: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      port: DEFAULT_PORT,
      api_key: None,
      model: DEFAULT_MODEL.into(),
      base_url: DEFAULT_BASE_URL.into(),
      static_dir: DEFAULT_STATIC_DIR.into(),
      prompts: Prompts::default(),
      strict_validation: false,
    }
  }
}

impl Settings {
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Build settings from any key lookup. Blank values count as unset.
  pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
    let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let file = get("QUIZGEN_CONFIG_PATH")
      .and_then(|path| load_file_config(&path))
      .unwrap_or_default();

    let strict_validation = get("QUIZGEN_STRICT_VALIDATION")
      .map(|v| parse_flag(&v))
      .unwrap_or(file.validation.strict);

    Self {
      port: get("PORT").and_then(|p| p.parse::<u16>().ok()).unwrap_or(DEFAULT_PORT),
      api_key: get("GEMINI_API_KEY"),
      model: get("GEMINI_MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.into()),
      base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
      static_dir: get("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.into()),
      prompts: file.prompts,
      strict_validation,
    }
  }
}

fn parse_flag(v: &str) -> bool {
  matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

pub fn parse_file_config(s: &str) -> Result<FileConfig, toml::de::Error> {
  toml::from_str::<FileConfig>(s)
}

/// Load the TOML config at `path`. On any IO/parse error, logs and returns None.
pub fn load_file_config(path: &str) -> Option<FileConfig> {
  match std::fs::read_to_string(path) {
    Ok(s) => match parse_file_config(&s) {
      Ok(cfg) => {
        info!(target: "quizgen", %path, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "quizgen", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "quizgen", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
