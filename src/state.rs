//! Application state shared by all handlers. Read-only after startup:
//!   - the optional model gateway (absent when no API key is configured)
//!   - the prompt templates (from TOML or defaults)
//!   - the strict-validation switch

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::config::Settings;
use crate::gateway::{GeminiGateway, ModelGateway};
use crate::prompts::Prompts;

#[derive(Clone)]
pub struct AppState {
  pub gateway: Option<Arc<dyn ModelGateway>>,
  pub prompts: Prompts,
  pub strict_validation: bool,
}

impl AppState {
  /// Build state from settings: keep prompts, init the Gemini client if a key is present.
  #[instrument(level = "info", skip_all)]
  pub fn from_settings(settings: &Settings) -> Self {
    let gateway: Option<Arc<dyn ModelGateway>> = match &settings.api_key {
      Some(key) => match GeminiGateway::new(key.clone(), settings.base_url.clone(), settings.model.clone()) {
        Ok(gw) => {
          info!(target: "quizgen", base_url = %gw.base_url, model = %gw.model, "Gemini gateway enabled.");
          Some(Arc::new(gw))
        }
        Err(e) => {
          error!(target: "quizgen", error = %e, "Failed to build Gemini client; model calls will fail.");
          None
        }
      },
      None => {
        warn!(target: "quizgen", "GEMINI_API_KEY not set; model calls will fail with a configuration error.");
        None
      }
    };

    if settings.strict_validation {
      info!(target: "quizgen", "Strict quiz validation enabled.");
    }

    Self {
      gateway,
      prompts: settings.prompts.clone(),
      strict_validation: settings.strict_validation,
    }
  }

  /// State around an explicit gateway, with default prompts.
  pub fn with_gateway(gateway: Arc<dyn ModelGateway>) -> Self {
    Self { gateway: Some(gateway), prompts: Prompts::default(), strict_validation: false }
  }

  pub fn model_name(&self) -> Option<&str> {
    self.gateway.as_deref().map(|g| g.model())
  }
}
