//! Quizgen · AI quiz generator backend
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   GEMINI_API_KEY      : model credential
//!   GEMINI_MODEL_NAME   : default "gemini-1.5-flash-latest"
//!   QUIZGEN_CONFIG_PATH : path to TOML config (prompt overrides + validation)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"
//!
//! See `config` for the complete list.

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use quizgen_backend::config::Settings;
use quizgen_backend::routes::build_router;
use quizgen_backend::state::AppState;
use quizgen_backend::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let settings = Settings::from_env();

  // Shared, read-only application state (gateway, prompts, validation switch).
  let state = Arc::new(AppState::from_settings(&settings));

  let app = build_router(state, &settings.static_dir);

  let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "quizgen", %addr, static_dir = %settings.static_dir, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "quizgen", "HTTP server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "quizgen", error = %e, "Failed to listen for Ctrl-C");
    std::future::pending::<()>().await;
  }
  info!(target: "quizgen", "Shutdown signal received");
}
