//! HTTP surface of the quiz generator: the three model-backed endpoints,
//! a health probe and the browser UI served from `static_dir`.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::state::AppState;

pub mod http;

fn api_routes() -> Router<Arc<AppState>> {
  Router::new()
    .route("/health", get(http::http_health))
    .route("/generate-quiz", post(http::http_generate_quiz))
    .route("/get-random-topic", post(http::http_get_random_topic))
    .route("/chat-explanation", post(http::http_chat_explanation))
}

/// Every POST endpoint takes and returns JSON under `/api`. Anything else is
/// the UI. CORS is fully open so the UI can also run from a dev server on
/// another port.
pub fn build_router(state: Arc<AppState>, static_dir: &str) -> Router {
  let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
  let http_trace = TraceLayer::new_for_http()
    .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
    .on_request(DefaultOnRequest::new().level(Level::INFO))
    .on_response(DefaultOnResponse::new().level(Level::INFO));
  // Paths with no matching file get the UI's index.html.
  let index = format!("{}/index.html", static_dir.trim_end_matches('/'));
  let ui = ServeDir::new(static_dir)
    .append_index_html_on_directories(true)
    .not_found_service(ServeFile::new(index));

  Router::new()
    .nest("/api", api_routes())
    .with_state(state)
    .layer(cors)
    .layer(http_trace)
    .fallback_service(ui)
}
