//! Log setup for the quiz server.
//!
//! `LOG_LEVEL` takes `EnvFilter` directives over the crate's targets:
//! `quizgen` (startup, config), `quiz`, `topic` and `chat` (one per endpoint)
//! and `gateway` (model calls: latency and sizes, never prompts or keys).
//! `LOG_FORMAT=json` switches to one JSON object per line.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,quizgen=debug,quiz=debug,topic=debug,chat=debug,gateway=info,tower_http=info,axum=info";

fn log_filter() -> EnvFilter {
  EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_tracing() {
  let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(log_filter())
    .with_target(true)
    .with_file(true)
    .with_line_number(true);

  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}
