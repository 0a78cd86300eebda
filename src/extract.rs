//! Turning raw model text into typed values.
//!
//! Models often wrap JSON in a ```json fence even when told not to. We strip
//! that fence, parse strictly, then check the shape: a structural `JsonShape`
//! pass on the raw value (objects must be objects, arrays must be arrays)
//! followed by deserializing into the expected type. The three outcomes are all routine, so they are returned as
//! an `Extraction` value rather than an error.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::{QuizQuestion, TopicSuggestion};

/// Result of extracting a `T` from raw model text.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
  /// Parsed and matched the expected shape.
  Ok(T),
  /// Valid JSON, wrong shape.
  ShapeMismatch { raw: String, parsed: Value, detail: String },
  /// Not valid JSON after fence stripping.
  Malformed { raw: String, cleaned: String, detail: String },
}

impl<T> Extraction<T> {
  pub fn outcome(&self) -> &'static str {
    match self {
      Extraction::Ok(_) => "ok",
      Extraction::ShapeMismatch { .. } => "shape_mismatch",
      Extraction::Malformed { .. } => "malformed",
    }
  }
}

/// Structural check run on the parsed value before deserializing.
///
/// Derived `Deserialize` also accepts a JSON array as a struct, matching fields
/// by position. Model output has to use named fields, so targets reject that here.
pub trait JsonShape {
  /// `Err` names the first structural mismatch.
  fn check_shape(value: &Value) -> Result<(), String>;
}

fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

fn expect_object(value: &Value) -> Result<(), String> {
  if value.is_object() {
    Ok(())
  } else {
    Err(format!("expected an object, found {}", json_kind(value)))
  }
}

impl<T: JsonShape> JsonShape for Vec<T> {
  fn check_shape(value: &Value) -> Result<(), String> {
    let items = value
      .as_array()
      .ok_or_else(|| format!("expected an array, found {}", json_kind(value)))?;
    items
      .iter()
      .enumerate()
      .try_for_each(|(i, item)| T::check_shape(item).map_err(|e| format!("element {}: {}", i, e)))
  }
}

impl JsonShape for QuizQuestion {
  fn check_shape(value: &Value) -> Result<(), String> {
    expect_object(value)
  }
}

impl JsonShape for TopicSuggestion {
  fn check_shape(value: &Value) -> Result<(), String> {
    expect_object(value)
  }
}

/// Remove a leading "```json" (or bare "```") fence and a trailing "```" fence,
/// together with surrounding whitespace. Text without fences is only trimmed.
pub fn strip_fences(raw: &str) -> &str {
  let mut s = raw.trim();
  if let Some(rest) = s.strip_prefix("```") {
    s = rest.strip_prefix("json").unwrap_or(rest).trim_start();
  }
  if let Some(rest) = s.strip_suffix("```") {
    s = rest.trim_end();
  }
  s
}

/// Strip fences, parse strictly, then shape-check as `T`.
pub fn extract<T: DeserializeOwned + JsonShape>(raw: &str) -> Extraction<T> {
  let cleaned = strip_fences(raw);
  let parsed: Value = match serde_json::from_str(cleaned) {
    Ok(v) => v,
    Err(e) => {
      return Extraction::Malformed {
        raw: raw.to_string(),
        cleaned: cleaned.to_string(),
        detail: e.to_string(),
      }
    }
  };
  if let Err(detail) = T::check_shape(&parsed) {
    return Extraction::ShapeMismatch { raw: raw.to_string(), parsed, detail };
  }
  match serde_json::from_value::<T>(parsed.clone()) {
    Ok(value) => Extraction::Ok(value),
    Err(e) => Extraction::ShapeMismatch { raw: raw.to_string(), parsed, detail: e.to_string() },
  }
}
