//! Output validation for generated fragments.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Why a script's return value was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputViolation {
  #[error("expected a string, got {0}")]
  NotAString(String),

  #[error("output is empty")]
  Empty,

  #[error("output contains no recognized SVG element")]
  NoMarkup,

  #[error("output contains a <script> element")]
  ScriptElement,

  #[error("output contains an inline event handler '{0}'")]
  EventHandler(String),

  #[error("output contains a '{0}' URI")]
  ScriptUri(String),
}

static SVG_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"(?i)<\s*(?:svg|g|defs|symbol|use|rect|circle|ellipse|line|polyline|polygon|path|text|tspan|textPath|image|clipPath|mask|pattern|linearGradient|radialGradient|stop|filter|marker|foreignObject)\b",
  )
  .expect("valid pattern")
});

static SCRIPT_ELEMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<\s*script\b").expect("valid pattern"));

// An `on*=` attribute inside a tag. Quoted values are skipped whole, so a `>`
// or `on` inside them neither ends the tag nor counts as a handler.
static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?i)<(?:[^>"']|"[^"]*"|'[^']*')*?(?:[\s/]|"[^"]*"|'[^']*')(on[a-z]+)\s*="#).expect("valid pattern")
});

static SCRIPT_URI: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?i)\b(javascript|vbscript)\s*:|\b(data)\s*:\s*text/html").expect("valid pattern"));

/// Accept `output` only if it is a non-empty SVG fragment free of active content.
pub fn validate_fragment(output: &str) -> Result<(), OutputViolation> {
  if output.trim().is_empty() {
    return Err(OutputViolation::Empty);
  }
  if !SVG_ELEMENT.is_match(output) {
    return Err(OutputViolation::NoMarkup);
  }
  if SCRIPT_ELEMENT.is_match(output) {
    return Err(OutputViolation::ScriptElement);
  }
  if let Some(caps) = EVENT_HANDLER.captures(output) {
    return Err(OutputViolation::EventHandler(caps[1].to_lowercase()));
  }
  if let Some(caps) = SCRIPT_URI.captures(output) {
    let scheme = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
    return Err(OutputViolation::ScriptUri(scheme.to_lowercase()));
  }
  Ok(())
}
