//! Heuristic risk markers.
//!
//! These patterns point at scripts that may never finish or that try to reach
//! around the environment. They are reported as warnings and never block
//! execution.

use std::sync::LazyLock;

use regex::Regex;

struct Marker {
  pattern: Regex,
  message: &'static str,
}

static MARKERS: LazyLock<Vec<Marker>> = LazyLock::new(|| {
  [
    (r"\bwhile\s+true\s+do\b", "possible unbounded loop 'while true do'"),
    (r"\brepeat\b[\s\S]*?\buntil\s+false\b", "possible unbounded loop 'repeat ... until false'"),
    (r"\bfor\b[^\n]*\bmath\.huge\b", "loop bounded by math.huge"),
    (r"\b(?:getmetatable|setmetatable|rawget|rawset|rawequal|rawlen)\b", "metatable or raw table access"),
    (r"\b_G\b|\b_ENV\b", "direct access to the global environment"),
    (r"\b(?:load|loadstring|loadfile|dofile|require)\s*\(", "dynamic code loading"),
    (r"\bstring\.dump\b|:dump\s*\(", "bytecode dump"),
    (r"\bdebug\.", "debug library access"),
  ]
  .into_iter()
  .map(|(pattern, message)| Marker {
    pattern: Regex::new(pattern).expect("valid pattern"),
    message,
  })
  .collect()
});

fn line_of(source: &str, offset: usize) -> usize {
  source[..offset].matches('\n').count() + 1
}

/// Warnings for every risk marker found in `source`, in pattern order.
pub fn scan(source: &str) -> Vec<String> {
  let mut warnings = Vec::new();
  for marker in MARKERS.iter() {
    if let Some(m) = marker.pattern.find(source) {
      warnings.push(format!("{} (line {})", marker.message, line_of(source, m.start())));
    }
  }
  warnings
}
