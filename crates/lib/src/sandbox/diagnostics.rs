//! Turning Lua errors into author-facing diagnostics.

use std::sync::LazyLock;

use mlua::prelude::*;
use regex::Regex;

use crate::consts::SCRIPT_CHUNK_NAME;

// Lua renders the chunk as `[string "script"]`, or verbatim when named `=script`.
static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
  let name = regex::escape(SCRIPT_CHUNK_NAME);
  Regex::new(&format!(r#"(?:\[string "{name}"\]|\b{name}):(\d+):"#)).expect("valid pattern")
});

static NEAR_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"near '([^']+)'").expect("valid pattern"));

const TRACEBACK_MARKER: &str = "\nstack traceback:";

/// A Lua error reduced to a message, a location and an optional traceback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
  pub message: String,
  pub line: Option<u32>,
  pub column: Option<u32>,
  pub traceback: Option<String>,
}

fn split_traceback(text: &str) -> (String, Option<String>) {
  match text.find(TRACEBACK_MARKER) {
    Some(at) => (
      text[..at].to_string(),
      Some(text[at + 1..].trim_end().to_string()),
    ),
    None => (text.to_string(), None),
  }
}

/// First line in the script chunk mentioned by `text`.
pub fn script_line(text: &str) -> Option<u32> {
  LOCATION.captures(text).and_then(|caps| caps[1].parse().ok())
}

/// One-based column of the token a syntax error reports as `near '<tok>'`.
fn column_hint(source: &str, line: Option<u32>, message: &str) -> Option<u32> {
  let line = source.lines().nth(line?.checked_sub(1)? as usize)?;
  let token = NEAR_TOKEN.captures(message)?.get(1)?.as_str();
  line.find(token).map(|at| line[..at].chars().count() as u32 + 1)
}

pub fn describe(err: &LuaError, source: &str) -> Diagnostic {
  let (message, traceback) = match err {
    LuaError::SyntaxError { message, .. } => (message.clone(), None),
    LuaError::RuntimeError(text) => split_traceback(text),
    LuaError::CallbackError { traceback, cause } => {
      let inner = describe(cause, source);
      (inner.message, Some(traceback.clone()))
    }
    LuaError::MemoryError(text) => (format!("memory limit exceeded: {}", text), None),
    other => (other.to_string(), None),
  };

  let line = script_line(&message).or_else(|| traceback.as_deref().and_then(script_line));
  let column = match err {
    LuaError::SyntaxError { .. } => column_hint(source, line, &message),
    _ => None,
  };

  Diagnostic {
    message,
    line,
    column,
    traceback,
  }
}
