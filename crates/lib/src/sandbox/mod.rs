//! Sandboxed execution of user scripts.
//!
//! Every call gets its own Lua state. The chunk runs against a fresh
//! allow-list environment (see [`globals`]), then its `generate(params)`
//! function is called and the returned SVG fragment is validated.
//!
//! Failures never escape as `Err`: the outcome is always an
//! [`ExecutionResult`], with captured console output and warnings attached.

mod convert;
mod diagnostics;
mod globals;
mod lint;
mod validate;

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use mlua::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::consts::{
  DEFAULT_SCRIPT_MEMORY_LIMIT, DEFAULT_SCRIPT_TIMEOUT_MS, ENV_SCRIPT_MEMORY_LIMIT, ENV_SCRIPT_TIMEOUT_MS, GENERATOR_FN,
  SCRIPT_CHUNK_NAME,
};
use crate::context::ExecutionContext;

pub use convert::{json_to_lua_value, lua_value_to_json};
pub use diagnostics::Diagnostic;
pub use globals::Console;
pub use lint::scan as scan_risks;
pub use validate::{OutputViolation, validate_fragment};

/// Limits applied to one script invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxOptions {
  /// Advisory wall-clock budget; overruns produce a warning only.
  pub timeout: Duration,
  pub memory_limit: usize,
}

impl Default for SandboxOptions {
  fn default() -> Self {
    Self {
      timeout: Duration::from_millis(DEFAULT_SCRIPT_TIMEOUT_MS),
      memory_limit: DEFAULT_SCRIPT_MEMORY_LIMIT,
    }
  }
}

impl SandboxOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn with_timeout_ms(self, millis: u64) -> Self {
    self.with_timeout(Duration::from_millis(millis))
  }

  pub fn with_memory_limit(mut self, bytes: usize) -> Self {
    self.memory_limit = bytes;
    self
  }

  /// Defaults overridden by `DECKSCRIPT_SCRIPT_TIMEOUT_MS` and
  /// `DECKSCRIPT_SCRIPT_MEMORY_LIMIT`. Unparseable values are logged and ignored.
  pub fn from_env() -> Self {
    let mut options = Self::default();
    if let Some(millis) = read_env::<u64>(ENV_SCRIPT_TIMEOUT_MS) {
      options.timeout = Duration::from_millis(millis);
    }
    if let Some(bytes) = read_env::<usize>(ENV_SCRIPT_MEMORY_LIMIT) {
      options.memory_limit = bytes;
    }
    options
  }
}

fn read_env<T>(name: &str) -> Option<T>
where
  T: FromStr,
  T::Err: fmt::Display,
{
  let raw = std::env::var(name).ok()?;
  match raw.trim().parse() {
    Ok(value) => Some(value),
    Err(err) => {
      warn!(var = name, value = %raw, error = %err, "ignoring invalid setting");
      None
    }
  }
}

/// Category of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  Empty,
  Syntax,
  Runtime,
  MissingGenerator,
  Contract,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
  #[error("script body is empty")]
  Empty,

  #[error("syntax error: {}", .0.message)]
  Syntax(Diagnostic),

  #[error("runtime error: {}", .0.message)]
  Runtime(Diagnostic),

  #[error("script must define a 'generate(params)' function")]
  MissingGenerator,

  #[error("contract violation: {0}")]
  Contract(#[from] OutputViolation),
}

impl ScriptError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      ScriptError::Empty => ErrorKind::Empty,
      ScriptError::Syntax(_) => ErrorKind::Syntax,
      ScriptError::Runtime(_) => ErrorKind::Runtime,
      ScriptError::MissingGenerator => ErrorKind::MissingGenerator,
      ScriptError::Contract(_) => ErrorKind::Contract,
    }
  }

  fn diagnostic(&self) -> Option<&Diagnostic> {
    match self {
      ScriptError::Syntax(diag) | ScriptError::Runtime(diag) => Some(diag),
      _ => None,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
  pub line_number: Option<u32>,
  pub column_number: Option<u32>,
  pub stack_trace: Option<String>,
  pub console_output: Vec<String>,
}

/// Outcome of one script invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
  pub success: bool,
  pub output: Option<String>,
  pub error: Option<String>,
  pub error_kind: Option<ErrorKind>,
  pub execution_time_ms: f64,
  pub warnings: Vec<String>,
  pub debug_info: DebugInfo,
}

impl ExecutionResult {
  fn finish(outcome: Result<String, ScriptError>, elapsed: Duration, warnings: Vec<String>, console: &Console) -> Self {
    let mut debug_info = DebugInfo {
      console_output: console.lines(),
      ..Default::default()
    };
    let execution_time_ms = elapsed.as_secs_f64() * 1000.0;

    match outcome {
      Ok(output) => Self {
        success: true,
        output: Some(output),
        error: None,
        error_kind: None,
        execution_time_ms,
        warnings,
        debug_info,
      },
      Err(err) => {
        if let Some(diag) = err.diagnostic() {
          debug_info.line_number = diag.line;
          debug_info.column_number = diag.column;
          debug_info.stack_trace = diag.traceback.clone();
        }
        Self {
          success: false,
          output: None,
          error: Some(err.to_string()),
          error_kind: Some(err.kind()),
          execution_time_ms,
          warnings,
          debug_info,
        }
      }
    }
  }

  /// A failed result for problems found before any script ran.
  pub fn failure(error: impl Into<String>, warnings: Vec<String>) -> Self {
    Self {
      success: false,
      output: None,
      error: Some(error.into()),
      error_kind: None,
      execution_time_ms: 0.0,
      warnings,
      debug_info: DebugInfo::default(),
    }
  }
}

/// Run `source` against `context` with default limits.
pub fn run_default(source: &str, context: &ExecutionContext) -> ExecutionResult {
  run(source, context, &SandboxOptions::default())
}

/// Run `source` and return its validated fragment or a structured failure.
pub fn run(source: &str, context: &ExecutionContext, options: &SandboxOptions) -> ExecutionResult {
  let started = Instant::now();
  let console = Console::new();
  let mut warnings = context.warnings.clone();

  let outcome = execute(source, context, options, &console, &mut warnings);
  let elapsed = started.elapsed();

  match &outcome {
    Ok(output) => debug!(elapsed_ms = elapsed.as_millis() as u64, bytes = output.len(), "script succeeded"),
    Err(err) => debug!(elapsed_ms = elapsed.as_millis() as u64, kind = ?err.kind(), error = %err, "script failed"),
  }
  ExecutionResult::finish(outcome, elapsed, warnings, &console)
}

/// Run with a custom timeout and otherwise default limits.
pub fn run_with_timeout(source: &str, context: &ExecutionContext, timeout: Duration) -> ExecutionResult {
  run(source, context, &SandboxOptions::default().with_timeout(timeout))
}

fn execute(
  source: &str,
  context: &ExecutionContext,
  options: &SandboxOptions,
  console: &Console,
  warnings: &mut Vec<String>,
) -> Result<String, ScriptError> {
  if source.trim().is_empty() {
    return Err(ScriptError::Empty);
  }

  let runtime = |err: LuaError| ScriptError::Runtime(diagnostics::describe(&err, source));

  let lua = Lua::new_with(
    LuaStdLib::MATH | LuaStdLib::STRING | LuaStdLib::TABLE | LuaStdLib::UTF8,
    LuaOptions::default(),
  )
  .map_err(runtime)?;
  lua.set_memory_limit(options.memory_limit).map_err(runtime)?;

  lua
    .load(source)
    .set_name(SCRIPT_CHUNK_NAME)
    .into_function()
    .map_err(|err| ScriptError::Syntax(diagnostics::describe(&err, source)))?;

  for warning in lint::scan(source) {
    warn!(warning = %warning, "risky script pattern");
    warnings.push(warning);
  }

  let env = globals::build_environment(&lua, console, context).map_err(runtime)?;
  let chunk = lua
    .load(source)
    .set_name(SCRIPT_CHUNK_NAME)
    .set_environment(env.clone())
    .into_function()
    .map_err(runtime)?;

  let started = Instant::now();
  let returned: LuaValue = chunk.call(()).map_err(runtime)?;
  let generator = match env.raw_get::<LuaValue>(GENERATOR_FN).map_err(runtime)? {
    LuaValue::Function(f) => f,
    _ => match returned {
      LuaValue::Function(f) => f,
      _ => return Err(ScriptError::MissingGenerator),
    },
  };
  let params = env.raw_get::<LuaValue>("params").map_err(runtime)?;
  let output: LuaValue = generator.call(params).map_err(runtime)?;

  let elapsed = started.elapsed();
  if elapsed > options.timeout {
    let message = format!(
      "script ran for {} ms, exceeding the {} ms budget",
      elapsed.as_millis(),
      options.timeout.as_millis()
    );
    warn!(elapsed_ms = elapsed.as_millis() as u64, budget_ms = options.timeout.as_millis() as u64, "script overran its time budget");
    warnings.push(message);
  }

  let text = match output {
    LuaValue::String(s) => s.to_str().map_err(runtime)?.to_string(),
    other => return Err(OutputViolation::NotAString(other.type_name().to_string()).into()),
  };
  validate_fragment(&text)?;
  Ok(text)
}
