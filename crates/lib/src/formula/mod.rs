//! Formula evaluation.
//!
//! A formula is text such as `%{base} * 2 + %p`. Evaluation substitutes every
//! placeholder, checks the result against a constrained arithmetic grammar and
//! computes it. Failures are values, not panics: callers get a
//! [`FormulaResult`] whose error renders as [`ERROR_SENTINEL`].
//!
//! # Modules
//!
//! - [`grammar`]: tokenizer, parser and evaluator for the arithmetic subset
//! - `refs`: placeholder scanning and substitution
//! - `graph`: the dependency index used for cycle detection

mod eval;
pub mod grammar;
mod graph;
mod refs;

use serde::Serialize;
use thiserror::Error;

use crate::consts::ERROR_SENTINEL;
use crate::project::Project;
use crate::resolve::Resolver;

pub use grammar::GrammarError;
pub use graph::DependencyIndex;
pub use refs::{references, substitute_page_tokens, substitute_references, unique_references};

/// Why a formula could not produce a number.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
  #[error("unknown reference '%{{{0}}}'")]
  UnknownReference(String),

  #[error("circular reference: {}", .chain.join(" -> "))]
  CircularReference { chain: Vec<String> },

  #[error("invalid expression '{text}': {source}")]
  Syntax { text: String, source: GrammarError },

  #[error("expression '{text}' does not evaluate to a finite number")]
  NotFinite { text: String },
}

/// Outcome of evaluating a formula, shaped for display.
///
/// `value` is `0.0` whenever `is_error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaResult {
  pub value: f64,
  pub is_error: bool,
  pub error_message: Option<String>,
}

impl FormulaResult {
  /// The text a renderer shows: the number, or `#ERROR`.
  pub fn display(&self) -> String {
    if self.is_error {
      ERROR_SENTINEL.to_string()
    } else {
      format_number(self.value)
    }
  }
}

impl From<Result<f64, FormulaError>> for FormulaResult {
  fn from(result: Result<f64, FormulaError>) -> Self {
    match result {
      Ok(value) => FormulaResult {
        value,
        is_error: false,
        error_message: None,
      },
      Err(err) => FormulaResult {
        value: 0.0,
        is_error: true,
        error_message: Some(err.to_string()),
      },
    }
  }
}

/// Shortest decimal form of `n`, never in exponent notation. Negative zero prints as `0`.
pub fn format_number(n: f64) -> String {
  if n == 0.0 {
    return "0".to_string();
  }
  n.to_string()
}

/// Matches `-?digits(.digits)?`.
pub fn is_plain_decimal(text: &str) -> bool {
  let unsigned = text.strip_prefix('-').unwrap_or(text);
  let (int, frac) = match unsigned.split_once('.') {
    Some((int, frac)) => (int, Some(frac)),
    None => (unsigned, None),
  };
  let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
  digits(int) && frac.is_none_or(digits)
}

/// Evaluate `text` as a formula on the page at `page_index`.
pub fn evaluate_formula(text: &str, project: &Project, page_index: usize) -> FormulaResult {
  Resolver::new(project).evaluate_formula(text, page_index)
}

/// Like [`evaluate_formula`], keeping the failure as a tagged error.
pub fn try_evaluate_formula(text: &str, project: &Project, page_index: usize) -> Result<f64, FormulaError> {
  Resolver::new(project).try_evaluate_formula(text, page_index)
}
