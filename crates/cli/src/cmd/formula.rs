//! Implementation of the `deck formula` command.

use std::path::Path;

use anyhow::{Result, bail};

use deckscript_lib::evaluate_formula;

use super::{load_project, page_index};

/// Execute the formula command.
///
/// Prints the formula's value, or `#ERROR` and a failing exit status.
pub fn cmd_formula(path: &Path, text: &str, page: usize) -> Result<()> {
  let project = load_project(path)?;
  let index = page_index(&project, page)?;

  let result = evaluate_formula(text, &project, index);
  println!("{}", result.display());

  if let Some(message) = result.error_message {
    bail!(message);
  }
  Ok(())
}
