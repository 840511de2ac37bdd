//! Placeholder scanning and substitution for formula text.
//!
//! `%{name}` references a named value, `%p` is the one-based current page and
//! `%P` the total page count.

use std::collections::HashMap;

/// Every `%{name}` reference in `text`, in order of appearance, duplicates included.
pub fn references(text: &str) -> Vec<&str> {
  let mut names = Vec::new();
  let mut rest = text;
  while let Some(open) = rest.find("%{") {
    let after = &rest[open + 2..];
    let Some(close) = after.find('}') else {
      break;
    };
    if close > 0 {
      names.push(&after[..close]);
      rest = &after[close + 1..];
    } else {
      // `%{}` is not a reference; keep scanning past it.
      rest = &after[1..];
    }
  }
  names
}

/// Distinct references in first-seen order.
pub fn unique_references(text: &str) -> Vec<&str> {
  let mut unique: Vec<&str> = Vec::new();
  for name in references(text) {
    if !unique.contains(&name) {
      unique.push(name);
    }
  }
  unique
}

/// Replace every `%{name}` with its entry in `values`, in a single pass.
///
/// Substituted text is never rescanned, so a value that itself contains a
/// placeholder stays literal. References without an entry are left untouched.
pub fn substitute_references(text: &str, values: &HashMap<&str, String>) -> String {
  let mut out = String::with_capacity(text.len());
  let mut rest = text;
  while let Some(open) = rest.find("%{") {
    let after = &rest[open + 2..];
    match after.find('}') {
      Some(close) if close > 0 => {
        let name = &after[..close];
        out.push_str(&rest[..open]);
        match values.get(name) {
          Some(value) => out.push_str(value),
          None => out.push_str(&rest[open..open + close + 3]),
        }
        rest = &after[close + 1..];
      }
      Some(_) => {
        out.push_str(&rest[..open + 3]);
        rest = &after[1..];
      }
      None => break,
    }
  }
  out.push_str(rest);
  out
}

/// Replace `%p` with the one-based page number and `%P` with the page count.
pub fn substitute_page_tokens(text: &str, page_number: usize, page_total: usize) -> String {
  text
    .replace("%p", &page_number.to_string())
    .replace("%P", &page_total.to_string())
}
