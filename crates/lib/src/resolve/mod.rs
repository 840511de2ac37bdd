//! Cross-page value resolution.
//!
//! The effective value of a named value on a page is decided in this order:
//!
//! 1. the page's own override, whatever the transition policy;
//! 2. for `inherit`, the override on the nearest preceding page;
//! 3. the static initial value.
//!
//! The raw value picked is then coerced by kind: formulas are evaluated,
//! numbers parsed (anything non-numeric becomes 0) and strings passed through.

mod overrides;

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::consts::ERROR_SENTINEL;
use crate::formula::{DependencyIndex, FormulaError, format_number};
use crate::project::{Literal, NamedValue, Project, TransitionPolicy, ValueKind};

pub use overrides::OverrideIndex;

/// An effective value, ready for display or for a script context.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedValue {
  Number(f64),
  Text(String),
  /// A formula that failed; displays as `#ERROR`.
  Error(FormulaError),
}

impl ResolvedValue {
  pub fn is_error(&self) -> bool {
    matches!(self, ResolvedValue::Error(_))
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      ResolvedValue::Number(n) => Some(*n),
      _ => None,
    }
  }

  pub fn to_json(&self) -> serde_json::Value {
    match self {
      ResolvedValue::Number(n) => json_number(*n),
      ResolvedValue::Text(s) => serde_json::Value::String(s.clone()),
      ResolvedValue::Error(_) => serde_json::Value::String(ERROR_SENTINEL.to_string()),
    }
  }
}

/// JSON form of a number. Integral values become JSON integers so they reach
/// scripts as Lua integers (`10`, not `10.0`).
pub fn json_number(n: f64) -> serde_json::Value {
  if n.fract() == 0.0 && n.abs() < 9.0e15 {
    return serde_json::Value::from(n as i64);
  }
  serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

impl fmt::Display for ResolvedValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ResolvedValue::Number(n) => f.write_str(&format_number(*n)),
      ResolvedValue::Text(s) => f.write_str(s),
      ResolvedValue::Error(_) => f.write_str(ERROR_SENTINEL),
    }
  }
}

/// Resolves named values against one project snapshot.
///
/// Holds the name lookup and override index so repeated resolutions over the
/// same snapshot do not rebuild them.
pub struct Resolver<'p> {
  project: &'p Project,
  by_name: HashMap<&'p str, &'p NamedValue>,
  overrides: OverrideIndex,
}

impl<'p> Resolver<'p> {
  pub fn new(project: &'p Project) -> Self {
    let mut by_name = HashMap::new();
    for value in project.named_values() {
      // Names are unique in a valid project; otherwise the first one wins.
      by_name.entry(value.name.as_str()).or_insert(value);
    }
    Self {
      project,
      by_name,
      overrides: OverrideIndex::build(project),
    }
  }

  pub fn project(&self) -> &'p Project {
    self.project
  }

  pub fn overrides(&self) -> &OverrideIndex {
    &self.overrides
  }

  pub fn lookup(&self, name: &str) -> Option<&'p NamedValue> {
    self.by_name.get(name).copied()
  }

  /// The raw value in effect for `entity` on a page, before kind coercion.
  pub fn raw_value(&self, entity: &'p NamedValue, page_index: usize) -> &'p Literal {
    let pages = &self.project.pages;

    if let Some(own) = pages.get(page_index).and_then(|p| p.override_for(&entity.id)) {
      return own;
    }

    if entity.transition == TransitionPolicy::Inherit {
      let inherited = self
        .overrides
        .last_before(&entity.id, page_index)
        .and_then(|prev| pages.get(prev))
        .and_then(|p| p.override_for(&entity.id));
      if let Some(value) = inherited {
        return value;
      }
    }

    &entity.initial_value
  }

  /// Effective value of `entity` on the page at `page_index`.
  pub fn resolve(&self, entity: &'p NamedValue, page_index: usize) -> ResolvedValue {
    if entity.kind == ValueKind::Formula {
      let index = self.dependency_index(page_index);
      self.resolve_with(entity, page_index, &index)
    } else {
      self.resolve_with(entity, page_index, &DependencyIndex::new())
    }
  }

  pub(crate) fn resolve_with(
    &self,
    entity: &'p NamedValue,
    page_index: usize,
    index: &DependencyIndex,
  ) -> ResolvedValue {
    let raw = self.raw_value(entity, page_index);
    match entity.kind {
      ValueKind::Number => ResolvedValue::Number(raw.to_number()),
      ValueKind::String => ResolvedValue::Text(raw.to_text()),
      ValueKind::Formula => match self.evaluate_own_formula(entity, &raw.to_text(), page_index, index) {
        Ok(n) => ResolvedValue::Number(n),
        Err(err) => {
          debug!(entity = %entity.name, page = page_index, error = %err, "formula evaluation failed");
          ResolvedValue::Error(err)
        }
      },
    }
  }

  fn evaluate_own_formula(
    &self,
    entity: &NamedValue,
    text: &str,
    page_index: usize,
    index: &DependencyIndex,
  ) -> Result<f64, FormulaError> {
    if let Some(chain) = index.find_cycle(&entity.name) {
      return Err(FormulaError::CircularReference { chain });
    }
    self.evaluate_text(text, page_index, index)
  }

  /// Every named value's effective value on a page, in asset order.
  pub fn resolve_page(&self, page_index: usize) -> Vec<(&'p NamedValue, ResolvedValue)> {
    let index = self.dependency_index(page_index);
    self
      .project
      .named_values()
      .map(|value| (value, self.resolve_with(value, page_index, &index)))
      .collect()
  }

  /// Formula values that fail on a page, with the reason.
  pub fn check(&self, page_index: usize) -> Vec<(&'p NamedValue, FormulaError)> {
    self
      .resolve_page(page_index)
      .into_iter()
      .filter_map(|(value, resolved)| match resolved {
        ResolvedValue::Error(err) => Some((value, err)),
        _ => None,
      })
      .collect()
  }
}

/// Effective value of `entity` on the page at `page_index`.
pub fn resolve<'p>(entity: &'p NamedValue, project: &'p Project, page_index: usize) -> ResolvedValue {
  Resolver::new(project).resolve(entity, page_index)
}
