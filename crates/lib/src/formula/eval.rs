use std::collections::HashMap;

use tracing::debug;

use super::graph::DependencyIndex;
use super::refs::{substitute_page_tokens, substitute_references, unique_references};
use super::{FormulaError, FormulaResult, format_number, grammar, is_plain_decimal};
use crate::project::ValueKind;
use crate::resolve::{ResolvedValue, Resolver};

impl<'p> Resolver<'p> {
  /// Evaluate ad-hoc formula text on a page. Never fails; errors are folded
  /// into the result.
  pub fn evaluate_formula(&self, text: &str, page_index: usize) -> FormulaResult {
    self.try_evaluate_formula(text, page_index).into()
  }

  pub fn try_evaluate_formula(&self, text: &str, page_index: usize) -> Result<f64, FormulaError> {
    let index = self.dependency_index(page_index);
    self.evaluate_text(text, page_index, &index)
  }

  /// Formula index for a page: every formula-typed value, keyed by name, with
  /// edges to the names its page-effective text references.
  pub fn dependency_index(&self, page_index: usize) -> DependencyIndex {
    let mut index = DependencyIndex::new();
    for value in self.project().named_values().filter(|v| v.kind == ValueKind::Formula) {
      index.add_formula(&value.name, &self.raw_value(value, page_index).to_text());
    }
    index
  }

  pub(crate) fn evaluate_text(
    &self,
    text: &str,
    page_index: usize,
    index: &DependencyIndex,
  ) -> Result<f64, FormulaError> {
    let mut values: HashMap<&str, String> = HashMap::new();

    for name in unique_references(text) {
      let entity = self
        .lookup(name)
        .ok_or_else(|| FormulaError::UnknownReference(name.to_string()))?;

      if entity.kind == ValueKind::Formula {
        if let Some(chain) = index.find_cycle(name) {
          return Err(FormulaError::CircularReference { chain });
        }
      }

      let value = match self.resolve_with(entity, page_index, index) {
        ResolvedValue::Error(err) => return Err(err),
        resolved => resolved.to_string(),
      };
      values.insert(name, value);
    }

    let substituted = substitute_references(text, &values);
    let substituted = substitute_page_tokens(&substituted, page_index + 1, self.project().page_count());

    let value = grammar::evaluate(&substituted).map_err(|source| FormulaError::Syntax {
      text: substituted.clone(),
      source,
    })?;

    if !value.is_finite() || !is_plain_decimal(&format_number(value)) {
      return Err(FormulaError::NotFinite { text: substituted });
    }

    debug!(formula = %text, expanded = %substituted, value, "evaluated formula");
    Ok(value)
  }
}
