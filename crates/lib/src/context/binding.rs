//! Parameter-to-variable bindings.
//!
//! A script parameter may be bound to a page counter or to a named value. The
//! source string is classified once, then looked up; anything that is neither
//! is [`BindingSource::Unresolved`] and yields no value.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use crate::formula::format_number;
use crate::project::ParamType;
use crate::resolve::json_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCounter {
  Current,
  Total,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingSource<'a> {
  PageCounter(PageCounter),
  NamedValue(&'a str),
  Unresolved,
}

impl<'a> BindingSource<'a> {
  pub fn classify(source: &'a str, values: &BTreeMap<String, JsonValue>) -> Self {
    match source {
      "page_current" => BindingSource::PageCounter(PageCounter::Current),
      "page_total" => BindingSource::PageCounter(PageCounter::Total),
      name if values.contains_key(name) => BindingSource::NamedValue(name),
      _ => BindingSource::Unresolved,
    }
  }

  pub fn lookup(
    &self,
    page_current: usize,
    page_total: usize,
    values: &BTreeMap<String, JsonValue>,
  ) -> Option<JsonValue> {
    match self {
      BindingSource::PageCounter(PageCounter::Current) => Some(JsonValue::from(page_current)),
      BindingSource::PageCounter(PageCounter::Total) => Some(JsonValue::from(page_total)),
      BindingSource::NamedValue(name) => values.get(*name).cloned(),
      BindingSource::Unresolved => None,
    }
  }
}

/// Convert a bound value to a parameter's declared type where the conversion
/// is lossless in intent; anything else is passed through unchanged.
pub fn coerce_param(kind: ParamType, value: JsonValue) -> JsonValue {
  match (kind, value) {
    (ParamType::Number, JsonValue::String(s)) => match s.trim().parse::<f64>() {
      Ok(n) if n.is_finite() => json_number(n),
      _ => JsonValue::String(s),
    },
    (ParamType::Number, JsonValue::Bool(b)) => JsonValue::from(u8::from(b)),
    (ParamType::String | ParamType::Color, JsonValue::Number(n)) => {
      JsonValue::String(n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()))
    }
    (ParamType::String | ParamType::Color, JsonValue::Bool(b)) => JsonValue::String(b.to_string()),
    (ParamType::Boolean, JsonValue::Number(n)) => JsonValue::Bool(n.as_f64().is_some_and(|n| n != 0.0)),
    (ParamType::Boolean, JsonValue::String(s)) => match s.as_str() {
      "true" => JsonValue::Bool(true),
      "false" => JsonValue::Bool(false),
      _ => JsonValue::String(s),
    },
    (_, value) => value,
  }
}
