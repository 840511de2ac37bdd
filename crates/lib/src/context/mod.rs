//! Execution context construction.
//!
//! Assembles the variable namespace a script instance sees on a page:
//!
//! - `page_current`: one-based page number (never below 1)
//! - `page_total`: number of pages
//! - `values`: every named value with a usable name, resolved for the page
//! - `params`: declared defaults, then fixed instance values, then bindings
//!
//! Construction never fails. Problems (bad names, unresolvable bindings, an
//! out-of-range page) are logged and collected in
//! [`ExecutionContext::warnings`].

mod binding;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::consts::{CONTEXT_NAMES, LUA_KEYWORDS};
use crate::project::{Project, ScriptInstance, is_valid_identifier};
use crate::resolve::Resolver;

pub use binding::{BindingSource, PageCounter, coerce_param};

/// Variables made available to one script invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
  pub page_current: usize,
  pub page_total: usize,
  pub values: BTreeMap<String, JsonValue>,
  pub params: BTreeMap<String, JsonValue>,
  /// Additional top-level names, shadowing built-ins of the same name.
  pub globals: BTreeMap<String, JsonValue>,
  pub warnings: Vec<String>,
}

impl ExecutionContext {
  pub fn new(page_current: usize, page_total: usize) -> Self {
    Self {
      page_current: page_current.max(1),
      page_total,
      ..Default::default()
    }
  }

  pub fn with_param(mut self, name: &str, value: JsonValue) -> Self {
    self.params.insert(name.to_string(), value);
    self
  }

  pub fn with_value(mut self, name: &str, value: JsonValue) -> Self {
    self.values.insert(name.to_string(), value);
    self
  }

  pub fn with_global(mut self, name: &str, value: JsonValue) -> Self {
    self.globals.insert(name.to_string(), value);
    self
  }

  /// The flattened namespace in merge order. Later entries shadow earlier ones.
  pub fn variables(&self) -> Vec<(&str, JsonValue)> {
    let mut vars: Vec<(&str, JsonValue)> = self.globals.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
    vars.push(("page_current", JsonValue::from(self.page_current)));
    vars.push(("page_total", JsonValue::from(self.page_total)));
    vars.push((
      "values",
      JsonValue::Object(self.values.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
    ));
    vars.push((
      "params",
      JsonValue::Object(self.params.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
    ));
    vars
  }

  fn warn(&mut self, message: String) {
    warn!("{}", message);
    self.warnings.push(message);
  }
}

/// Whether a named value can be exposed to scripts under its own name.
pub fn is_bindable_name(name: &str) -> bool {
  is_valid_identifier(name) && !LUA_KEYWORDS.contains(&name) && !CONTEXT_NAMES.contains(&name)
}

/// Build the namespace for `instance` on the page at `page_index`.
pub fn build_context(instance: &ScriptInstance, project: &Project, page_index: usize) -> ExecutionContext {
  let page_total = project.page_count();
  let mut ctx = ExecutionContext::new(page_index + 1, page_total);

  if page_index >= page_total {
    ctx.warn(format!("page index {} is out of range for {} page(s)", page_index, page_total));
  }

  let resolver = Resolver::new(project);
  for (value, resolved) in resolver.resolve_page(page_index) {
    if !is_bindable_name(&value.name) {
      ctx.warn(format!("value '{}' is not usable from scripts and was skipped", value.name));
      continue;
    }
    ctx.values.insert(value.name.clone(), resolved.to_json());
  }

  let script = project.script(&instance.script_id);
  if script.is_none() {
    ctx.warn(format!(
      "instance '{}' refers to unknown script '{}'",
      instance.id, instance.script_id
    ));
  }

  if let Some(script) = script {
    for param in &script.parameters {
      if let Some(default) = &param.default {
        ctx.params.insert(param.name.clone(), default.clone());
      }
    }
  }
  for (name, value) in &instance.params {
    ctx.params.insert(name.clone(), value.clone());
  }

  for (param, source) in &instance.bindings {
    let found = BindingSource::classify(source, &ctx.values).lookup(ctx.page_current, ctx.page_total, &ctx.values);
    match found {
      Some(value) => {
        let declared = script.and_then(|s| s.parameters.iter().find(|p| &p.name == param));
        let value = match declared {
          Some(p) => coerce_param(p.kind, value),
          None => value,
        };
        debug!(param = %param, source = %source, "bound parameter");
        ctx.params.insert(param.clone(), value);
      }
      None => ctx.warn(format!(
        "parameter '{}' is bound to unknown source '{}'; keeping its fixed value",
        param, source
      )),
    }
  }

  if instance.inject_page_variables {
    ctx
      .params
      .entry("page_current".to_string())
      .or_insert(JsonValue::from(ctx.page_current));
    ctx
      .params
      .entry("page_total".to_string())
      .or_insert(JsonValue::from(ctx.page_total));
  }
  if instance.inject_value_variables {
    ctx.globals = ctx.values.clone();
  }

  ctx
}
