use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::formula::format_number;

/// Identifier of an asset inside a project.
///
/// Overrides reference named values by id, formulas reference them by name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl fmt::Display for EntityId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for EntityId {
  fn from(id: &str) -> Self {
    EntityId(id.to_string())
  }
}

/// A raw stored value, as authored. Numbers and text are kept apart so that
/// coercion happens only once the entity kind is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
  Number(f64),
  Text(String),
}

impl Literal {
  /// String form used for formula text and string-typed values.
  pub fn to_text(&self) -> String {
    match self {
      Literal::Number(n) => format_number(*n),
      Literal::Text(s) => s.clone(),
    }
  }

  /// Numeric coercion. Anything that does not parse as a finite number is 0.
  pub fn to_number(&self) -> f64 {
    let n = match self {
      Literal::Number(n) => *n,
      Literal::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
    };
    if n.is_finite() { n } else { 0.0 }
  }
}

impl From<f64> for Literal {
  fn from(n: f64) -> Self {
    Literal::Number(n)
  }
}

impl From<&str> for Literal {
  fn from(s: &str) -> Self {
    Literal::Text(s.to_string())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
  String,
  Number,
  Formula,
}

/// What a page without its own override sees.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
  /// Fall back to the initial value.
  #[default]
  Reset,
  /// Carry the nearest preceding override forward.
  Inherit,
}

/// A project-level variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedValue {
  #[serde(default)]
  pub id: EntityId,
  pub name: String,
  pub kind: ValueKind,
  pub initial_value: Literal,
  #[serde(default)]
  pub transition: TransitionPolicy,
}

impl NamedValue {
  pub fn new(id: &str, name: &str, kind: ValueKind, initial_value: impl Into<Literal>) -> Self {
    Self {
      id: EntityId::from(id),
      name: name.to_string(),
      kind,
      initial_value: initial_value.into(),
      transition: TransitionPolicy::Reset,
    }
  }

  pub fn number(id: &str, name: &str, initial: f64) -> Self {
    Self::new(id, name, ValueKind::Number, initial)
  }

  pub fn text(id: &str, name: &str, initial: &str) -> Self {
    Self::new(id, name, ValueKind::String, initial)
  }

  pub fn formula(id: &str, name: &str, text: &str) -> Self {
    Self::new(id, name, ValueKind::Formula, text)
  }

  pub fn with_transition(mut self, transition: TransitionPolicy) -> Self {
    self.transition = transition;
    self
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
  Number,
  #[default]
  String,
  Boolean,
  Color,
}

/// A parameter declared by a script asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptParam {
  pub name: String,
  #[serde(rename = "type", default)]
  pub kind: ParamType,
  #[serde(default)]
  pub default: Option<serde_json::Value>,
}

impl ScriptParam {
  pub fn new(name: &str, kind: ParamType) -> Self {
    Self {
      name: name.to_string(),
      kind,
      default: None,
    }
  }

  pub fn with_default(mut self, default: serde_json::Value) -> Self {
    self.default = Some(default);
    self
  }
}

/// A reusable script body defining `generate(params)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptAsset {
  #[serde(default)]
  pub id: EntityId,
  pub name: String,
  pub source: String,
  #[serde(default)]
  pub parameters: Vec<ScriptParam>,
}

impl ScriptAsset {
  pub fn new(id: &str, name: &str, source: &str) -> Self {
    Self {
      id: EntityId::from(id),
      name: name.to_string(),
      source: source.to_string(),
      parameters: Vec::new(),
    }
  }

  pub fn with_param(mut self, param: ScriptParam) -> Self {
    self.parameters.push(param);
    self
  }
}

/// A placement of a script asset on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptInstance {
  pub id: String,
  pub script_id: EntityId,
  /// Fixed parameter values.
  #[serde(default)]
  pub params: BTreeMap<String, serde_json::Value>,
  /// Parameter name -> variable source (`page_current`, `page_total` or an entity name).
  #[serde(default)]
  pub bindings: BTreeMap<String, String>,
  #[serde(default)]
  pub inject_page_variables: bool,
  #[serde(default)]
  pub inject_value_variables: bool,
}

impl ScriptInstance {
  pub fn new(id: &str, script_id: &str) -> Self {
    Self {
      id: id.to_string(),
      script_id: EntityId::from(script_id),
      params: BTreeMap::new(),
      bindings: BTreeMap::new(),
      inject_page_variables: false,
      inject_value_variables: false,
    }
  }

  pub fn with_param(mut self, name: &str, value: serde_json::Value) -> Self {
    self.params.insert(name.to_string(), value);
    self
  }

  pub fn with_binding(mut self, param: &str, source: &str) -> Self {
    self.bindings.insert(param.to_string(), source.to_string());
    self
  }
}

/// A project asset, tagged by `type` in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Asset {
  Value(NamedValue),
  Script(ScriptAsset),
}

/// A per-page override. An absent `value` means the page has no override.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueOverride {
  #[serde(default)]
  pub value: Option<Literal>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
  #[serde(default)]
  pub id: String,
  #[serde(default)]
  pub overrides: BTreeMap<EntityId, ValueOverride>,
  #[serde(default)]
  pub instances: Vec<ScriptInstance>,
}

impl Page {
  pub fn new(id: &str) -> Self {
    Self {
      id: id.to_string(),
      ..Default::default()
    }
  }

  pub fn with_override(mut self, entity: &str, value: impl Into<Literal>) -> Self {
    self.overrides.insert(
      EntityId::from(entity),
      ValueOverride {
        value: Some(value.into()),
      },
    );
    self
  }

  pub fn with_instance(mut self, instance: ScriptInstance) -> Self {
    self.instances.push(instance);
    self
  }

  /// The page's own override for an entity, if it carries a value.
  pub fn override_for(&self, entity: &EntityId) -> Option<&Literal> {
    self.overrides.get(entity).and_then(|o| o.value.as_ref())
  }
}
