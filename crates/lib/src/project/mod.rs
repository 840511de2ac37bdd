//! Read-only project snapshots.
//!
//! A [`Project`] is handed to this crate by the authoring tool. Nothing here
//! mutates it: every evaluation reads the snapshot and derives values from it.
//!
//! # Snapshot format
//!
//! ```json
//! {
//!   "assets": {
//!     "v1": { "type": "value", "name": "base", "kind": "number", "initialValue": 10 },
//!     "s1": { "type": "script", "name": "bar", "source": "function generate(p) ... end" }
//!   },
//!   "pages": [
//!     { "id": "intro", "overrides": { "v1": { "value": 5 } }, "instances": [] }
//!   ]
//! }
//! ```

mod types;

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use types::{
  Asset, EntityId, Literal, NamedValue, Page, ParamType, ScriptAsset, ScriptInstance, ScriptParam, TransitionPolicy,
  ValueKind, ValueOverride,
};

/// Errors raised while loading or validating a snapshot.
#[derive(Debug, Error)]
pub enum ProjectError {
  #[error("failed to read project '{path}': {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("malformed project snapshot: {0}")]
  Json(#[from] serde_json::Error),

  #[error("duplicate value name '{0}'")]
  DuplicateName(String),

  #[error("value name '{0}' is not a valid identifier")]
  InvalidName(String),
}

/// Returns true if `name` matches `^[a-zA-Z_][a-zA-Z0-9_]*$`.
pub fn is_valid_identifier(name: &str) -> bool {
  let mut chars = name.chars();
  match chars.next() {
    Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
    _ => false,
  }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
  #[serde(default)]
  pub assets: BTreeMap<EntityId, Asset>,
  #[serde(default)]
  pub pages: Vec<Page>,
}

impl Project {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse a JSON snapshot. Asset ids are taken from the map keys.
  pub fn from_json_str(json: &str) -> Result<Self, ProjectError> {
    let mut project: Project = serde_json::from_str(json)?;
    for (id, asset) in project.assets.iter_mut() {
      match asset {
        Asset::Value(v) => v.id = id.clone(),
        Asset::Script(s) => s.id = id.clone(),
      }
    }
    Ok(project)
  }

  pub fn load(path: &Path) -> Result<Self, ProjectError> {
    let json = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json_str(&json)
  }

  pub fn with_value(mut self, value: NamedValue) -> Self {
    self.assets.insert(value.id.clone(), Asset::Value(value));
    self
  }

  pub fn with_script(mut self, script: ScriptAsset) -> Self {
    self.assets.insert(script.id.clone(), Asset::Script(script));
    self
  }

  pub fn with_page(mut self, page: Page) -> Self {
    self.pages.push(page);
    self
  }

  pub fn named_values(&self) -> impl Iterator<Item = &NamedValue> {
    self.assets.values().filter_map(|asset| match asset {
      Asset::Value(v) => Some(v),
      Asset::Script(_) => None,
    })
  }

  pub fn named_value(&self, id: &EntityId) -> Option<&NamedValue> {
    match self.assets.get(id) {
      Some(Asset::Value(v)) => Some(v),
      _ => None,
    }
  }

  pub fn named_value_by_name(&self, name: &str) -> Option<&NamedValue> {
    self.named_values().find(|v| v.name == name)
  }

  pub fn script(&self, id: &EntityId) -> Option<&ScriptAsset> {
    match self.assets.get(id) {
      Some(Asset::Script(s)) => Some(s),
      _ => None,
    }
  }

  pub fn page_count(&self) -> usize {
    self.pages.len()
  }

  /// Every naming problem in the snapshot, in asset order.
  pub fn problems(&self) -> Vec<ProjectError> {
    let mut seen = HashSet::new();
    let mut problems = Vec::new();
    for value in self.named_values() {
      if !is_valid_identifier(&value.name) {
        problems.push(ProjectError::InvalidName(value.name.clone()));
      }
      if !seen.insert(value.name.as_str()) {
        problems.push(ProjectError::DuplicateName(value.name.clone()));
      }
    }
    problems
  }

  /// Fails with the first naming problem, if any.
  pub fn validate(&self) -> Result<(), ProjectError> {
    match self.problems().into_iter().next() {
      Some(problem) => Err(problem),
      None => Ok(()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identifier_rules() {
    assert!(is_valid_identifier("base"));
    assert!(is_valid_identifier("_hidden"));
    assert!(is_valid_identifier("slide2_total"));
    assert!(!is_valid_identifier(""));
    assert!(!is_valid_identifier("2fast"));
    assert!(!is_valid_identifier("has space"));
    assert!(!is_valid_identifier("dash-name"));
    assert!(!is_valid_identifier("caf\u{e9}"));
  }

  #[test]
  fn snapshot_ids_come_from_map_keys() {
    let project = Project::from_json_str(
      r#"{
        "assets": {
          "v1": { "type": "value", "name": "base", "kind": "number", "initialValue": 10 },
          "v2": { "type": "value", "name": "label", "kind": "string", "initialValue": "hi", "transition": "inherit" },
          "s1": { "type": "script", "name": "bar", "source": "return 1",
                  "parameters": [{ "name": "w", "type": "number", "default": 4 }] }
        },
        "pages": [
          { "id": "a", "overrides": { "v1": { "value": 5 }, "v2": {} } },
          { "id": "b" }
        ]
      }"#,
    )
    .unwrap();

    let base = project.named_value(&EntityId::from("v1")).unwrap();
    assert_eq!(base.id, EntityId::from("v1"));
    assert_eq!(base.initial_value, Literal::Number(10.0));
    assert_eq!(base.transition, TransitionPolicy::Reset);

    let label = project.named_value_by_name("label").unwrap();
    assert_eq!(label.transition, TransitionPolicy::Inherit);

    let script = project.script(&EntityId::from("s1")).unwrap();
    assert_eq!(script.parameters[0].kind, ParamType::Number);

    let page = &project.pages[0];
    assert_eq!(page.override_for(&EntityId::from("v1")), Some(&Literal::Number(5.0)));
    // An override entry without a value is not an override.
    assert_eq!(page.override_for(&EntityId::from("v2")), None);
  }

  #[test]
  fn malformed_snapshot_is_an_error() {
    let result = Project::from_json_str(r#"{ "assets": { "v1": { "type": "value" } } }"#);
    assert!(matches!(result, Err(ProjectError::Json(_))));
  }

  #[test]
  fn validate_reports_duplicates_and_bad_names() {
    let project = Project::new()
      .with_value(NamedValue::number("v1", "total", 1.0))
      .with_value(NamedValue::number("v2", "total", 2.0))
      .with_value(NamedValue::number("v3", "9lives", 3.0));

    let problems = project.problems();
    assert_eq!(problems.len(), 2);
    assert!(matches!(project.validate(), Err(ProjectError::DuplicateName(ref n)) if n == "total"));
  }

  #[test]
  fn literal_coercions() {
    assert_eq!(Literal::from("12.5").to_number(), 12.5);
    assert_eq!(Literal::from(" 3 ").to_number(), 3.0);
    assert_eq!(Literal::from("abc").to_number(), 0.0);
    assert_eq!(Literal::from("").to_number(), 0.0);
    assert_eq!(Literal::from("inf").to_number(), 0.0);
    assert_eq!(Literal::from(7.0).to_text(), "7");
    assert_eq!(Literal::from(0.5).to_text(), "0.5");
  }
}
