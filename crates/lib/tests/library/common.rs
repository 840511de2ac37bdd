//! Shared test helpers for library integration tests.

use std::path::PathBuf;

use deckscript_lib::Project;
use deckscript_lib::project::{NamedValue, Page};

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

pub fn load_fixture(name: &str) -> Project {
  Project::load(&fixture_path(name)).expect("fixture should load")
}

/// `base` (number 10, reset) and `derived = %{base} + %p` over `pages` pages.
pub fn base_and_derived(pages: usize) -> Project {
  let mut project = Project::new()
    .with_value(NamedValue::number("v-base", "base", 10.0))
    .with_value(NamedValue::formula("v-derived", "derived", "%{base} + %p"));
  for i in 0..pages {
    project = project.with_page(Page::new(&format!("p{}", i + 1)));
  }
  project
}
