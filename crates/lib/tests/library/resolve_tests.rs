//! Cross-page resolution over a loaded snapshot.

use deckscript_lib::resolve::{ResolvedValue, Resolver};
use deckscript_lib::{ProjectError, resolve};

use super::common::{fixture_path, load_fixture};

fn page_values(page_index: usize) -> Vec<(String, String)> {
  let project = load_fixture("deck.json");
  Resolver::new(&project)
    .resolve_page(page_index)
    .into_iter()
    .map(|(value, resolved)| (value.name.clone(), resolved.to_string()))
    .collect()
}

fn value_of(values: &[(String, String)], name: &str) -> String {
  values
    .iter()
    .find(|(n, _)| n == name)
    .map(|(_, v)| v.clone())
    .unwrap_or_default()
}

#[test]
fn snapshot_resolves_per_page() {
  let intro = page_values(0);
  assert_eq!(value_of(&intro, "base"), "5");
  assert_eq!(value_of(&intro, "derived"), "6");
  assert_eq!(value_of(&intro, "progress"), "25");
  assert_eq!(value_of(&intro, "remaining"), "75");
  assert_eq!(value_of(&intro, "title"), "Quarterly");

  let detail = page_values(1);
  assert_eq!(value_of(&detail, "base"), "10");
  assert_eq!(value_of(&detail, "derived"), "12");
  assert_eq!(value_of(&detail, "progress"), "25");

  let summary = page_values(2);
  assert_eq!(value_of(&summary, "derived"), "13");
  assert_eq!(value_of(&summary, "progress"), "90");
  assert_eq!(value_of(&summary, "remaining"), "10");
  assert_eq!(value_of(&summary, "title"), "Summary");
}

#[test]
fn inheritance_and_reset_are_isolated() {
  let project = load_fixture("deck.json");
  let progress = project.named_value_by_name("progress").expect("progress exists");
  let base = project.named_value_by_name("base").expect("base exists");

  // Inherit: the nearest earlier override wins, a later one never leaks back.
  assert_eq!(resolve(progress, &project, 1), ResolvedValue::Number(25.0));
  assert_eq!(resolve(progress, &project, 2), ResolvedValue::Number(90.0));
  // Reset: an override on page 0 does not carry to page 1.
  assert_eq!(resolve(base, &project, 0), ResolvedValue::Number(5.0));
  assert_eq!(resolve(base, &project, 1), ResolvedValue::Number(10.0));
}

#[test]
fn out_of_range_page_inherits_from_last_page() {
  let project = load_fixture("deck.json");
  let progress = project.named_value_by_name("progress").expect("progress exists");
  assert_eq!(resolve(progress, &project, 10), ResolvedValue::Number(90.0));
}

#[test]
fn snapshot_passes_validation() {
  let project = load_fixture("deck.json");
  assert!(project.validate().is_ok());
  assert_eq!(project.page_count(), 3);
}

#[test]
fn missing_snapshot_is_an_io_error() {
  let err = deckscript_lib::Project::load(&fixture_path("nope.json")).unwrap_err();
  assert!(matches!(err, ProjectError::Io { .. }));
}

#[test]
fn malformed_snapshot_is_a_json_error() {
  let dir = tempfile::tempdir().expect("tempdir");
  let path = dir.path().join("broken.json");
  std::fs::write(&path, "{ \"assets\": [").expect("write");
  let err = deckscript_lib::Project::load(&path).unwrap_err();
  assert!(matches!(err, ProjectError::Json(_)));
}
