//! Rendering script instances from a loaded snapshot.

use deckscript_lib::sandbox::ErrorKind;
use deckscript_lib::{SandboxOptions, build_context, render_instance};

use super::common::load_fixture;

#[test]
fn bound_instance_renders_on_every_page() {
  let project = load_fixture("deck.json");
  let options = SandboxOptions::default();

  let expected = [
    r#"<rect width="50" height="8"/><text>progress</text>"#,
    r#"<rect width="50" height="8"/><text>detail</text>"#,
    r#"<rect width="180" height="8"/><text>Summary</text>"#,
  ];
  for (page, want) in expected.iter().enumerate() {
    let result = render_instance(&project, page, "bar", &options);
    assert!(result.success, "page {}: {:?}", page, result.error);
    assert_eq!(result.output.as_deref(), Some(*want));
  }
}

#[test]
fn context_reflects_page_state() {
  let project = load_fixture("deck.json");
  let instance = &project.pages[2].instances[0];
  let ctx = build_context(instance, &project, 2);

  assert_eq!(ctx.page_current, 3);
  assert_eq!(ctx.page_total, 3);
  assert_eq!(ctx.values.get("remaining"), Some(&serde_json::json!(10)));
  assert_eq!(ctx.params.get("label"), Some(&serde_json::json!("Summary")));
  assert!(ctx.warnings.is_empty());
}

#[test]
fn edited_script_failure_is_structured() {
  let mut project = load_fixture("deck.json");
  if let Some(deckscript_lib::project::Asset::Script(script)) =
    project.assets.get_mut(&deckscript_lib::project::EntityId::from("s-bar"))
  {
    script.source = "function generate(params)\n  return '<g onload=\"x()\"/>'\nend".to_string();
  }

  let result = render_instance(&project, 0, "bar", &SandboxOptions::default());
  assert!(!result.success);
  assert_eq!(result.error_kind, Some(ErrorKind::Contract));
}
