//! End-to-end formula evaluation tests.

use deckscript_lib::evaluate_formula;
use deckscript_lib::formula::FormulaError;
use deckscript_lib::project::{NamedValue, Page};
use deckscript_lib::resolve::Resolver;

use super::common::base_and_derived;

#[test]
fn derived_value_follows_page_number() {
  let project = base_and_derived(3);

  let result = evaluate_formula("%{base} + %p", &project, 0);
  assert!(!result.is_error, "{:?}", result.error_message);
  assert_eq!(result.value, 11.0);

  assert_eq!(evaluate_formula("%{base} + %p", &project, 2).value, 13.0);
  assert_eq!(evaluate_formula("%{derived} * %P", &project, 1).value, 36.0);
}

#[test]
fn override_feeds_dependent_formula() {
  let mut project = base_and_derived(3);
  project.pages[0] = Page::new("p1").with_override("v-base", 5.0);

  let result = evaluate_formula("%{base} + %p", &project, 0);
  assert_eq!(result.value, 6.0);
  // base resets on the next page.
  assert_eq!(evaluate_formula("%{derived}", &project, 1).value, 12.0);
}

#[test]
fn repeated_evaluation_is_idempotent() {
  let project = base_and_derived(3);
  let resolver = Resolver::new(&project);

  let first = resolver.evaluate_formula("(%{derived} - 1) / 2", 1);
  for _ in 0..5 {
    assert_eq!(resolver.evaluate_formula("(%{derived} - 1) / 2", 1), first);
    assert_eq!(evaluate_formula("(%{derived} - 1) / 2", &project, 1), first);
  }
  assert_eq!(first.value, 5.5);
}

#[test]
fn cycles_fail_from_every_member() {
  let project = base_and_derived(1)
    .with_value(NamedValue::formula("a", "a", "%{b} + 1"))
    .with_value(NamedValue::formula("b", "b", "%{a} + 1"))
    .with_value(NamedValue::formula("x", "x", "%{y}"))
    .with_value(NamedValue::formula("y", "y", "%{z}"))
    .with_value(NamedValue::formula("z", "z", "%{x} * 2"))
    .with_value(NamedValue::formula("self_ref", "self_ref", "%{self_ref}"));
  let resolver = Resolver::new(&project);

  for name in ["a", "b", "x", "y", "z", "self_ref"] {
    let entity = resolver.lookup(name).expect("entity exists");
    let resolved = resolver.resolve(entity, 0);
    assert!(resolved.is_error(), "{} should be part of a cycle", name);
    assert_eq!(resolved.to_string(), "#ERROR");
  }

  let problems = resolver.check(0);
  assert_eq!(problems.len(), 6);
  assert!(
    problems
      .iter()
      .all(|(_, err)| matches!(err, FormulaError::CircularReference { .. }))
  );

  // Values outside the cycle still resolve.
  assert_eq!(evaluate_formula("%{derived}", &project, 0).value, 11.0);
}

#[test]
fn grammar_failures_render_sentinel() {
  let project = base_and_derived(1);

  for text in ["", "2 * (3 + )", "((((1)))", ")(((1)))", "%{base} + a", "%{missing} + 1"] {
    let result = evaluate_formula(text, &project, 0);
    assert!(result.is_error, "'{}' should fail", text);
    assert_eq!(result.value, 0.0);
    assert_eq!(result.display(), "#ERROR");
  }

  for (text, expected) in [("1 + 1", 2.0), ("2 * (3 + 4)", 14.0), ("-5 / 2", -2.5), ("1--2", 3.0), ("((((1))))", 1.0)] {
    assert_eq!(evaluate_formula(text, &project, 0).value, expected, "{}", text);
  }
}

#[test]
fn long_reference_chain_evaluates() {
  let project = base_and_derived(1);
  let text = vec!["%{base}"; 20_000].join(" + ");

  let result = evaluate_formula(&text, &project, 0);
  assert!(!result.is_error, "{:?}", result.error_message);
  assert_eq!(result.value, 200_000.0);
}
