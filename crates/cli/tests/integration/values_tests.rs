//! Values command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn values_for_one_page() {
  let env = TestEnv::from_fixture("deck.json");

  env
    .deck_cmd()
    .arg("values")
    .arg(&env.project_path)
    .args(["--page", "1"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Page 1/3"))
    .stdout(predicate::str::contains("base = 5"))
    .stdout(predicate::str::contains("derived = 6"))
    .stdout(predicate::str::contains("Page 2/3").not());
}

#[test]
fn values_for_every_page() {
  let env = TestEnv::from_fixture("deck.json");

  env
    .deck_cmd()
    .arg("values")
    .arg(&env.project_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("Page 2/3"))
    .stdout(predicate::str::contains("progress = 25"))
    .stdout(predicate::str::contains("Page 3/3"))
    .stdout(predicate::str::contains("title = Summary"));
}

#[test]
fn broken_formula_shows_sentinel() {
  let env = TestEnv::from_json(
    r#"{
  "assets": {
    "a": { "type": "value", "name": "a", "kind": "formula", "initialValue": "%{b} + 1" },
    "b": { "type": "value", "name": "b", "kind": "formula", "initialValue": "%{a} + 1" }
  },
  "pages": [{ "id": "only" }]
}"#,
  );

  env
    .deck_cmd()
    .arg("values")
    .arg(&env.project_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("a = #ERROR"))
    .stdout(predicate::str::contains("circular reference"));
}

#[test]
fn page_zero_is_rejected() {
  let env = TestEnv::from_fixture("deck.json");

  env
    .deck_cmd()
    .arg("values")
    .arg(&env.project_path)
    .args(["--page", "0"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("out of range"));
}

#[test]
fn missing_project_fails() {
  let env = TestEnv::from_fixture("deck.json");

  env
    .deck_cmd()
    .arg("values")
    .arg("does-not-exist.json")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to load project"));
}
