//! Formula command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn formula_uses_page_number() {
  let env = TestEnv::from_fixture("deck.json");

  env
    .deck_cmd()
    .arg("formula")
    .arg(&env.project_path)
    .arg("%{base} + %p")
    .args(["--page", "2"])
    .assert()
    .success()
    .stdout("12\n");
}

#[test]
fn formula_defaults_to_first_page() {
  let env = TestEnv::from_fixture("deck.json");

  env
    .deck_cmd()
    .arg("formula")
    .arg(&env.project_path)
    .arg("%{derived} * %P")
    .assert()
    .success()
    .stdout("18\n");
}

#[test]
fn unknown_reference_fails_with_sentinel() {
  let env = TestEnv::from_fixture("deck.json");

  env
    .deck_cmd()
    .arg("formula")
    .arg(&env.project_path)
    .arg("%{ghost} + 1")
    .assert()
    .failure()
    .stdout("#ERROR\n")
    .stderr(predicate::str::contains("unknown reference '%{ghost}'"));
}
