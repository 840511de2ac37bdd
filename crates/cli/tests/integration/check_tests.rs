//! Check command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn clean_project_passes() {
  let env = TestEnv::from_fixture("deck.json");

  env
    .deck_cmd()
    .arg("check")
    .arg(&env.project_path)
    .assert()
    .success()
    .stdout(predicate::str::contains("No problems found"));
}

#[test]
fn problems_fail_the_check() {
  let env = TestEnv::from_json(
    r#"{
  "assets": {
    "v1": { "type": "value", "name": "bad name", "kind": "number", "initialValue": 1 },
    "v2": { "type": "value", "name": "loop", "kind": "formula", "initialValue": "%{loop} + 1" },
    "s1": { "type": "script", "name": "spin", "source": "function generate()\n  while true do end\nend" }
  },
  "pages": [
    { "id": "one", "instances": [{ "id": "i1", "scriptId": "gone" }] }
  ]
}"#,
  );

  env
    .deck_cmd()
    .arg("check")
    .arg(&env.project_path)
    .assert()
    .failure()
    .stdout(predicate::str::contains("'bad name' is not a valid identifier"))
    .stdout(predicate::str::contains("page 1: 'loop': circular reference: loop -> loop"))
    .stdout(predicate::str::contains("unknown script 'gone'"))
    .stdout(predicate::str::contains("warning: script 'spin': possible unbounded loop"))
    .stderr(predicate::str::contains("problem(s) found"));
}
