//! Run command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn run_prints_fragment() {
  let env = TestEnv::from_fixture("deck.json");

  env
    .deck_cmd()
    .arg("run")
    .arg(&env.project_path)
    .arg("bar")
    .args(["--page", "3"])
    .assert()
    .success()
    .stdout("<rect width=\"180\" height=\"8\"/><text>Summary</text>\n");
}

#[test]
fn run_json_result() {
  let env = TestEnv::from_fixture("deck.json");

  env
    .deck_cmd()
    .arg("run")
    .arg(&env.project_path)
    .arg("bar")
    .arg("--json")
    .assert()
    .success()
    .stdout(predicate::str::contains("\"success\": true"))
    .stdout(predicate::str::contains("\"executionTimeMs\""))
    .stdout(predicate::str::contains("\"consoleOutput\": []"));
}

#[test]
fn run_unknown_instance_fails() {
  let env = TestEnv::from_fixture("deck.json");

  env
    .deck_cmd()
    .arg("run")
    .arg(&env.project_path)
    .arg("missing")
    .assert()
    .failure()
    .stderr(predicate::str::contains("no script instance 'missing' on page 1"));
}

const SCRIPTED: &str = r#"{
  "assets": {
    "s1": { "type": "script", "name": "busy", "source": "function generate()\n  local n = 0\n  for i = 1, 300000 do n = n + i end\n  print('sum', n)\n  return '<circle r=\"3\"/>'\nend" },
    "s2": { "type": "script", "name": "evil", "source": "function generate()\n  return '<g><script>x()</script></g>'\nend" },
    "s3": { "type": "script", "name": "broken", "source": "function generate()\n  local x = \n  return x\nend" }
  },
  "pages": [
    { "id": "p", "instances": [
      { "id": "busy", "scriptId": "s1" },
      { "id": "evil", "scriptId": "s2" },
      { "id": "broken", "scriptId": "s3" }
    ] }
  ]
}"#;

#[test]
fn run_timeout_only_warns() {
  let env = TestEnv::from_json(SCRIPTED);

  env
    .deck_cmd()
    .arg("run")
    .arg(&env.project_path)
    .arg("busy")
    .args(["--timeout-ms", "0"])
    .assert()
    .success()
    .stdout("<circle r=\"3\"/>\n")
    .stderr(predicate::str::contains("exceeding the 0 ms budget"))
    .stderr(predicate::str::contains("console: sum\t45000150000"));
}

#[test]
fn run_timeout_from_environment() {
  let env = TestEnv::from_json(SCRIPTED);

  env
    .deck_cmd()
    .env("DECKSCRIPT_SCRIPT_TIMEOUT_MS", "0")
    .arg("run")
    .arg(&env.project_path)
    .arg("busy")
    .assert()
    .success()
    .stderr(predicate::str::contains("budget"));
}

#[test]
fn run_contract_violation_fails() {
  let env = TestEnv::from_json(SCRIPTED);

  env
    .deck_cmd()
    .arg("run")
    .arg(&env.project_path)
    .arg("evil")
    .assert()
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("contract violation"));
}

#[test]
fn run_syntax_error_reports_line() {
  let env = TestEnv::from_json(SCRIPTED);

  env
    .deck_cmd()
    .arg("run")
    .arg(&env.project_path)
    .arg("broken")
    .assert()
    .failure()
    .stderr(predicate::str::contains("syntax error"))
    .stderr(predicate::str::contains("(line 3)"));
}
