//! Shared helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// A scratch directory holding one project snapshot.
pub struct TestEnv {
  pub temp_dir: TempDir,
  pub project_path: PathBuf,
}

impl TestEnv {
  /// Copy a snapshot from `tests/fixtures` into a fresh temp directory.
  pub fn from_fixture(name: &str) -> Self {
    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures").join(name);
    let json = std::fs::read_to_string(&fixture).expect("fixture should be readable");
    Self::from_json(&json)
  }

  pub fn from_json(json: &str) -> Self {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let project_path = temp_dir.path().join("project.json");
    std::fs::write(&project_path, json).expect("failed to write project");
    Self { temp_dir, project_path }
  }

  /// A `deck` command running inside the temp directory with a clean environment.
  pub fn deck_cmd(&self) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_deck"));
    cmd
      .current_dir(self.temp_dir.path())
      .env_remove("RUST_LOG")
      .env_remove("DECKSCRIPT_SCRIPT_TIMEOUT_MS")
      .env_remove("DECKSCRIPT_SCRIPT_MEMORY_LIMIT");
    cmd
  }
}
