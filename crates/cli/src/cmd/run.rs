//! Implementation of the `deck run` command.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use owo_colors::{OwoColorize, Stream};

use deckscript_lib::{SandboxOptions, render_instance};

use super::{load_project, page_index};

/// Execute the run command.
///
/// Limits come from the environment (`DECKSCRIPT_SCRIPT_TIMEOUT_MS`,
/// `DECKSCRIPT_SCRIPT_MEMORY_LIMIT`); `--timeout-ms` overrides the budget.
/// The fragment goes to stdout, console output and warnings to stderr.
pub fn cmd_run(path: &Path, instance: &str, page: usize, timeout_ms: Option<u64>, json: bool) -> Result<()> {
  let project = load_project(path)?;
  let index = page_index(&project, page)?;

  let mut options = SandboxOptions::from_env();
  if let Some(millis) = timeout_ms {
    options = options.with_timeout_ms(millis);
  }

  let result = render_instance(&project, index, instance, &options);

  if json {
    let text = serde_json::to_string_pretty(&result).context("Failed to serialize execution result")?;
    println!("{}", text);
  } else {
    for line in &result.debug_info.console_output {
      eprintln!("{} {}", "console:".if_supports_color(Stream::Stderr, |t| t.dimmed()), line);
    }
    for warning in &result.warnings {
      eprintln!("{} {}", "warning:".if_supports_color(Stream::Stderr, |t| t.yellow()), warning);
    }
    if let Some(output) = &result.output {
      println!("{}", output);
    }
    let elapsed = Duration::from_micros((result.execution_time_ms * 1000.0) as u64);
    eprintln!("Ran in {}", humantime::format_duration(elapsed));
  }

  if !result.success {
    let error = result.error.unwrap_or_else(|| "script failed".to_string());
    match result.debug_info.line_number {
      Some(line) => bail!("{} (line {})", error, line),
      None => bail!(error),
    }
  }
  Ok(())
}
