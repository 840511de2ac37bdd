//! Implementation of the `deck check` command.
//!
//! Reports invalid or duplicate value names, formulas that fail on any page,
//! and instances whose script is missing. Risky script patterns are listed as
//! warnings and do not fail the check.

use std::path::Path;

use anyhow::{Result, bail};
use owo_colors::{OwoColorize, Stream};

use deckscript_lib::project::Asset;
use deckscript_lib::resolve::Resolver;
use deckscript_lib::sandbox::scan_risks;

use super::load_project;

/// Execute the check command.
///
/// # Errors
///
/// Fails when the project cannot be loaded or any problem is found.
pub fn cmd_check(path: &Path) -> Result<()> {
  let project = load_project(path)?;
  let mut problems = Vec::new();

  for problem in project.problems() {
    problems.push(problem.to_string());
  }

  let resolver = Resolver::new(&project);
  for index in 0..project.page_count().max(1) {
    for (value, err) in resolver.check(index) {
      problems.push(format!("page {}: '{}': {}", index + 1, value.name, err));
    }
  }

  for (index, page) in project.pages.iter().enumerate() {
    for instance in &page.instances {
      if project.script(&instance.script_id).is_none() {
        problems.push(format!(
          "page {}: instance '{}' refers to unknown script '{}'",
          index + 1,
          instance.id,
          instance.script_id
        ));
      }
    }
  }

  for asset in project.assets.values() {
    if let Asset::Script(script) = asset {
      for warning in scan_risks(&script.source) {
        println!(
          "{} script '{}': {}",
          "warning:".if_supports_color(Stream::Stdout, |t| t.yellow()),
          script.name,
          warning
        );
      }
    }
  }

  for problem in &problems {
    println!("{} {}", "error:".if_supports_color(Stream::Stdout, |t| t.red()), problem);
  }

  if !problems.is_empty() {
    bail!("{} problem(s) found", problems.len());
  }

  println!(
    "{} No problems found",
    "✓".if_supports_color(Stream::Stdout, |t| t.green())
  );
  Ok(())
}
