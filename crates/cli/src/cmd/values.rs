//! Implementation of the `deck values` command.

use std::path::Path;

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use deckscript_lib::resolve::{ResolvedValue, Resolver};

use super::{load_project, page_index};

/// Execute the values command.
///
/// Prints the effective value of every named value, one block per page.
/// Failed formulas print as `#ERROR` followed by the reason.
pub fn cmd_values(path: &Path, page: Option<usize>) -> Result<()> {
  let project = load_project(path)?;
  let pages: Vec<usize> = match page {
    Some(page) => vec![page_index(&project, page)?],
    None => (0..project.page_count().max(1)).collect(),
  };

  let resolver = Resolver::new(&project);
  for index in pages {
    let header = format!("Page {}/{}", index + 1, project.page_count());
    println!("{}", header.if_supports_color(Stream::Stdout, |t| t.bold()));

    for (value, resolved) in resolver.resolve_page(index) {
      match &resolved {
        ResolvedValue::Error(err) => println!(
          "  {} = {} ({})",
          value.name,
          resolved.if_supports_color(Stream::Stdout, |t| t.red()),
          err
        ),
        _ => println!("  {} = {}", value.name, resolved),
      }
    }
  }

  Ok(())
}
