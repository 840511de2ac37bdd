mod check;
mod formula;
mod run;
mod values;

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use deckscript_lib::Project;

pub use check::cmd_check;
pub use formula::cmd_formula;
pub use run::cmd_run;
pub use values::cmd_values;

pub(crate) fn load_project(path: &Path) -> Result<Project> {
  let project = Project::load(path).with_context(|| format!("Failed to load project: {}", path.display()))?;
  debug!(path = %path.display(), pages = project.page_count(), assets = project.assets.len(), "loaded project");
  Ok(project)
}

/// Convert a 1-based page number from the command line into a page index.
///
/// A project without pages still accepts page 1.
pub(crate) fn page_index(project: &Project, page: usize) -> Result<usize> {
  let last = project.page_count().max(1);
  if page == 0 || page > last {
    bail!("Page {} is out of range (project has {} page(s))", page, project.page_count());
  }
  Ok(page - 1)
}
