//! Rendering a placed script instance on one page.

use tracing::{info, warn};

use crate::context::build_context;
use crate::project::{Project, ScriptInstance};
use crate::sandbox::{ExecutionResult, SandboxOptions, run};

fn find_instance<'p>(project: &'p Project, page_index: usize, instance_id: &str) -> Option<&'p ScriptInstance> {
  project
    .pages
    .get(page_index)?
    .instances
    .iter()
    .find(|instance| instance.id == instance_id)
}

/// Build the context for `instance_id` on the page and run its script.
///
/// A missing instance or script yields a failed result.
pub fn render_instance(
  project: &Project,
  page_index: usize,
  instance_id: &str,
  options: &SandboxOptions,
) -> ExecutionResult {
  let Some(instance) = find_instance(project, page_index, instance_id) else {
    let message = format!("no script instance '{}' on page {}", instance_id, page_index + 1);
    warn!("{}", message);
    return ExecutionResult::failure(message, Vec::new());
  };

  let context = build_context(instance, project, page_index);
  let Some(script) = project.script(&instance.script_id) else {
    let message = format!("instance '{}' refers to unknown script '{}'", instance.id, instance.script_id);
    return ExecutionResult::failure(message, context.warnings);
  };

  info!(instance = %instance.id, script = %script.name, page = page_index + 1, "rendering script instance");
  run(&script.source, &context, options)
}
