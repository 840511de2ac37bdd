use std::collections::{BTreeSet, HashMap};

use crate::project::{EntityId, Project};

/// Which pages carry an explicit override for each named value, in page order.
#[derive(Debug, Default, Clone)]
pub struct OverrideIndex {
  pages: HashMap<EntityId, BTreeSet<usize>>,
}

impl OverrideIndex {
  pub fn build(project: &Project) -> Self {
    let mut index = Self::default();
    for (page_index, page) in project.pages.iter().enumerate() {
      for (entity, ov) in &page.overrides {
        if ov.value.is_some() {
          index.record(entity, page_index);
        }
      }
    }
    index
  }

  pub fn record(&mut self, entity: &EntityId, page_index: usize) {
    self.pages.entry(entity.clone()).or_default().insert(page_index);
  }

  pub fn forget(&mut self, entity: &EntityId, page_index: usize) {
    if let Some(pages) = self.pages.get_mut(entity) {
      pages.remove(&page_index);
      if pages.is_empty() {
        self.pages.remove(entity);
      }
    }
  }

  pub fn has_override(&self, entity: &EntityId, page_index: usize) -> bool {
    self.pages.get(entity).is_some_and(|pages| pages.contains(&page_index))
  }

  /// The nearest page strictly before `page_index` overriding `entity`.
  pub fn last_before(&self, entity: &EntityId, page_index: usize) -> Option<usize> {
    self.pages.get(entity)?.range(..page_index).next_back().copied()
  }
}
