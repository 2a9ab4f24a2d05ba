use arcstr::ArcStr;
use oxc_index::IndexVec;

use crate::{BuildState, DependencyIdx, ModuleId, ModuleIdx, ResolvedDependency};

#[derive(Debug)]
pub struct NormalModule {
  pub idx: ModuleIdx,
  pub id: ModuleId,
  pub stable_id: String,
  pub exec_order: u32,
  pub raw_source: ArcStr,
  /// Final source after the loader chain ran. Immutable once the module is
  /// `Built`.
  pub source: ArcStr,
  /// xxh3 of `raw_source`; drives cache reuse across incremental passes.
  pub raw_source_hash: u64,
  /// xxh3 of `source`; drives dedupe.
  pub source_hash: u64,
  pub dependencies: IndexVec<DependencyIdx, ResolvedDependency>,
  pub state: BuildState,
  pub is_user_defined_entry: bool,
  /// Free identifiers bound to a dependency's exports by a Provide plugin,
  /// rendered into the chunk prelude by the emitter.
  pub provided_bindings: Vec<(String, DependencyIdx)>,
}

impl NormalModule {
  /// Size estimate used by the chunk merging heuristics.
  pub fn size(&self) -> usize {
    self.source.len()
  }

  pub fn static_dependencies(&self) -> impl Iterator<Item = &ResolvedDependency> {
    self.dependencies.iter().filter(|dep| dep.kind == crate::DependencyKind::Static)
  }

  pub fn dynamic_dependencies(&self) -> impl Iterator<Item = &ResolvedDependency> {
    self.dependencies.iter().filter(|dep| dep.kind == crate::DependencyKind::Dynamic)
  }
}
