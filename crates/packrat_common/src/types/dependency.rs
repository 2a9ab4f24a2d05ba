use std::fmt::Debug;

use arcstr::ArcStr;

use crate::ModuleIdx;

/// A raw dependency carries no resolution state yet; a resolved one points at
/// the target module slot in the table.
pub type RawDependency = Dependency<()>;
pub type ResolvedDependency = Dependency<ModuleIdx>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
  /// Follows the importer into the same chunk.
  Static,
  /// A split point: the target founds its own chunk.
  Dynamic,
}

/// One outgoing edge of the module graph: the request string as written in
/// the source, plus whether it is a static or dynamic (split-point) edge. The
/// context directory is the importer's parent directory and lives on the
/// importing module.
#[derive(Debug, Clone)]
pub struct Dependency<State: Debug> {
  pub state: State,
  pub request: ArcStr,
  pub kind: DependencyKind,
}

impl RawDependency {
  pub fn new(request: impl Into<ArcStr>, kind: DependencyKind) -> Self {
    Self { state: (), request: request.into(), kind }
  }

  pub fn into_resolved(self, module: ModuleIdx) -> ResolvedDependency {
    ResolvedDependency { state: module, request: self.request, kind: self.kind }
  }
}

impl ResolvedDependency {
  pub fn module(&self) -> ModuleIdx {
    self.state
  }
}
