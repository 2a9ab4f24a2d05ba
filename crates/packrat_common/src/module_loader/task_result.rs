use oxc_index::IndexVec;
use packrat_error::BuildDiagnostic;

use crate::{DependencyIdx, ModuleIdx, NormalModule, RawDependency, ResolvedId};

/// Everything a module task hands back to the single-writer loader loop. The
/// loop turns `resolved_deps` into edges (allocating target slots as needed)
/// and only then inserts the module into the table. A `None` resolution is a
/// dropped edge: the request could not be resolved, the failure is in
/// `errors`, and the build carries on without that subtree.
pub struct NormalModuleTaskResult {
  pub idx: ModuleIdx,
  pub module: NormalModule,
  pub raw_dependencies: IndexVec<DependencyIdx, RawDependency>,
  pub resolved_deps: IndexVec<DependencyIdx, Option<ResolvedId>>,
  pub errors: Vec<BuildDiagnostic>,
  pub warnings: Vec<BuildDiagnostic>,
}
