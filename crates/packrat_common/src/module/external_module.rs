use arcstr::ArcStr;
use oxc_index::IndexVec;

use crate::{DependencyIdx, ModuleIdx, ResolvedDependency};

/// A dependency satisfied outside the bundle. `name` is what the emitted
/// runtime references (the substitute request an externals rule may have
/// supplied); no source is ever loaded or emitted for it.
#[derive(Debug)]
pub struct ExternalModule {
  pub idx: ModuleIdx,
  pub name: ArcStr,
  pub request: ArcStr,
  pub exec_order: u32,
  pub dependencies: IndexVec<DependencyIdx, ResolvedDependency>,
}

impl ExternalModule {
  pub fn new(idx: ModuleIdx, name: ArcStr, request: ArcStr) -> Self {
    Self { idx, name, request, exec_order: u32::MAX, dependencies: IndexVec::default() }
  }
}
