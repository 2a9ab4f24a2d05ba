use oxc_index::IndexVec;

use crate::{Module, ModuleIdx};

pub type IndexModules = IndexVec<ModuleIdx, Module>;

#[derive(Debug, Default)]
pub struct ModuleTable {
  pub modules: IndexModules,
}
