pub mod external_module;
pub mod normal_module;

use oxc_index::IndexVec;

use crate::{
  BuildState, DependencyIdx, ExternalModule, ModuleIdx, NormalModule, ResolvedDependency,
};

#[derive(Debug)]
pub enum Module {
  Normal(Box<NormalModule>),
  External(Box<ExternalModule>),
}

impl Module {
  pub fn idx(&self) -> ModuleIdx {
    match self {
      Self::Normal(v) => v.idx,
      Self::External(v) => v.idx,
    }
  }

  pub fn exec_order(&self) -> u32 {
    match self {
      Self::Normal(v) => v.exec_order,
      Self::External(v) => v.exec_order,
    }
  }

  pub fn set_exec_order(&mut self, order: u32) {
    match self {
      Self::Normal(v) => v.exec_order = order,
      Self::External(v) => v.exec_order = order,
    }
  }

  pub fn id(&self) -> &str {
    match self {
      Self::Normal(v) => &v.id,
      Self::External(v) => &v.name,
    }
  }

  pub fn stable_id(&self) -> &str {
    match self {
      Self::Normal(v) => &v.stable_id,
      Self::External(v) => &v.name,
    }
  }

  pub fn dependencies(&self) -> &IndexVec<DependencyIdx, ResolvedDependency> {
    match self {
      Self::Normal(v) => &v.dependencies,
      Self::External(v) => &v.dependencies,
    }
  }

  pub fn set_dependencies(&mut self, deps: IndexVec<DependencyIdx, ResolvedDependency>) {
    match self {
      Self::Normal(v) => v.dependencies = deps,
      Self::External(v) => v.dependencies = deps,
    }
  }

  pub fn as_normal(&self) -> Option<&NormalModule> {
    match self {
      Self::Normal(v) => Some(v),
      Self::External(_) => None,
    }
  }

  pub fn as_normal_mut(&mut self) -> Option<&mut NormalModule> {
    match self {
      Self::Normal(v) => Some(v),
      Self::External(_) => None,
    }
  }

  pub fn is_external(&self) -> bool {
    matches!(self, Self::External(..))
  }

  pub fn is_included(&self) -> bool {
    match self {
      Self::Normal(v) => v.state == BuildState::Built,
      Self::External(_) => false,
    }
  }
}

impl From<NormalModule> for Module {
  fn from(module: NormalModule) -> Self {
    Self::Normal(Box::new(module))
  }
}

impl From<ExternalModule> for Module {
  fn from(module: ExternalModule) -> Self {
    Self::External(Box::new(module))
  }
}
