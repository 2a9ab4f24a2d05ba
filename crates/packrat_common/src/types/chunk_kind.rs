use crate::ModuleIdx;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum ChunkKind {
  EntryPoint { is_user_defined: bool, entry_modules: Vec<ModuleIdx> },
  #[default]
  Common,
}

impl ChunkKind {
  pub fn is_user_defined_entry(&self) -> bool {
    matches!(self, Self::EntryPoint { is_user_defined: true, .. })
  }
}
