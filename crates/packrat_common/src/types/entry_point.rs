use arcstr::ArcStr;

use crate::ModuleIdx;

/// A root the chunk partitioner starts from. User-defined entries may span
/// several modules (an entry configured with multiple requests produces one
/// chunk containing all of them, in listed order); dynamic-import entries
/// always have exactly one.
#[derive(Debug)]
pub struct EntryPoint {
  pub name: Option<ArcStr>,
  pub modules: Vec<ModuleIdx>,
  pub kind: EntryPointKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPointKind {
  UserDefined,
  DynamicImport,
}
