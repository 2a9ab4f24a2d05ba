pub mod chunk_table;

use arcstr::ArcStr;

use crate::{
  ChunkIdx, ChunkKind, FilenameTemplate, IndexModules, ModuleIdx, NormalizedBundlerOptions,
};

/// An output grouping of modules sharing one emitted artifact. `modules` is
/// kept in execution order; `depends_on` records the chunks this one needs
/// loaded first (commons extraction adds these edges).
#[derive(Debug, Default, Clone)]
pub struct Chunk {
  pub kind: ChunkKind,
  pub name: Option<ArcStr>,
  pub modules: Vec<ModuleIdx>,
  pub numeric_id: Option<u32>,
  pub depends_on: Vec<ChunkIdx>,
  pub content_hash: Option<String>,
  pub filename: Option<String>,
}

impl Chunk {
  pub fn new(name: Option<ArcStr>, kind: ChunkKind, modules: Vec<ModuleIdx>) -> Self {
    Self { name, kind, modules, ..Self::default() }
  }

  pub fn is_entry(&self) -> bool {
    matches!(self.kind, ChunkKind::EntryPoint { .. })
  }

  /// Size estimate used by the merging heuristics: sum of module sizes.
  pub fn size(&self, modules: &IndexModules) -> usize {
    self
      .modules
      .iter()
      .filter_map(|idx| modules[*idx].as_normal())
      .map(crate::NormalModule::size)
      .sum()
  }

  pub fn filename_template(&self, options: &NormalizedBundlerOptions) -> FilenameTemplate {
    let ret = if self.kind.is_user_defined_entry() {
      options.filename.clone()
    } else {
      options.chunk_filename.clone()
    };
    FilenameTemplate::new(ret)
  }
}
