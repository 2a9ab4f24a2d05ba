use oxc_index::IndexVec;
use packrat_common::{ChunkIdx, ChunkTable, ModuleIdx};
use rustc_hash::FxHashMap;

/// Final partition of the module graph into chunks, plus everything the
/// emitter needs to render runtime references: numeric ids and the dedupe
/// collapse map.
#[derive(Debug, Default)]
pub struct ChunkGraph {
  pub chunk_table: ChunkTable,
  pub module_to_chunks: IndexVec<ModuleIdx, Vec<ChunkIdx>>,
  /// Numeric runtime id per module appearing in at least one chunk.
  pub module_ids: FxHashMap<ModuleIdx, u32>,
  /// Duplicate module -> canonical copy whose body is emitted.
  pub dedupe_canonical: FxHashMap<ModuleIdx, ModuleIdx>,
}

impl ChunkGraph {
  pub fn canonical(&self, idx: ModuleIdx) -> ModuleIdx {
    self.dedupe_canonical.get(&idx).copied().unwrap_or(idx)
  }

  pub fn module_numeric_id(&self, idx: ModuleIdx) -> Option<u32> {
    self.module_ids.get(&self.canonical(idx)).copied()
  }

  /// The chunk a dynamic import of `idx` must load first: the non-entry
  /// chunk founded by that module, falling back to any chunk containing it.
  pub fn dynamic_chunk_of(&self, idx: ModuleIdx) -> Option<ChunkIdx> {
    let founded = self.chunk_table.iter_enumerated().find_map(|(chunk_idx, chunk)| {
      match &chunk.kind {
        packrat_common::ChunkKind::EntryPoint { is_user_defined: false, entry_modules }
          if entry_modules.contains(&idx) =>
        {
          Some(chunk_idx)
        }
        _ => None,
      }
    });
    founded.or_else(|| self.module_to_chunks.get(idx).and_then(|chunks| chunks.first().copied()))
  }
}
