use packrat_utils::indexmap::FxIndexMap;
use serde::{Deserialize, Serialize};

/// Prior run's numeric-id assignments, keyed by stable module id and chunk
/// name. Read before a pass, written once at successful completion; absence
/// means full renumbering from scratch.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct BuildRecord {
  #[serde(default)]
  pub module_ids: FxIndexMap<String, u32>,
  #[serde(default)]
  pub chunk_ids: FxIndexMap<String, u32>,
}

impl BuildRecord {
  pub fn is_empty(&self) -> bool {
    self.module_ids.is_empty() && self.chunk_ids.is_empty()
  }

  pub fn next_module_id(&self) -> u32 {
    self.module_ids.values().max().map_or(0, |max| max + 1)
  }

  pub fn next_chunk_id(&self) -> u32 {
    self.chunk_ids.values().max().map_or(0, |max| max + 1)
  }
}
