use std::cmp::Reverse;

use oxc_index::IndexVec;
use packrat_common::{BuildRecord, ImporterRecord, IndexModules, ModuleIdx};
use rustc_hash::{FxHashMap, FxHashSet};

use super::WorkingChunk;

/// Numeric id assignment. Ids recorded from a previous run are honored
/// verbatim; everything new fills the gaps in occurrence order (most-imported
/// first) or, with occurrence ordering disabled, in discovery order.
pub(crate) fn assign_module_ids(
  chunks: &[WorkingChunk],
  modules: &IndexModules,
  importers: &IndexVec<ModuleIdx, Vec<ImporterRecord>>,
  records: &BuildRecord,
  canonical: &FxHashMap<ModuleIdx, ModuleIdx>,
  occurrence_order: bool,
) -> FxHashMap<ModuleIdx, u32> {
  let mut members: Vec<ModuleIdx> = chunks
    .iter()
    .flat_map(|chunk| chunk.modules.iter())
    .map(|idx| canonical.get(idx).copied().unwrap_or(*idx))
    .collect::<FxHashSet<_>>()
    .into_iter()
    .collect();
  members.sort_unstable();

  if occurrence_order {
    members.sort_by_key(|idx| {
      let entry_bonus =
        usize::from(modules[*idx].as_normal().is_some_and(|m| m.is_user_defined_entry));
      (Reverse(importers[*idx].len() + entry_bonus), *idx)
    });
  }

  let used: FxHashSet<u32> = records.module_ids.values().copied().collect();
  let mut next = 0u32;
  let mut assigned = FxHashMap::default();
  for idx in members {
    let stable_id = modules[idx].stable_id();
    let id = match records.module_ids.get(stable_id) {
      Some(recorded) => *recorded,
      None => {
        while used.contains(&next) {
          next += 1;
        }
        let fresh = next;
        next += 1;
        fresh
      }
    };
    assigned.insert(idx, id);
  }
  assigned
}

/// Chunk ids, assigned after every merge pass so they describe the final
/// partition. Entry chunks come first; named chunks reuse their recorded id.
pub(crate) fn assign_chunk_ids(
  chunks: &[WorkingChunk],
  records: &BuildRecord,
  occurrence_order: bool,
) -> FxHashMap<u32, u32> {
  let mut reference_counts: FxHashMap<u32, usize> = FxHashMap::default();
  for chunk in chunks {
    for uid in &chunk.depends_on {
      *reference_counts.entry(*uid).or_default() += 1;
    }
  }

  let mut order: Vec<&WorkingChunk> = chunks.iter().collect();
  if occurrence_order {
    order.sort_by_key(|chunk| {
      (
        Reverse(chunk.kind.is_user_defined_entry()),
        Reverse(reference_counts.get(&chunk.uid).copied().unwrap_or(0)),
        chunk.uid,
      )
    });
  } else {
    order.sort_by_key(|chunk| (Reverse(chunk.kind.is_user_defined_entry()), chunk.uid));
  }

  let used: FxHashSet<u32> = chunks
    .iter()
    .filter_map(|chunk| chunk.name.as_ref())
    .filter_map(|name| records.chunk_ids.get(name.as_str()).copied())
    .collect();
  let mut next = 0u32;
  let mut assigned = FxHashMap::default();
  for chunk in order {
    let recorded =
      chunk.name.as_ref().and_then(|name| records.chunk_ids.get(name.as_str()).copied());
    let id = match recorded {
      Some(id) => id,
      None => {
        while used.contains(&next) {
          next += 1;
        }
        let fresh = next;
        next += 1;
        fresh
      }
    };
    assigned.insert(chunk.uid, id);
  }
  assigned
}
