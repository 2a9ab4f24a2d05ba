use packrat_common::{AggressiveMergingOptions, ChunkKind, IndexModules, ModuleIdx};
use rustc_hash::{FxHashMap, FxHashSet};

use super::WorkingChunk;

/// Greedy pairwise merging until at most `max` chunks remain. Each step
/// merges the pair with the smallest combined (shared-counted-once) size;
/// ties break on position so reruns are deterministic.
pub(crate) fn limit_chunk_count(
  chunks: &mut Vec<WorkingChunk>,
  max: usize,
  modules: &IndexModules,
  canonical: &FxHashMap<ModuleIdx, ModuleIdx>,
) {
  while chunks.len() > max.max(1) {
    let mut best: Option<(usize, usize, usize)> = None;
    for left in 0..chunks.len() {
      for right in left + 1..chunks.len() {
        let merged = merged_size(&chunks[left], &chunks[right], modules, canonical);
        if best.is_none_or(|(.., size)| merged < size) {
          best = Some((left, right, merged));
        }
      }
    }
    let Some((left, right, _)) = best else { break };
    merge_pair(chunks, left, right, modules);
  }
}

/// Any chunk below `min_size` merges into whichever partner yields the
/// smallest combined chunk, until none remain (or only one chunk is left).
pub(crate) fn enforce_min_chunk_size(
  chunks: &mut Vec<WorkingChunk>,
  min_size: usize,
  modules: &IndexModules,
  canonical: &FxHashMap<ModuleIdx, ModuleIdx>,
) {
  while chunks.len() > 1 {
    let Some(small) = chunks
      .iter()
      .enumerate()
      .filter(|(_, chunk)| chunk.size(modules, canonical) < min_size)
      .min_by_key(|(position, chunk)| (chunk.size(modules, canonical), *position))
      .map(|(position, _)| position)
    else {
      break;
    };
    let Some(partner) = (0..chunks.len())
      .filter(|position| *position != small)
      .min_by_key(|position| {
        (merged_size(&chunks[small], &chunks[*position], modules, canonical), *position)
      })
    else {
      break;
    };
    let (left, right) = (small.min(partner), small.max(partner));
    merge_pair(chunks, left, right, modules);
  }
}

/// Merges pairs whose overlap saves at least `min_size_reduction` bytes,
/// biggest saving first. With `move_to_parents`, modules not common to the
/// pair are hoisted into the chunks that depend on the originals instead of
/// being carried along.
pub(crate) fn aggressive_merge(
  chunks: &mut Vec<WorkingChunk>,
  options: &AggressiveMergingOptions,
  modules: &IndexModules,
  canonical: &FxHashMap<ModuleIdx, ModuleIdx>,
) {
  loop {
    let mut best: Option<(usize, usize, usize)> = None;
    for left in 0..chunks.len() {
      for right in left + 1..chunks.len() {
        let separate = chunks[left].size(modules, canonical)
          + chunks[right].size(modules, canonical);
        let merged = merged_size(&chunks[left], &chunks[right], modules, canonical);
        let saving = separate.saturating_sub(merged);
        if saving >= options.min_size_reduction
          && best.is_none_or(|(.., best_saving)| saving > best_saving)
        {
          best = Some((left, right, saving));
        }
      }
    }
    let Some((left, right, _)) = best else { break };

    if options.move_to_parents {
      hoist_uncommon_to_parents(chunks, left, right);
    }
    merge_pair(chunks, left, right, modules);
  }
}

fn merged_size(
  a: &WorkingChunk,
  b: &WorkingChunk,
  modules: &IndexModules,
  canonical: &FxHashMap<ModuleIdx, ModuleIdx>,
) -> usize {
  let unique: FxHashSet<ModuleIdx> = a
    .modules
    .iter()
    .chain(b.modules.iter())
    .map(|idx| canonical.get(idx).copied().unwrap_or(*idx))
    .collect();
  unique
    .iter()
    .filter_map(|idx| modules[*idx].as_normal())
    .map(packrat_common::NormalModule::size)
    .sum()
}

/// Modules in exactly one of the pair move up into every chunk depending on
/// that side; with no parent they stay, reachability must survive the merge.
fn hoist_uncommon_to_parents(chunks: &mut [WorkingChunk], left: usize, right: usize) {
  let left_set: FxHashSet<ModuleIdx> = chunks[left].modules.iter().copied().collect();
  let right_set: FxHashSet<ModuleIdx> = chunks[right].modules.iter().copied().collect();

  for (side, other) in [(left, &right_set), (right, &left_set)] {
    let uncommon: Vec<ModuleIdx> =
      chunks[side].modules.iter().copied().filter(|idx| !other.contains(idx)).collect();
    if uncommon.is_empty() {
      continue;
    }
    let side_uid = chunks[side].uid;
    let parents: Vec<usize> = chunks
      .iter()
      .enumerate()
      .filter(|(position, chunk)| *position != side && chunk.depends_on.contains(&side_uid))
      .map(|(position, _)| position)
      .collect();
    if parents.is_empty() {
      continue;
    }
    for parent in parents {
      for module in &uncommon {
        if !chunks[parent].modules.contains(module) {
          chunks[parent].modules.push(*module);
        }
      }
    }
    chunks[side].modules.retain(|idx| !uncommon.contains(idx));
  }
}

/// Merges `right` into `left` and drops `right`. Dependency references to the
/// removed chunk are rewritten onto the survivor.
fn merge_pair(chunks: &mut Vec<WorkingChunk>, left: usize, right: usize, modules: &IndexModules) {
  let removed = chunks.remove(right);
  let survivor = &mut chunks[left];

  survivor.modules.extend(removed.modules);
  survivor.modules.sort_by_key(|idx| (modules[*idx].exec_order(), *idx));
  survivor.modules.dedup();

  if survivor.name.is_none() {
    survivor.name = removed.name;
  }
  survivor.kind = merge_kinds(std::mem::take(&mut survivor.kind), removed.kind);

  let survivor_uid = survivor.uid;
  survivor.depends_on.extend(removed.depends_on);
  survivor.depends_on.sort_unstable();
  survivor.depends_on.dedup();
  survivor.depends_on.retain(|uid| *uid != survivor_uid && *uid != removed.uid);

  for chunk in chunks.iter_mut() {
    for uid in &mut chunk.depends_on {
      if *uid == removed.uid {
        *uid = survivor_uid;
      }
    }
    let own_uid = chunk.uid;
    chunk.depends_on.sort_unstable();
    chunk.depends_on.dedup();
    chunk.depends_on.retain(|uid| *uid != own_uid);
  }
}

/// Merging two entry chunks keeps both entry roots; an entry side always
/// wins over a plain common chunk.
fn merge_kinds(a: ChunkKind, b: ChunkKind) -> ChunkKind {
  match (a, b) {
    (
      ChunkKind::EntryPoint { is_user_defined: left_user, entry_modules: mut left_modules },
      ChunkKind::EntryPoint { is_user_defined: right_user, entry_modules: right_modules },
    ) => {
      left_modules.extend(right_modules);
      left_modules.dedup();
      ChunkKind::EntryPoint {
        is_user_defined: left_user || right_user,
        entry_modules: left_modules,
      }
    }
    (entry @ ChunkKind::EntryPoint { .. }, ChunkKind::Common)
    | (ChunkKind::Common, entry @ ChunkKind::EntryPoint { .. }) => entry,
    (ChunkKind::Common, ChunkKind::Common) => ChunkKind::Common,
  }
}
