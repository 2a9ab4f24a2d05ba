use packrat_common::{ChunkKind, CommonsChunkOptions, IndexModules, ModuleIdx};
use rustc_hash::FxHashMap;

use super::WorkingChunk;

/// Moves modules shared by enough of the selected chunks into a fresh common
/// chunk, which the selected chunks then depend on. Configurations apply in
/// listed order; a later one may extract from an earlier one's result.
pub(crate) fn extract_commons(
  chunks: &mut Vec<WorkingChunk>,
  configs: &[CommonsChunkOptions],
  modules: &IndexModules,
  next_uid: &mut u32,
) {
  for config in configs {
    let selected: Vec<usize> = chunks
      .iter()
      .enumerate()
      .filter(|(_, chunk)| match &config.chunks {
        Some(names) => {
          chunk.name.as_ref().is_some_and(|name| names.iter().any(|n| n == name.as_str()))
        }
        None => chunk.kind.is_user_defined_entry(),
      })
      .map(|(position, _)| position)
      .collect();
    if selected.len() < 2 {
      continue;
    }

    let min_count = config.min_count.unwrap_or(2) as usize;
    let mut occurrences: FxHashMap<ModuleIdx, usize> = FxHashMap::default();
    for &position in &selected {
      for module in &chunks[position].modules {
        *occurrences.entry(*module).or_default() += 1;
      }
    }
    let mut moved: Vec<ModuleIdx> = occurrences
      .iter()
      .filter(|(_, count)| **count >= min_count)
      .map(|(module, _)| *module)
      .collect();
    if moved.is_empty() {
      continue;
    }
    moved.sort_by_key(|idx| (modules[*idx].exec_order(), *idx));

    let uid = *next_uid;
    *next_uid += 1;
    for &position in &selected {
      chunks[position].modules.retain(|module| !moved.contains(module));
      chunks[position].depends_on.push(uid);
    }
    chunks.push(WorkingChunk {
      uid,
      name: Some(config.name.as_str().into()),
      kind: ChunkKind::Common,
      modules: moved,
      depends_on: Vec::new(),
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use arcstr::ArcStr;
  use oxc_index::IndexVec;
  use packrat_common::{BuildState, Module, ModuleId, NormalModule};
  use packrat_utils::xxhash::xxhash_u64;

  fn module(idx: u32) -> Module {
    let source: ArcStr = format!("mod{idx}()").into();
    NormalModule {
      idx: ModuleIdx::from_raw(idx),
      id: ModuleId::new(format!("/app/{idx}.js")),
      stable_id: format!("{idx}.js"),
      exec_order: idx,
      raw_source: source.clone(),
      raw_source_hash: xxhash_u64(source.as_bytes()),
      source_hash: xxhash_u64(source.as_bytes()),
      source,
      dependencies: IndexVec::default(),
      state: BuildState::Built,
      is_user_defined_entry: true,
      provided_bindings: Vec::new(),
    }
    .into()
  }

  fn entry_chunk(uid: u32, name: &str, members: &[u32]) -> WorkingChunk {
    WorkingChunk {
      uid,
      name: Some(name.into()),
      kind: ChunkKind::EntryPoint {
        is_user_defined: true,
        entry_modules: vec![ModuleIdx::from_raw(members[0])],
      },
      modules: members.iter().map(|idx| ModuleIdx::from_raw(*idx)).collect(),
      depends_on: Vec::new(),
    }
  }

  #[test]
  fn shared_modules_move_to_the_commons_chunk() {
    let modules: IndexModules = (0..4u32).map(module).collect();
    let mut chunks = vec![entry_chunk(0, "a", &[0, 2]), entry_chunk(1, "b", &[1, 2, 3])];
    let config = CommonsChunkOptions {
      name: "commons".to_string(),
      chunks: None,
      min_count: None,
    };
    let mut next_uid = 2;
    extract_commons(&mut chunks, &[config], &modules, &mut next_uid);

    assert_eq!(chunks.len(), 3);
    let commons = &chunks[2];
    assert_eq!(commons.modules, [ModuleIdx::from_raw(2)]);
    assert!(chunks[0].modules.iter().all(|idx| *idx != ModuleIdx::from_raw(2)));
    assert_eq!(chunks[0].depends_on, [commons.uid]);
    assert_eq!(chunks[1].depends_on, [commons.uid]);
  }

  #[test]
  fn min_count_above_overlap_moves_nothing() {
    let modules: IndexModules = (0..3u32).map(module).collect();
    let mut chunks = vec![entry_chunk(0, "a", &[0, 2]), entry_chunk(1, "b", &[1, 2])];
    let config = CommonsChunkOptions {
      name: "commons".to_string(),
      chunks: None,
      min_count: Some(3),
    };
    let mut next_uid = 2;
    extract_commons(&mut chunks, &[config], &modules, &mut next_uid);
    assert_eq!(chunks.len(), 2);
  }
}
