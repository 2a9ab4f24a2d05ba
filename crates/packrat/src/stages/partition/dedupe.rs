use packrat_common::{BuildState, IndexModules, ModuleIdx};
use rustc_hash::FxHashMap;

/// Maps every duplicate module (byte-identical transformed source) to the
/// lowest-indexed copy. Only the canonical copy's body is emitted; duplicates
/// render as a reference to it. Empty modules never collapse, there is
/// nothing to save.
pub(crate) fn canonical_map(modules: &IndexModules) -> FxHashMap<ModuleIdx, ModuleIdx> {
  let mut representative: FxHashMap<(u64, usize), Vec<ModuleIdx>> = FxHashMap::default();
  let mut canonical = FxHashMap::default();

  for module in modules {
    let Some(normal) = module.as_normal() else { continue };
    if normal.state != BuildState::Built || normal.source.is_empty() {
      continue;
    }
    let key = (normal.source_hash, normal.source.len());
    let bucket = representative.entry(key).or_default();
    // Hash buckets still compare bytes; a collision must not merge distinct
    // sources.
    let found = bucket.iter().find(|candidate| {
      modules[**candidate].as_normal().is_some_and(|other| other.source == normal.source)
    });
    match found {
      Some(existing) => {
        canonical.insert(normal.idx, *existing);
      }
      None => bucket.push(normal.idx),
    }
  }
  canonical
}

#[cfg(test)]
mod tests {
  use super::*;
  use arcstr::ArcStr;
  use oxc_index::IndexVec;
  use packrat_common::{Module, ModuleId, NormalModule};
  use packrat_utils::xxhash::xxhash_u64;

  fn module(idx: u32, source: &str) -> Module {
    let source: ArcStr = source.into();
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
      is_user_defined_entry: false,
      provided_bindings: Vec::new(),
    }
    .into()
  }

  #[test]
  fn identical_sources_collapse_to_lowest_index() {
    let modules: IndexModules =
      [module(0, "shared()"), module(1, "unique()"), module(2, "shared()")]
        .into_iter()
        .collect();
    let canonical = canonical_map(&modules);
    assert_eq!(canonical.len(), 1);
    assert_eq!(canonical[&ModuleIdx::from_raw(2)], ModuleIdx::from_raw(0));
  }

  #[test]
  fn empty_modules_never_collapse() {
    let modules: IndexModules = [module(0, ""), module(1, "")].into_iter().collect();
    assert!(canonical_map(&modules).is_empty());
  }
}
