mod commons_chunk;
mod dedupe;
mod merge_chunks;
mod occurrence_order;

use arcstr::ArcStr;
use oxc_index::IndexVec;
use packrat_common::{
  BuildRecord, Chunk, ChunkIdx, ChunkKind, ChunkTable, EntryPoint, EntryPointKind, ImporterRecord,
  IndexModules, ModuleIdx, NormalizedBundlerOptions,
};
use packrat_error::BuildDiagnostic;
use packrat_plugin::{ChunkOptimizeArgs, ChunkSummary, PluginDriver};
use rustc_hash::{FxHashMap, FxHashSet};

/// Mutable chunk representation the optimization passes work on. Chunks are
/// addressed by `uid` (stable across merges and removals) and only converted
/// to table indices once the set is final.
pub(crate) struct WorkingChunk {
  pub uid: u32,
  pub name: Option<ArcStr>,
  pub kind: ChunkKind,
  pub modules: Vec<ModuleIdx>,
  pub depends_on: Vec<u32>,
}

impl WorkingChunk {
  /// Size over canonical copies, so deduped duplicates count once.
  pub fn size(
    &self,
    modules: &IndexModules,
    canonical: &FxHashMap<ModuleIdx, ModuleIdx>,
  ) -> usize {
    let unique: FxHashSet<ModuleIdx> =
      self.modules.iter().map(|idx| canonical.get(idx).copied().unwrap_or(*idx)).collect();
    unique
      .iter()
      .filter_map(|idx| modules[*idx].as_normal())
      .map(packrat_common::NormalModule::size)
      .sum()
  }
}

pub struct PartitionStage<'a> {
  options: &'a NormalizedBundlerOptions,
  modules: &'a IndexModules,
  importers: &'a IndexVec<ModuleIdx, Vec<ImporterRecord>>,
  records: &'a BuildRecord,
}

pub struct PartitionOutput {
  pub graph: crate::graph::ChunkGraph,
  pub errors: Vec<BuildDiagnostic>,
}

impl<'a> PartitionStage<'a> {
  pub fn new(
    options: &'a NormalizedBundlerOptions,
    modules: &'a IndexModules,
    importers: &'a IndexVec<ModuleIdx, Vec<ImporterRecord>>,
    records: &'a BuildRecord,
  ) -> Self {
    Self { options, modules, importers, records }
  }

  /// Passes run in a fixed order regardless of how the optimizations were
  /// declared: dedupe, module ids, commons extraction, limit/min-size
  /// merging, aggressive merging, chunk ids.
  pub fn partition(
    &self,
    entry_points: &[EntryPoint],
    plugins: &PluginDriver,
  ) -> PartitionOutput {
    let mut errors = Vec::new();
    let mut next_uid = 0u32;
    let mut chunks = self.baseline_chunks(entry_points, &mut next_uid);

    let mut args = ChunkOptimizeArgs {
      chunks: chunks
        .iter()
        .map(|chunk| ChunkSummary {
          name: chunk.name.as_ref().map(ToString::to_string),
          module_count: chunk.modules.len(),
          size: chunk.size(self.modules, &FxHashMap::default()),
        })
        .collect(),
    };
    if let Err(diagnostic) = plugins.run_before_chunk_optimize(&mut args) {
      errors.push(diagnostic);
    }

    let optimize = &self.options.optimize;

    let canonical = if optimize.dedupe {
      dedupe::canonical_map(self.modules)
    } else {
      FxHashMap::default()
    };

    let module_ids = occurrence_order::assign_module_ids(
      &chunks,
      self.modules,
      self.importers,
      self.records,
      &canonical,
      optimize.occurrence_order,
    );

    commons_chunk::extract_commons(
      &mut chunks,
      &optimize.commons_chunks,
      self.modules,
      &mut next_uid,
    );

    if let Some(max_chunks) = optimize.max_chunks {
      merge_chunks::limit_chunk_count(&mut chunks, max_chunks as usize, self.modules, &canonical);
    }
    if let Some(min_size) = optimize.min_chunk_size {
      merge_chunks::enforce_min_chunk_size(&mut chunks, min_size, self.modules, &canonical);
    }
    if let Some(aggressive) = &optimize.aggressive_merging {
      merge_chunks::aggressive_merge(&mut chunks, aggressive, self.modules, &canonical);
    }

    let chunk_ids =
      occurrence_order::assign_chunk_ids(&chunks, self.records, optimize.occurrence_order);

    let graph = self.finalize(chunks, module_ids, chunk_ids, canonical);
    tracing::debug!(chunks = graph.chunk_table.len(), "partition stage finished");
    PartitionOutput { graph, errors }
  }

  /// One chunk per entry point, containing everything reachable from its
  /// entry modules through static edges. Dynamic edges stop the walk; their
  /// targets found their own entry points.
  fn baseline_chunks(&self, entry_points: &[EntryPoint], next_uid: &mut u32) -> Vec<WorkingChunk> {
    entry_points
      .iter()
      .map(|entry| {
        let uid = *next_uid;
        *next_uid += 1;
        WorkingChunk {
          uid,
          name: entry.name.clone(),
          kind: ChunkKind::EntryPoint {
            is_user_defined: entry.kind == EntryPointKind::UserDefined,
            entry_modules: entry.modules.clone(),
          },
          modules: self.static_closure(&entry.modules),
          depends_on: Vec::new(),
        }
      })
      .collect()
  }

  fn static_closure(&self, roots: &[ModuleIdx]) -> Vec<ModuleIdx> {
    let mut visited: FxHashSet<ModuleIdx> = FxHashSet::default();
    let mut stack: Vec<ModuleIdx> = roots.to_vec();
    let mut members = Vec::new();
    while let Some(current) = stack.pop() {
      if !visited.insert(current) {
        continue;
      }
      match &self.modules[current] {
        packrat_common::Module::External(_) => members.push(current),
        packrat_common::Module::Normal(normal) => {
          if normal.state != packrat_common::BuildState::Built {
            continue;
          }
          members.push(current);
          for dep in normal.static_dependencies() {
            stack.push(dep.module());
          }
        }
      }
    }
    members.sort_by_key(|idx| (self.modules[*idx].exec_order(), *idx));
    members
  }

  fn finalize(
    &self,
    mut chunks: Vec<WorkingChunk>,
    module_ids: FxHashMap<ModuleIdx, u32>,
    chunk_ids: FxHashMap<u32, u32>,
    dedupe_canonical: FxHashMap<ModuleIdx, ModuleIdx>,
  ) -> crate::graph::ChunkGraph {
    chunks.sort_by_key(|chunk| chunk_ids.get(&chunk.uid).copied().unwrap_or(u32::MAX));

    let uid_to_idx: FxHashMap<u32, ChunkIdx> = chunks
      .iter()
      .enumerate()
      .map(|(position, chunk)| (chunk.uid, ChunkIdx::from_usize(position)))
      .collect();

    let mut module_to_chunks: IndexVec<ModuleIdx, Vec<ChunkIdx>> =
      self.modules.iter().map(|_| Vec::new()).collect();

    let table: IndexVec<ChunkIdx, Chunk> = chunks
      .into_iter()
      .enumerate()
      .map(|(position, working)| {
        let chunk_idx = ChunkIdx::from_usize(position);
        for module in &working.modules {
          module_to_chunks[*module].push(chunk_idx);
        }
        Chunk {
          kind: working.kind,
          name: working.name,
          modules: working.modules,
          numeric_id: chunk_ids.get(&working.uid).copied(),
          depends_on: working
            .depends_on
            .iter()
            .filter_map(|uid| uid_to_idx.get(uid).copied())
            .collect(),
          content_hash: None,
          filename: None,
        }
      })
      .collect();

    crate::graph::ChunkGraph {
      chunk_table: ChunkTable::new(table),
      module_to_chunks,
      module_ids,
      dedupe_canonical,
    }
  }
}

#[cfg(test)]
mod tests {
  use arcstr::ArcStr;
  use packrat_common::{
    BuildState, BundlerOptions, CommonsChunkOptions, DependencyKind, EntryItem, IndexModules,
    Module, ModuleId, NormalModule, OptimizeOptions, RawDependency,
  };
  use packrat_utils::xxhash::xxhash_u64;

  use super::*;
  use crate::utils::normalize_options::normalize_options;

  fn module(
    idx: u32,
    path: &str,
    source: &str,
    deps: Vec<(u32, DependencyKind)>,
  ) -> NormalModule {
    let source = ArcStr::from(source);
    NormalModule {
      idx: ModuleIdx::from_raw(idx),
      id: ModuleId::new(format!("/app/{path}")),
      stable_id: path.to_string(),
      exec_order: idx,
      raw_source: source.clone(),
      raw_source_hash: xxhash_u64(source.as_bytes()),
      source_hash: xxhash_u64(source.as_bytes()),
      source,
      dependencies: deps
        .into_iter()
        .map(|(target, kind)| {
          RawDependency::new(format!("./{target}"), kind).into_resolved(ModuleIdx::from_raw(target))
        })
        .collect(),
      state: BuildState::Built,
      is_user_defined_entry: idx < 2,
      provided_bindings: Vec::new(),
    }
  }

  fn fixture() -> (IndexModules, IndexVec<ModuleIdx, Vec<ImporterRecord>>, Vec<EntryPoint>) {
    // Two entries sharing `shared.js`; `private.js` belongs to main alone.
    let modules: IndexModules = [
      module(0, "main.js", "require('./shared'); require('./private');", vec![
        (2, DependencyKind::Static),
        (3, DependencyKind::Static),
      ]),
      module(1, "admin.js", "require('./shared');", vec![(2, DependencyKind::Static)]),
      module(2, "shared.js", "module.exports = 'shared';", Vec::new()),
      module(3, "private.js", "module.exports = 'private';", Vec::new()),
    ]
    .into_iter()
    .map(Module::from)
    .collect();

    let mut importers: IndexVec<ModuleIdx, Vec<ImporterRecord>> =
      modules.iter().map(|_| Vec::new()).collect();
    for module in &modules {
      let Some(normal) = module.as_normal() else { continue };
      for dep in &normal.dependencies {
        importers[dep.module()].push(ImporterRecord {
          importer: normal.idx,
          request: dep.request.clone(),
          kind: dep.kind,
        });
      }
    }

    let entry_points = vec![
      EntryPoint {
        name: Some(ArcStr::from("main")),
        modules: vec![ModuleIdx::from_raw(0)],
        kind: EntryPointKind::UserDefined,
      },
      EntryPoint {
        name: Some(ArcStr::from("admin")),
        modules: vec![ModuleIdx::from_raw(1)],
        kind: EntryPointKind::UserDefined,
      },
    ];
    (modules, importers, entry_points)
  }

  fn options() -> NormalizedBundlerOptions {
    normalize_options(BundlerOptions {
      entry: Some(vec![
        EntryItem::named("main", "./main.js"),
        EntryItem::named("admin", "./admin.js"),
      ]),
      optimize: Some(OptimizeOptions {
        dedupe: Some(true),
        commons_chunks: vec![CommonsChunkOptions {
          name: "commons".to_string(),
          chunks: None,
          min_count: None,
        }],
        ..OptimizeOptions::default()
      }),
      ..BundlerOptions::default()
    })
    .unwrap()
    .options
  }

  type ChunkSnapshot = Vec<(Option<String>, Option<u32>, Vec<Option<u32>>)>;

  fn snapshot(graph: &crate::graph::ChunkGraph) -> ChunkSnapshot {
    graph
      .chunk_table
      .iter()
      .map(|chunk| {
        (
          chunk.name.as_ref().map(ToString::to_string),
          chunk.numeric_id,
          chunk.modules.iter().map(|idx| graph.module_numeric_id(*idx)).collect(),
        )
      })
      .collect()
  }

  #[test]
  fn repartitioning_with_recorded_ids_reproduces_the_graph() {
    let (modules, importers, entry_points) = fixture();
    let options = options();
    let plugins = PluginDriver::new(Vec::new());

    let empty = BuildRecord::default();
    let first =
      PartitionStage::new(&options, &modules, &importers, &empty).partition(&entry_points, &plugins);
    assert!(first.errors.is_empty());

    // The commons chunk exists and owns the shared module exclusively.
    let commons = first
      .graph
      .chunk_table
      .iter()
      .find(|chunk| chunk.name.as_deref() == Some("commons"))
      .unwrap();
    assert_eq!(commons.modules, vec![ModuleIdx::from_raw(2)]);

    let mut records = BuildRecord::default();
    for (idx, id) in &first.graph.module_ids {
      records.module_ids.insert(modules[*idx].stable_id().to_string(), *id);
    }
    for chunk in first.graph.chunk_table.iter() {
      if let (Some(name), Some(id)) = (&chunk.name, chunk.numeric_id) {
        records.chunk_ids.insert(name.to_string(), id);
      }
    }

    let second = PartitionStage::new(&options, &modules, &importers, &records)
      .partition(&entry_points, &plugins);
    assert!(second.errors.is_empty());
    assert_eq!(snapshot(&first.graph), snapshot(&second.graph));
  }
}
