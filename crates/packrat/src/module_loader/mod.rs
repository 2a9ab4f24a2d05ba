pub mod dependency_scanner;
mod module_task;
pub mod pipeline;
pub mod task_context;

use std::sync::Arc;

use arcstr::ArcStr;
use oxc_index::IndexVec;
use packrat_common::{
  CachedModule, DependencyIdx, EntryPoint, EntryPointKind, ExternalModule, ImporterRecord, Module,
  ModuleCache, ModuleId, ModuleIdx, ModuleLoaderMsg, ModuleTable, NormalModuleTaskResult,
  RawDependency, ResolvedDependency, ResolvedId,
};
use packrat_error::{BuildDiagnostic, BuildResult};
use packrat_fs::FileSystem;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::mpsc::Receiver;

use crate::types::{SharedOptions, SharedPluginDriver, SharedResolver};

use module_task::ModuleTask;
use task_context::TaskContext;

pub struct IntermediateNormalModules {
  pub modules: IndexVec<ModuleIdx, Option<Module>>,
  pub importers: IndexVec<ModuleIdx, Vec<ImporterRecord>>,
}

impl IntermediateNormalModules {
  pub fn new() -> Self {
    Self { modules: IndexVec::new(), importers: IndexVec::new() }
  }

  pub fn alloc_module_idx(&mut self) -> ModuleIdx {
    self.importers.push(Vec::new());
    self.modules.push(None)
  }
}

/// Single-writer graph builder: tasks run concurrently, but every table
/// mutation happens here, on messages drained from the channel. Cycles
/// terminate naturally because a request already spawned (or finished) is
/// answered from `visited` without waiting for its module to complete.
pub struct ModuleLoader<F: FileSystem + Default + 'static> {
  rx: Receiver<ModuleLoaderMsg>,
  remaining: u32,
  options: SharedOptions,
  shared_context: Arc<TaskContext<F>>,
  inm: IntermediateNormalModules,
  visited: FxHashMap<ArcStr, ModuleIdx>,
  requested_ids: IndexVec<ModuleIdx, ModuleId>,
  uncacheable: FxHashSet<ModuleIdx>,
  errors: Vec<BuildDiagnostic>,
  warnings: Vec<BuildDiagnostic>,
}

pub struct ModuleLoaderOutput {
  pub module_table: ModuleTable,
  pub importers: IndexVec<ModuleIdx, Vec<ImporterRecord>>,
  pub entry_points: Vec<EntryPoint>,
  /// Fresh cache snapshot for the next incremental pass.
  pub cache: ModuleCache,
  pub errors: Vec<BuildDiagnostic>,
  pub warnings: Vec<BuildDiagnostic>,
}

impl<F: FileSystem + Default + Clone + 'static> ModuleLoader<F> {
  pub fn new(
    fs: F,
    options: SharedOptions,
    resolver: SharedResolver<F>,
    plugins: SharedPluginDriver,
    cache: Arc<ModuleCache>,
  ) -> Self {
    // 1024 should be enough for most cases
    // over 1024 pending tasks are insane
    let (tx, rx) = tokio::sync::mpsc::channel(1024);

    let shared_context = Arc::new(TaskContext {
      fs,
      options: Arc::clone(&options),
      resolver,
      plugins,
      cache,
      tx: tx.clone(),
    });

    Self {
      rx,
      remaining: 0,
      options,
      shared_context,
      inm: IntermediateNormalModules::new(),
      visited: FxHashMap::default(),
      requested_ids: IndexVec::new(),
      uncacheable: FxHashSet::default(),
      errors: Vec::new(),
      warnings: Vec::new(),
    }
  }

  fn try_spawn_new_task(
    &mut self,
    resolved_id: &ResolvedId,
    is_user_defined_entry: bool,
  ) -> ModuleIdx {
    // The loader chain is part of module identity: one path through two
    // different chains yields two modules.
    let (module_id, chain) = if resolved_id.is_external || resolved_id.ignored {
      (ModuleId::new(resolved_id.id.clone()), Vec::new())
    } else {
      let chain = pipeline::matching_loaders(&self.options, &resolved_id.id);
      let signature = pipeline::chain_signature(&chain);
      (ModuleId::with_loader_signature(&resolved_id.id, &signature), chain)
    };

    let key = ArcStr::from(module_id.as_ref());
    if let Some(idx) = self.visited.get(&key) {
      return *idx;
    }

    let idx = self.inm.alloc_module_idx();
    self.visited.insert(key, idx);
    self.requested_ids.push(module_id.clone());

    if resolved_id.is_external {
      let module = ExternalModule::new(idx, resolved_id.id.clone(), resolved_id.id.clone());
      self.inm.modules[idx] = Some(module.into());
    } else {
      self.remaining += 1;
      let task = ModuleTask::new(
        Arc::clone(&self.shared_context),
        idx,
        resolved_id.clone(),
        module_id,
        chain,
        is_user_defined_entry,
      );
      tokio::spawn(task.run());
    }
    idx
  }

  pub async fn fetch_all_modules(
    mut self,
    user_defined_entries: Vec<(Option<ArcStr>, Vec<ResolvedId>)>,
    prefetch: &[ResolvedId],
  ) -> BuildResult<ModuleLoaderOutput> {
    let mut entry_points = Vec::with_capacity(user_defined_entries.len());
    for (name, resolved) in user_defined_entries {
      let modules =
        resolved.iter().map(|resolved_id| self.try_spawn_new_task(resolved_id, true)).collect();
      entry_points.push(EntryPoint { name, modules, kind: EntryPointKind::UserDefined });
    }
    // Prefetched modules are warmed into the graph and cache; they only land
    // in a chunk if something reachable imports them.
    for resolved_id in prefetch {
      self.try_spawn_new_task(resolved_id, false);
    }

    while self.remaining > 0 {
      let Some(msg) = self.rx.recv().await else { break };
      match msg {
        ModuleLoaderMsg::NormalModuleDone(result) => self.handle_task_result(*result)?,
        ModuleLoaderMsg::BuildErrors(errors) => {
          self.remaining -= 1;
          if self.options.bail {
            self.errors.extend(errors);
            return Err(std::mem::take(&mut self.errors).into());
          }
          self.errors.extend(errors);
        }
      }
    }

    Ok(self.finalize(entry_points))
  }

  fn handle_task_result(&mut self, result: NormalModuleTaskResult) -> BuildResult<()> {
    self.remaining -= 1;
    let NormalModuleTaskResult { idx, mut module, raw_dependencies, resolved_deps, errors, warnings } =
      result;

    if !errors.is_empty() {
      if self.options.bail {
        self.errors.extend(errors);
        return Err(std::mem::take(&mut self.errors).into());
      }
      self.uncacheable.insert(idx);
      self.errors.extend(errors);
    }
    self.warnings.extend(warnings);

    // Dropped (unresolvable) edges shift dependency indices, so provided
    // bindings are remapped alongside.
    let mut dependencies: IndexVec<DependencyIdx, ResolvedDependency> =
      IndexVec::with_capacity(raw_dependencies.len());
    let mut remap: IndexVec<DependencyIdx, Option<DependencyIdx>> =
      IndexVec::with_capacity(raw_dependencies.len());
    for (raw, maybe_resolved) in raw_dependencies.into_iter().zip(resolved_deps) {
      match maybe_resolved {
        Some(resolved_id) => {
          let target = self.try_spawn_new_task(&resolved_id, false);
          self.inm.importers[target].push(ImporterRecord {
            importer: idx,
            request: raw.request.clone(),
            kind: raw.kind,
          });
          let new_idx = dependencies.push(raw.into_resolved(target));
          remap.push(Some(new_idx));
        }
        None => {
          remap.push(None);
        }
      }
    }
    module.provided_bindings = module
      .provided_bindings
      .into_iter()
      .filter_map(|(identifier, dep_idx)| remap[dep_idx].map(|new_idx| (identifier, new_idx)))
      .collect();
    module.dependencies = dependencies;
    self.inm.modules[idx] = Some(module.into());
    Ok(())
  }

  fn finalize(self, entry_points: Vec<EntryPoint>) -> ModuleLoaderOutput {
    let requested_ids = self.requested_ids;
    let cwd = &self.options.cwd;
    let modules: IndexVec<ModuleIdx, Module> = self
      .inm
      .modules
      .into_iter_enumerated()
      .map(|(idx, maybe_module)| {
        maybe_module.unwrap_or_else(|| failed_placeholder(idx, &requested_ids[idx], cwd))
      })
      .collect();

    let mut cache = ModuleCache::default();
    if self.options.cache {
      for module in &modules {
        let Some(normal) = module.as_normal() else { continue };
        if normal.state != packrat_common::BuildState::Built
          || self.uncacheable.contains(&normal.idx)
        {
          continue;
        }
        cache.insert(
          ArcStr::from(normal.id.as_ref()),
          CachedModule {
            raw_source_hash: normal.raw_source_hash,
            source: normal.source.clone(),
            raw_dependencies: normal
              .dependencies
              .iter()
              .map(|dep| RawDependency::new(dep.request.clone(), dep.kind))
              .collect(),
            provided_requests: normal
              .provided_bindings
              .iter()
              .map(|(identifier, dep_idx)| {
                (identifier.clone(), normal.dependencies[*dep_idx].request.clone())
              })
              .collect(),
          },
        );
      }
    }

    ModuleLoaderOutput {
      module_table: ModuleTable { modules },
      importers: self.inm.importers,
      entry_points,
      cache,
      errors: self.errors,
      warnings: self.warnings,
    }
  }
}

fn failed_placeholder(idx: ModuleIdx, module_id: &ModuleId, cwd: &std::path::Path) -> Module {
  use packrat_common::{BuildState, NormalModule};
  NormalModule {
    idx,
    id: module_id.clone(),
    stable_id: module_id.stabilize(cwd),
    exec_order: u32::MAX,
    raw_source: ArcStr::new(),
    source: ArcStr::new(),
    raw_source_hash: 0,
    source_hash: 0,
    dependencies: IndexVec::default(),
    state: BuildState::Failed,
    is_user_defined_entry: false,
    provided_bindings: Vec::new(),
  }
  .into()
}
