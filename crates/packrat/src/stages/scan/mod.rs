use std::sync::Arc;

use arcstr::ArcStr;
use itertools::Itertools;
use oxc_index::IndexVec;
use packrat_common::{
  DependencyIdx, EntryPoint, EntryPointKind, ImporterRecord, Module, ModuleCache, ModuleIdx,
  ModuleTable, ResolvedId,
};
use packrat_error::{BuildDiagnostic, BuildResult};
use packrat_fs::FileSystem;
use packrat_utils::path_ext::PathExt;
use rustc_hash::FxHashSet;

use crate::{
  module_loader::{ModuleLoader, ModuleLoaderOutput},
  types::{SharedOptions, SharedPluginDriver, SharedResolver},
  utils::resolve_request::resolve_request,
};

pub struct ScanStage<F: FileSystem + Default + Clone + 'static> {
  fs: F,
  options: SharedOptions,
  resolver: SharedResolver<F>,
  plugins: SharedPluginDriver,
  cache: Arc<ModuleCache>,
}

pub struct ScanStageOutput {
  pub module_table: ModuleTable,
  pub importers: IndexVec<ModuleIdx, Vec<ImporterRecord>>,
  /// User-defined entries first, in configuration order, then dynamic-import
  /// entries in discovery (execution) order.
  pub entry_points: Vec<EntryPoint>,
  pub cache: ModuleCache,
  pub errors: Vec<BuildDiagnostic>,
  pub warnings: Vec<BuildDiagnostic>,
}

impl<F: FileSystem + Default + Clone + 'static> ScanStage<F> {
  pub fn new(
    fs: F,
    options: SharedOptions,
    resolver: SharedResolver<F>,
    plugins: SharedPluginDriver,
    cache: Arc<ModuleCache>,
  ) -> Self {
    Self { fs, options, resolver, plugins, cache }
  }

  pub async fn scan(&self) -> BuildResult<ScanStageOutput> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let user_defined_entries = self.resolve_user_defined_entries(&mut errors).await?;
    let prefetch = self.resolve_prefetch_requests(&mut warnings).await;

    let loader = ModuleLoader::new(
      self.fs.clone(),
      Arc::clone(&self.options),
      Arc::clone(&self.resolver),
      Arc::clone(&self.plugins),
      Arc::clone(&self.cache),
    );
    let ModuleLoaderOutput {
      mut module_table,
      importers,
      mut entry_points,
      cache,
      errors: loader_errors,
      warnings: loader_warnings,
    } = loader.fetch_all_modules(user_defined_entries, &prefetch).await?;
    errors.extend(loader_errors);
    warnings.extend(loader_warnings);

    sort_modules(&mut module_table.modules, &entry_points, &mut warnings);
    append_dynamic_entries(&module_table.modules, &mut entry_points);

    tracing::debug!(
      modules = module_table.modules.len(),
      entry_points = entry_points.len(),
      errors = errors.len(),
      "scan stage finished"
    );

    Ok(ScanStageOutput { module_table, importers, entry_points, cache, errors, warnings })
  }

  /// Entries resolve against the configured context. A missing entry is a
  /// recorded error (fatal only under bail); an external entry is always a
  /// configuration error.
  async fn resolve_user_defined_entries(
    &self,
    errors: &mut Vec<BuildDiagnostic>,
  ) -> BuildResult<Vec<(Option<ArcStr>, Vec<ResolvedId>)>> {
    let mut entries = Vec::with_capacity(self.options.entries.len());
    for entry in &self.options.entries {
      let name = entry.name.as_deref().map(ArcStr::from);
      let mut resolved_imports = Vec::with_capacity(entry.imports.len());
      for import in &entry.imports {
        match resolve_request(&self.options, &self.resolver, &self.plugins, None, import).await {
          Ok(resolved) if resolved.is_external => {
            return Err(
              BuildDiagnostic::config(format!("entry '{import}' cannot be external")).into(),
            );
          }
          Ok(resolved) => resolved_imports.push(resolved),
          Err(diagnostic) => {
            if self.options.bail {
              return Err(diagnostic.into());
            }
            errors.push(diagnostic);
          }
        }
      }
      entries.push((name, resolved_imports));
    }
    Ok(entries)
  }

  /// Prefetched modules are warmed into the graph but never force their way
  /// into a chunk; a failing prefetch is only a warning.
  async fn resolve_prefetch_requests(
    &self,
    warnings: &mut Vec<BuildDiagnostic>,
  ) -> Vec<ResolvedId> {
    let mut resolved = Vec::new();
    for request in &self.plugins.annotations().prefetch_requests {
      match resolve_request(&self.options, &self.resolver, &self.plugins, None, request).await {
        Ok(resolved_id) => resolved.push(resolved_id),
        Err(diagnostic) => warnings.push(diagnostic),
      }
    }
    resolved
  }
}

/// Post-order traversal from the entries assigns execution order and surfaces
/// cycles. A cycle is reported once, as a warning naming the closed chain.
fn sort_modules(
  modules: &mut IndexVec<ModuleIdx, Module>,
  entry_points: &[EntryPoint],
  warnings: &mut Vec<BuildDiagnostic>,
) {
  #[derive(Clone, Copy, PartialEq)]
  enum State {
    Unvisited,
    OnStack,
    Done,
  }

  let mut state: IndexVec<ModuleIdx, State> =
    modules.iter().map(|_| State::Unvisited).collect();
  let mut next_order = 0u32;
  let mut reported_cycles = FxHashSet::default();

  for entry in entry_points {
    for &root in &entry.modules {
      if state[root] != State::Unvisited {
        continue;
      }
      // (module, next child to look at)
      let mut stack: Vec<(ModuleIdx, usize)> = vec![(root, 0)];
      state[root] = State::OnStack;
      while let Some((current, cursor)) = stack.pop() {
        let deps = modules[current].dependencies();
        if cursor < deps.len() {
          stack.push((current, cursor + 1));
          let child = deps[DependencyIdx::from_usize(cursor)].module();
          match state[child] {
            State::Unvisited => {
              state[child] = State::OnStack;
              stack.push((child, 0));
            }
            State::OnStack => {
              let chain = stack
                .iter()
                .map(|(idx, _)| *idx)
                .skip_while(|idx| *idx != child)
                .chain(std::iter::once(child))
                .map(|idx| modules[idx].stable_id().to_string())
                .join(" -> ");
              if reported_cycles.insert(chain.clone()) {
                warnings.push(BuildDiagnostic::CycleWarning { chain });
              }
            }
            State::Done => {}
          }
        } else {
          state[current] = State::Done;
          modules[current].set_exec_order(next_order);
          next_order += 1;
        }
      }
    }
  }
}

/// Every target of a dynamic edge founds its own entry point, named after its
/// file so the `[name]` placeholder stays meaningful for async chunks.
fn append_dynamic_entries(
  modules: &IndexVec<ModuleIdx, Module>,
  entry_points: &mut Vec<EntryPoint>,
) {
  let mut known: FxHashSet<ModuleIdx> =
    entry_points.iter().flat_map(|entry| entry.modules.iter().copied()).collect();

  let mut ordered: Vec<&Module> = modules.iter().collect();
  ordered.sort_by_key(|module| module.exec_order());

  for module in ordered {
    let Some(normal) = module.as_normal() else { continue };
    for dep in normal.dynamic_dependencies() {
      let target = dep.module();
      if modules[target].is_external() || !known.insert(target) {
        continue;
      }
      let name = std::path::Path::new(modules[target].stable_id())
        .representative_file_name()
        .to_string();
      entry_points.push(EntryPoint {
        name: Some(ArcStr::from(name)),
        modules: vec![target],
        kind: EntryPointKind::DynamicImport,
      });
    }
  }
}
