use std::{path::Path, sync::Arc};

use anyhow::Context;
use arcstr::ArcStr;
use oxc_index::IndexVec;
use packrat_common::{
  BuildState, DependencyIdx, DependencyKind, Loader, ModuleId, ModuleIdx, ModuleLoaderMsg,
  NormalModule, NormalModuleTaskResult, RawDependency, ResolvedId,
};
use packrat_error::{BuildDiagnostic, BuildResult};
use packrat_fs::FileSystem;
use packrat_plugin::ModuleBuildArgs;
use packrat_utils::xxhash::xxhash_u64;

use crate::utils::resolve_request::resolve_request;

use super::{dependency_scanner, pipeline, task_context::TaskContext};

/// Builds one normal module off the loader loop: read, transform, scan,
/// resolve outgoing edges. Results flow back over the channel; the task never
/// touches the module table itself.
pub struct ModuleTask<F: FileSystem + Default> {
  ctx: Arc<TaskContext<F>>,
  idx: ModuleIdx,
  resolved_id: ResolvedId,
  module_id: ModuleId,
  chain: Vec<Loader>,
  is_user_defined_entry: bool,
}

impl<F: FileSystem + Default + 'static> ModuleTask<F> {
  pub fn new(
    ctx: Arc<TaskContext<F>>,
    idx: ModuleIdx,
    resolved_id: ResolvedId,
    module_id: ModuleId,
    chain: Vec<Loader>,
    is_user_defined_entry: bool,
  ) -> Self {
    Self { ctx, idx, resolved_id, module_id, chain, is_user_defined_entry }
  }

  pub async fn run(self) {
    let tx = self.ctx.tx.clone();
    match self.run_inner().await {
      Ok(result) => {
        let _ = tx.send(ModuleLoaderMsg::NormalModuleDone(Box::new(result))).await;
      }
      Err(errors) => {
        let _ = tx.send(ModuleLoaderMsg::BuildErrors(errors.0)).await;
      }
    }
  }

  async fn run_inner(self) -> BuildResult<NormalModuleTaskResult> {
    let resource = self.resolved_id.id.clone();
    let stable_id = self.module_id.stabilize(&self.ctx.options.cwd);

    // A vetoed request becomes an empty built module; nothing is read.
    if self.resolved_id.ignored {
      return Ok(self.finish(stable_id, ArcStr::new(), ArcStr::new(), IndexVec::default(), vec![]));
    }

    let raw_source: ArcStr = self
      .ctx
      .fs
      .read_to_string(Path::new(resource.as_str()))
      .with_context(|| format!("failed to read '{resource}'"))
      .map_err(BuildDiagnostic::from)?
      .into();
    let raw_source_hash = xxhash_u64(raw_source.as_bytes());

    if self.ctx.options.cache {
      if let Some(cached) = self.ctx.cache.get(self.module_id.as_ref()) {
        if cached.raw_source_hash == raw_source_hash {
          let source = cached.source.clone();
          let raw_dependencies: IndexVec<DependencyIdx, RawDependency> =
            cached.raw_dependencies.iter().cloned().collect();
          let provided = provided_bindings_for(&cached.provided_requests, &raw_dependencies);
          return Ok(self.resolve_and_finish(
            stable_id,
            raw_source,
            source,
            raw_dependencies,
            provided,
          )
          .await);
        }
      }
    }

    let parse = !self.ctx.options.bypasses_parsing(&resource);

    let mut source = raw_source.to_string();
    let mut extra_requests = Vec::new();
    if parse && !self.chain.is_empty() {
      (source, extra_requests) = pipeline::run_chain(&self.chain, &resource, source).await?;
    }

    let mut raw_dependencies: IndexVec<DependencyIdx, RawDependency> = IndexVec::default();
    if parse {
      raw_dependencies.extend(dependency_scanner::scan_dependencies(&source));
      for request in extra_requests {
        raw_dependencies.push(RawDependency::new(request, DependencyKind::Static));
      }
    }

    // Provide bindings add an edge to the providing module when the bound
    // identifier is actually referenced.
    let mut provided_requests = Vec::new();
    if parse {
      for (identifier, request) in &self.ctx.plugins.annotations().provided {
        if dependency_scanner::references_identifier(&source, identifier) {
          provided_requests.push((identifier.clone(), ArcStr::from(request.as_str())));
          if !raw_dependencies.iter().any(|dep| dep.request.as_str() == request) {
            raw_dependencies
              .push(RawDependency::new(request.as_str(), DependencyKind::Static));
          }
        }
      }
    }

    let mut args = ModuleBuildArgs { id: stable_id.clone(), source };
    self.ctx.plugins.run_after_module_build(&mut args)?;
    let source: ArcStr = args.source.into();

    let provided = provided_bindings_for(&provided_requests, &raw_dependencies);
    Ok(self.resolve_and_finish(stable_id, raw_source, source, raw_dependencies, provided).await)
  }

  /// Resolves every raw edge; unresolvable ones are dropped with an error
  /// recorded, they never abort the task itself.
  async fn resolve_and_finish(
    self,
    stable_id: String,
    raw_source: ArcStr,
    source: ArcStr,
    raw_dependencies: IndexVec<DependencyIdx, RawDependency>,
    provided_bindings: Vec<(String, DependencyIdx)>,
  ) -> NormalModuleTaskResult {
    let importer_dir = Path::new(self.module_id.resource_path()).parent().map(Path::to_path_buf);

    let mut resolved_deps: IndexVec<DependencyIdx, Option<ResolvedId>> =
      IndexVec::with_capacity(raw_dependencies.len());
    let mut errors = Vec::new();
    for dependency in &raw_dependencies {
      let resolved = resolve_request(
        &self.ctx.options,
        &self.ctx.resolver,
        &self.ctx.plugins,
        importer_dir.as_deref(),
        &dependency.request,
      )
      .await;
      match resolved {
        Ok(resolved_id) => {
          resolved_deps.push(Some(resolved_id));
        }
        Err(diagnostic) => {
          errors.push(diagnostic);
          resolved_deps.push(None);
        }
      }
    }

    let mut result = self.finish(stable_id, raw_source, source, raw_dependencies, provided_bindings);
    result.resolved_deps = resolved_deps;
    result.errors = errors;
    result
  }

  fn finish(
    &self,
    stable_id: String,
    raw_source: ArcStr,
    source: ArcStr,
    raw_dependencies: IndexVec<DependencyIdx, RawDependency>,
    provided_bindings: Vec<(String, DependencyIdx)>,
  ) -> NormalModuleTaskResult {
    let module = NormalModule {
      idx: self.idx,
      id: self.module_id.clone(),
      stable_id,
      exec_order: u32::MAX,
      raw_source_hash: xxhash_u64(raw_source.as_bytes()),
      source_hash: xxhash_u64(source.as_bytes()),
      raw_source,
      source,
      dependencies: IndexVec::default(),
      state: BuildState::Built,
      is_user_defined_entry: self.is_user_defined_entry,
      provided_bindings,
    };
    NormalModuleTaskResult {
      idx: self.idx,
      module,
      raw_dependencies,
      resolved_deps: IndexVec::default(),
      errors: vec![],
      warnings: vec![],
    }
  }
}

fn provided_bindings_for(
  provided_requests: &[(String, ArcStr)],
  raw_dependencies: &IndexVec<DependencyIdx, RawDependency>,
) -> Vec<(String, DependencyIdx)> {
  provided_requests
    .iter()
    .filter_map(|(identifier, request)| {
      raw_dependencies
        .iter_enumerated()
        .find(|(_, dep)| dep.request == *request)
        .map(|(dep_idx, _)| (identifier.clone(), dep_idx))
    })
    .collect()
}
