pub mod task_result;

use arcstr::ArcStr;
use packrat_error::BuildDiagnostic;
use rustc_hash::FxHashMap;

use crate::RawDependency;

use task_result::NormalModuleTaskResult;

pub enum ModuleLoaderMsg {
  NormalModuleDone(Box<NormalModuleTaskResult>),
  BuildErrors(Vec<BuildDiagnostic>),
}

/// What survives between incremental passes: enough per-module state to skip
/// the loader chain and dependency scan when the raw source is unchanged.
/// Read-many during a pass, written once at pass completion.
#[derive(Debug, Clone)]
pub struct CachedModule {
  pub raw_source_hash: u64,
  pub source: ArcStr,
  pub raw_dependencies: Vec<RawDependency>,
  pub provided_requests: Vec<(String, ArcStr)>,
}

pub type ModuleCache = FxHashMap<ArcStr, CachedModule>;
