use std::{path::PathBuf, sync::Arc};

/// What a handler tells the bus after running. `Skip` is the Ignore-style
/// veto: the surrounding operation (a resolution, an emission) is abandoned
/// for the current subject and remaining handlers do not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAction {
  Continue,
  Skip,
}

/// Fired before a request enters the resolver. Handlers may substitute the
/// outgoing request or the context resource in place.
#[derive(Debug, Clone)]
pub struct ResolveArgs {
  pub request: String,
  pub context_dir: PathBuf,
}

/// Fired after a module's loader chain finished, before its dependencies are
/// resolved. The source is still mutable at this point.
#[derive(Debug)]
pub struct ModuleBuildArgs {
  pub id: String,
  pub source: String,
}

/// Fired once per build with a read-mostly summary of the baseline chunks,
/// before any optimization pass runs.
#[derive(Debug)]
pub struct ChunkOptimizeArgs {
  pub chunks: Vec<ChunkSummary>,
}

#[derive(Debug, Clone)]
pub struct ChunkSummary {
  pub name: Option<String>,
  pub module_count: usize,
  pub size: usize,
}

/// Fired per asset right before it is handed to the writer. Filename and
/// content are both still mutable.
#[derive(Debug)]
pub struct EmitArgs {
  pub filename: String,
  pub content: String,
}

pub type BeforeResolveHook =
  Arc<dyn Fn(&mut ResolveArgs) -> anyhow::Result<HookAction> + Send + Sync>;
pub type AfterModuleBuildHook =
  Arc<dyn Fn(&mut ModuleBuildArgs) -> anyhow::Result<HookAction> + Send + Sync>;
pub type BeforeChunkOptimizeHook =
  Arc<dyn Fn(&mut ChunkOptimizeArgs) -> anyhow::Result<HookAction> + Send + Sync>;
pub type BeforeEmitHook = Arc<dyn Fn(&mut EmitArgs) -> anyhow::Result<HookAction> + Send + Sync>;
