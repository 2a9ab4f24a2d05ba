mod bundler_options;
mod chunk;
mod module;
mod module_loader;
mod types;

pub use bundler_options::{
  externals::{ExternalsFunction, ExternalsRule, ExternalsValue},
  filename_template::FilenameTemplate,
  module_options::{
    Loader, LoaderContext, LoaderOutput, LoaderRule, LoaderTransform, ModuleOptions, RuleCondition,
  },
  node_shims::{NodeShims, PathShim},
  optimize_options::{AggressiveMergingOptions, CommonsChunkOptions, OptimizeOptions},
  output_options::{Devtool, LibraryTarget, OutputOptions},
  resolve_options::{ResolveOptions, UnsafeCache},
  watch_options::WatchOptions,
  BundlerOptions, EntryItem,
};

pub use crate::{
  bundler_options::normalized_bundler_options::{
    NormalizedBundlerOptions, NormalizedOptimizeOptions, NormalizedWatchOptions,
  },
  chunk::{chunk_table::ChunkTable, Chunk},
  module::{external_module::ExternalModule, normal_module::NormalModule, Module},
  module_loader::{
    task_result::NormalModuleTaskResult, CachedModule, ModuleCache, ModuleLoaderMsg,
  },
  types::{
    build_record::BuildRecord,
    build_state::BuildState,
    chunk_kind::ChunkKind,
    dependency::{Dependency, DependencyKind, RawDependency, ResolvedDependency},
    entry_point::{EntryPoint, EntryPointKind},
    importer_record::ImporterRecord,
    module_id::ModuleId,
    module_table::{IndexModules, ModuleTable},
    output_asset::OutputAsset,
    raw_idx::{AssetIdx, ChunkIdx, DependencyIdx, ModuleIdx},
    resolved_id::ResolvedId,
    source_joiner::SourceJoiner,
  },
};
