mod bundler;
mod graph;
mod module_loader;
mod stages;
mod types;
mod utils;
mod watcher;

pub use crate::{
  bundler::Bundler,
  graph::ChunkGraph,
  types::bundle_output::BundleOutput,
  types::{BundlerFileSystem, SharedOptions, SharedPluginDriver, SharedResolver},
  watcher::{PollWatcher, WatchController},
};

pub use packrat_common::*;
pub use packrat_error::{BuildDiagnostic, BuildError, BuildResult};
pub use packrat_fs::{FileSystem, MemoryFileSystem, OsFileSystem};
pub use packrat_plugin::{
  Annotations, ChunkOptimizeArgs, ChunkSummary, CustomHook, EmitArgs, HookAction, ModuleBuildArgs,
  PluginDescriptor, PluginDriver, ResolveArgs,
};
