mod descriptor;
mod driver;
mod hook;

pub use crate::{
  descriptor::{CustomHook, PluginDescriptor},
  driver::{Annotations, PluginDriver},
  hook::{
    AfterModuleBuildHook, BeforeChunkOptimizeHook, BeforeEmitHook, BeforeResolveHook,
    ChunkOptimizeArgs, ChunkSummary, EmitArgs, HookAction, ModuleBuildArgs, ResolveArgs,
  },
};
