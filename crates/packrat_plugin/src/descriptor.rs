use std::{fmt, path::PathBuf};

use packrat_utils::indexmap::FxIndexMap;
use regex::Regex;

use crate::hook::{
  AfterModuleBuildHook, BeforeChunkOptimizeHook, BeforeEmitHook, BeforeResolveHook,
};

/// Plugins are a closed set of fixed-shape descriptors plus one generic
/// escape hatch. The driver maps each kind to a handler at configuration
/// time; nothing is dispatched dynamically by name during a build.
pub enum PluginDescriptor {
  /// Veto matching requests entirely; they never reach the resolver.
  Ignore { request: Regex, context: Option<Regex> },
  /// Rewrite matching outgoing requests before resolution proceeds.
  NormalModuleReplacement { request: Regex, replacement: String },
  /// Swap the context directory of matching resolutions.
  ContextReplacement { context: Regex, new_context: PathBuf },
  /// Prepend a comment (or, raw, arbitrary text) to every emitted chunk.
  Banner { banner: String, raw: bool },
  /// Free-variable bindings injected into every chunk prelude.
  Define { definitions: FxIndexMap<String, String> },
  /// Bind a free identifier to a module's exports wherever it is referenced.
  Provide { bindings: FxIndexMap<String, String> },
  /// Warm the module cache with a request before it is first imported.
  Prefetch { request: String },
  Custom { name: String, order: i32, hook: CustomHook },
}

pub enum CustomHook {
  BeforeResolve(BeforeResolveHook),
  AfterModuleBuild(AfterModuleBuildHook),
  BeforeChunkOptimize(BeforeChunkOptimizeHook),
  BeforeEmit(BeforeEmitHook),
}

impl fmt::Debug for PluginDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Ignore { request, .. } => {
        f.debug_struct("Ignore").field("request", &request.as_str()).finish_non_exhaustive()
      }
      Self::NormalModuleReplacement { request, replacement } => f
        .debug_struct("NormalModuleReplacement")
        .field("request", &request.as_str())
        .field("replacement", replacement)
        .finish(),
      Self::ContextReplacement { context, new_context } => f
        .debug_struct("ContextReplacement")
        .field("context", &context.as_str())
        .field("new_context", new_context)
        .finish(),
      Self::Banner { banner, raw } => {
        f.debug_struct("Banner").field("banner", banner).field("raw", raw).finish()
      }
      Self::Define { definitions } => {
        f.debug_struct("Define").field("definitions", definitions).finish()
      }
      Self::Provide { bindings } => f.debug_struct("Provide").field("bindings", bindings).finish(),
      Self::Prefetch { request } => f.debug_struct("Prefetch").field("request", request).finish(),
      Self::Custom { name, order, .. } => f
        .debug_struct("Custom")
        .field("name", name)
        .field("order", order)
        .finish_non_exhaustive(),
    }
  }
}
