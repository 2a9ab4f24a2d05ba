use std::sync::Arc;

use packrat_error::BuildDiagnostic;
use packrat_utils::indexmap::FxIndexMap;

use crate::{
  descriptor::{CustomHook, PluginDescriptor},
  hook::{
    AfterModuleBuildHook, BeforeChunkOptimizeHook, BeforeEmitHook, BeforeResolveHook,
    ChunkOptimizeArgs, EmitArgs, HookAction, ModuleBuildArgs, ResolveArgs,
  },
};

/// Annotation-style plugins leave no handler behind; they record their data
/// here once at configuration time and the emitter (or the module loader,
/// for provides/prefetches) consumes it later.
#[derive(Debug, Default)]
pub struct Annotations {
  /// Already comment-wrapped unless the descriptor asked for raw text.
  pub banners: Vec<String>,
  pub definitions: FxIndexMap<String, String>,
  /// identifier -> request
  pub provided: FxIndexMap<String, String>,
  pub prefetch_requests: Vec<String>,
}

struct Registered<H> {
  name: String,
  order: i32,
  seq: usize,
  handler: H,
}

/// Process-wide ordered hook registry, populated once from the descriptor
/// list and never mutated during a build pass. Hooks fire synchronously in
/// (order, registration) order.
#[derive(Default)]
pub struct PluginDriver {
  before_resolve: Vec<Registered<BeforeResolveHook>>,
  after_module_build: Vec<Registered<AfterModuleBuildHook>>,
  before_chunk_optimize: Vec<Registered<BeforeChunkOptimizeHook>>,
  before_emit: Vec<Registered<BeforeEmitHook>>,
  annotations: Annotations,
}

impl PluginDriver {
  pub fn new(descriptors: Vec<PluginDescriptor>) -> Self {
    let mut driver = Self::default();

    for (seq, descriptor) in descriptors.into_iter().enumerate() {
      match descriptor {
        PluginDescriptor::Ignore { request, context } => {
          let handler: BeforeResolveHook = Arc::new(move |args: &mut ResolveArgs| {
            let context_matches = context.as_ref().is_none_or(|pattern| {
              pattern.is_match(args.context_dir.to_string_lossy().as_ref())
            });
            if context_matches && request.is_match(&args.request) {
              Ok(HookAction::Skip)
            } else {
              Ok(HookAction::Continue)
            }
          });
          driver.before_resolve.push(Registered {
            name: "ignore".to_string(),
            order: 0,
            seq,
            handler,
          });
        }
        PluginDescriptor::NormalModuleReplacement { request, replacement } => {
          let handler: BeforeResolveHook = Arc::new(move |args: &mut ResolveArgs| {
            if request.is_match(&args.request) {
              args.request = replacement.clone();
            }
            Ok(HookAction::Continue)
          });
          driver.before_resolve.push(Registered {
            name: "normal-module-replacement".to_string(),
            order: 0,
            seq,
            handler,
          });
        }
        PluginDescriptor::ContextReplacement { context, new_context } => {
          let handler: BeforeResolveHook = Arc::new(move |args: &mut ResolveArgs| {
            if context.is_match(args.context_dir.to_string_lossy().as_ref()) {
              args.context_dir = new_context.clone();
            }
            Ok(HookAction::Continue)
          });
          driver.before_resolve.push(Registered {
            name: "context-replacement".to_string(),
            order: 0,
            seq,
            handler,
          });
        }
        PluginDescriptor::Banner { banner, raw } => {
          let rendered = if raw { banner } else { format!("/*! {banner} */") };
          driver.annotations.banners.push(rendered);
        }
        PluginDescriptor::Define { definitions } => {
          driver.annotations.definitions.extend(definitions);
        }
        PluginDescriptor::Provide { bindings } => {
          driver.annotations.provided.extend(bindings);
        }
        PluginDescriptor::Prefetch { request } => {
          driver.annotations.prefetch_requests.push(request);
        }
        PluginDescriptor::Custom { name, order, hook } => match hook {
          CustomHook::BeforeResolve(handler) => {
            driver.before_resolve.push(Registered { name, order, seq, handler });
          }
          CustomHook::AfterModuleBuild(handler) => {
            driver.after_module_build.push(Registered { name, order, seq, handler });
          }
          CustomHook::BeforeChunkOptimize(handler) => {
            driver.before_chunk_optimize.push(Registered { name, order, seq, handler });
          }
          CustomHook::BeforeEmit(handler) => {
            driver.before_emit.push(Registered { name, order, seq, handler });
          }
        },
      }
    }

    driver.before_resolve.sort_by_key(|r| (r.order, r.seq));
    driver.after_module_build.sort_by_key(|r| (r.order, r.seq));
    driver.before_chunk_optimize.sort_by_key(|r| (r.order, r.seq));
    driver.before_emit.sort_by_key(|r| (r.order, r.seq));

    driver
  }

  pub fn annotations(&self) -> &Annotations {
    &self.annotations
  }

  pub fn run_before_resolve(
    &self,
    args: &mut ResolveArgs,
  ) -> Result<HookAction, BuildDiagnostic> {
    run_chain(&self.before_resolve, args)
  }

  pub fn run_after_module_build(
    &self,
    args: &mut ModuleBuildArgs,
  ) -> Result<HookAction, BuildDiagnostic> {
    run_chain(&self.after_module_build, args)
  }

  pub fn run_before_chunk_optimize(
    &self,
    args: &mut ChunkOptimizeArgs,
  ) -> Result<HookAction, BuildDiagnostic> {
    run_chain(&self.before_chunk_optimize, args)
  }

  pub fn run_before_emit(&self, args: &mut EmitArgs) -> Result<HookAction, BuildDiagnostic> {
    run_chain(&self.before_emit, args)
  }
}

/// A failing handler aborts only the current emission; the error surfaces as
/// a build diagnostic, never a crash.
fn run_chain<Args>(
  handlers: &[Registered<Arc<dyn Fn(&mut Args) -> anyhow::Result<HookAction> + Send + Sync>>],
  args: &mut Args,
) -> Result<HookAction, BuildDiagnostic> {
  for registered in handlers {
    match (registered.handler)(args) {
      Ok(HookAction::Continue) => {}
      Ok(HookAction::Skip) => return Ok(HookAction::Skip),
      Err(error) => {
        return Err(BuildDiagnostic::Unhandled(
          error.context(format!("plugin '{}' failed", registered.name)),
        ));
      }
    }
  }
  Ok(HookAction::Continue)
}

#[cfg(test)]
mod tests {
  use super::*;
  use regex::Regex;
  use std::path::PathBuf;

  fn resolve_args(request: &str) -> ResolveArgs {
    ResolveArgs { request: request.to_string(), context_dir: PathBuf::from("/app") }
  }

  #[test]
  fn ignore_vetoes_matching_requests() {
    let driver = PluginDriver::new(vec![PluginDescriptor::Ignore {
      request: Regex::new("^moment$").unwrap(),
      context: None,
    }]);
    let mut args = resolve_args("moment");
    assert_eq!(driver.run_before_resolve(&mut args).unwrap(), HookAction::Skip);
    let mut args = resolve_args("lodash");
    assert_eq!(driver.run_before_resolve(&mut args).unwrap(), HookAction::Continue);
  }

  #[test]
  fn replacement_substitutes_request() {
    let driver = PluginDriver::new(vec![PluginDescriptor::NormalModuleReplacement {
      request: Regex::new("^config$").unwrap(),
      replacement: "./config.prod".to_string(),
    }]);
    let mut args = resolve_args("config");
    driver.run_before_resolve(&mut args).unwrap();
    assert_eq!(args.request, "./config.prod");
  }

  #[test]
  fn handlers_fire_in_explicit_order() {
    let first: BeforeResolveHook = Arc::new(|args: &mut ResolveArgs| {
      args.request.push('a');
      Ok(HookAction::Continue)
    });
    let second: BeforeResolveHook = Arc::new(|args: &mut ResolveArgs| {
      args.request.push('b');
      Ok(HookAction::Continue)
    });
    // Registered in reverse, ordered by the explicit priority.
    let driver = PluginDriver::new(vec![
      PluginDescriptor::Custom {
        name: "second".to_string(),
        order: 1,
        hook: CustomHook::BeforeResolve(second),
      },
      PluginDescriptor::Custom {
        name: "first".to_string(),
        order: -1,
        hook: CustomHook::BeforeResolve(first),
      },
    ]);
    let mut args = resolve_args("x");
    driver.run_before_resolve(&mut args).unwrap();
    assert_eq!(args.request, "xab");
  }

  #[test]
  fn failing_handler_becomes_diagnostic() {
    let failing: BeforeResolveHook =
      Arc::new(|_: &mut ResolveArgs| anyhow::bail!("boom"));
    let driver = PluginDriver::new(vec![PluginDescriptor::Custom {
      name: "failing".to_string(),
      order: 0,
      hook: CustomHook::BeforeResolve(failing),
    }]);
    let mut args = resolve_args("x");
    assert!(driver.run_before_resolve(&mut args).is_err());
  }
}
