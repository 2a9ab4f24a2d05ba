use itertools::Itertools;
use packrat_common::{
  Chunk, ChunkKind, IndexModules, Module, NormalModule, NormalizedBundlerOptions, PathShim,
  SourceJoiner,
};
use packrat_plugin::Annotations;
use rustc_hash::FxHashMap;

use crate::{
  graph::ChunkGraph,
  module_loader::dependency_scanner::{DYNAMIC_IMPORT, QUOTED, REQUIRE_ENSURE, STATIC_REQUIRE},
};

use super::library_wrap::{js_string, wrap_library};

pub(super) struct RenderContext<'a> {
  pub options: &'a NormalizedBundlerOptions,
  pub modules: &'a IndexModules,
  pub graph: &'a ChunkGraph,
  pub annotations: &'a Annotations,
  /// Numeric chunk id -> emitted filename, for the runtime's script loader.
  /// Only populated once every non-entry chunk has been rendered.
  pub chunk_files: &'a FxHashMap<u32, String>,
}

/// Renders one chunk to its final JavaScript text. User-defined entry chunks
/// carry the runtime and evaluate their entry modules; every other chunk is a
/// registry script that contributes its modules to the shared map.
pub(super) fn render_chunk(ctx: &RenderContext, chunk: &Chunk) -> String {
  let mut joiner = SourceJoiner::default();
  for banner in &ctx.annotations.banners {
    joiner.append(banner);
  }

  let module_map = render_module_map(ctx, chunk);
  if chunk.kind.is_user_defined_entry() {
    let runtime = render_runtime(ctx, chunk, &module_map);
    joiner.append_owned(wrap_library(runtime, ctx.options));
  } else {
    joiner.append_owned(format!(
      "(function(root) {{\n\
       var shared = root.__packrat_modules__ = root.__packrat_modules__ || {{}};\n\
       var chunkModules = {module_map};\n\
       for (var id in chunkModules) shared[id] = chunkModules[id];\n\
       }})(typeof self !== \"undefined\" ? self : this);"
    ));
  }
  joiner.join()
}

fn render_module_map(ctx: &RenderContext, chunk: &Chunk) -> String {
  let mut entries: Vec<(u32, String)> = Vec::new();
  for &module_idx in &chunk.modules {
    let Some(id) = ctx.graph.module_numeric_id(module_idx) else { continue };
    // Duplicates share the canonical copy's id; the canonical body is
    // emitted once under it.
    let canonical_idx = ctx.graph.canonical(module_idx);
    let rendered = match &ctx.modules[canonical_idx] {
      Module::External(external) => {
        format!(
          "function(module) {{ module.exports = require({}); }}",
          js_string(&external.name)
        )
      }
      Module::Normal(normal) => render_normal_module(ctx, chunk, normal),
    };
    let pathinfo = if ctx.options.pathinfo {
      format!("/* {} */\n", ctx.modules[canonical_idx].stable_id())
    } else {
      String::new()
    };
    entries.push((id, format!("{pathinfo}{id}: {rendered}")));
  }
  entries.sort_by_key(|(id, _)| *id);
  entries.dedup_by_key(|(id, _)| *id);

  let body = entries.into_iter().map(|(_, text)| text).join(",\n");
  format!("{{\n{body}\n}}")
}

fn render_normal_module(ctx: &RenderContext, chunk: &Chunk, module: &NormalModule) -> String {
  let mut source = module.source.to_string();
  for (key, value) in &ctx.annotations.definitions {
    source = source.replace(key.as_str(), value);
  }
  source = rewrite_requests(ctx, chunk, module, source);

  let mut prelude = String::new();
  for (identifier, dep_idx) in &module.provided_bindings {
    let target = module.dependencies[*dep_idx].module();
    if let Some(id) = ctx.graph.module_numeric_id(target) {
      prelude.push_str(&format!("var {identifier} = __packrat_require__({id});\n"));
    }
  }

  let resource = module.stable_id.rsplit('!').next().unwrap_or(&module.stable_id);
  match ctx.options.node.filename {
    PathShim::Disabled => {}
    PathShim::Mock => prelude.push_str("var __filename = \"/index.js\";\n"),
    PathShim::Real => {
      prelude.push_str(&format!("var __filename = {};\n", js_string(resource)));
    }
  }
  match ctx.options.node.dirname {
    PathShim::Disabled => {}
    PathShim::Mock => prelude.push_str("var __dirname = \"/\";\n"),
    PathShim::Real => {
      let dirname = std::path::Path::new(resource)
        .parent()
        .map(|parent| parent.to_string_lossy().into_owned())
        .unwrap_or_default();
      prelude.push_str(&format!("var __dirname = {};\n", js_string(&dirname)));
    }
  }

  format!("function(module, exports, __packrat_require__) {{\n{prelude}{source}\n}}")
}

/// Rewrites scanned request literals into runtime id references, through the
/// same patterns the dependency scanner matched with: whatever put an edge in
/// the graph is rewritten, whatever the scanner could not see survives
/// verbatim.
fn rewrite_requests(
  ctx: &RenderContext,
  chunk: &Chunk,
  module: &NormalModule,
  source: String,
) -> String {
  use packrat_common::DependencyKind;

  let mut static_ids: FxHashMap<&str, u32> = FxHashMap::default();
  // A dynamic target already present in this chunk needs no script load; the
  // chunk id is `None` and the import resolves in place.
  let mut dynamic_targets: FxHashMap<&str, (Option<u32>, u32)> = FxHashMap::default();
  for dep in &module.dependencies {
    let target = dep.module();
    match dep.kind {
      DependencyKind::Static => {
        if let Some(id) = ctx.graph.module_numeric_id(target) {
          static_ids.insert(dep.request.as_str(), id);
        }
      }
      DependencyKind::Dynamic => {
        let Some(module_id) = ctx.graph.module_numeric_id(target) else { continue };
        let in_this_chunk = chunk
          .modules
          .iter()
          .any(|member| ctx.graph.canonical(*member) == ctx.graph.canonical(target));
        if in_this_chunk {
          dynamic_targets.insert(dep.request.as_str(), (None, module_id));
        } else if let Some(chunk_id) = ctx
          .graph
          .dynamic_chunk_of(target)
          .and_then(|chunk_idx| ctx.graph.chunk_table[chunk_idx].numeric_id)
        {
          dynamic_targets.insert(dep.request.as_str(), (Some(chunk_id), module_id));
        }
      }
    }
  }

  let source = STATIC_REQUIRE
    .replace_all(&source, |caps: &regex::Captures| match static_ids.get(&caps[1]) {
      Some(id) => format!("__packrat_require__({id})"),
      None => caps[0].to_string(),
    })
    .into_owned();

  let source = DYNAMIC_IMPORT
    .replace_all(&source, |caps: &regex::Captures| match dynamic_targets.get(&caps[1]) {
      Some((None, module_id)) => format!(
        "Promise.resolve().then(function() {{ return __packrat_require__({module_id}); }})"
      ),
      Some((Some(chunk_id), module_id)) => format!(
        "__packrat_require__.e({chunk_id}).then(function() {{ return __packrat_require__({module_id}); }})"
      ),
      None => caps[0].to_string(),
    })
    .into_owned();

  // require.ensure([...requests...]) keeps its callback but the request list
  // becomes a chunk id list.
  let request_to_chunk: FxHashMap<&str, u32> = module
    .dependencies
    .iter()
    .filter(|dep| dep.kind == DependencyKind::Dynamic)
    .filter_map(|dep| {
      ctx
        .graph
        .dynamic_chunk_of(dep.module())
        .and_then(|chunk_idx| ctx.graph.chunk_table[chunk_idx].numeric_id)
        .map(|chunk_id| (dep.request.as_str(), chunk_id))
    })
    .collect();
  REQUIRE_ENSURE
    .replace_all(&source, |caps: &regex::Captures| {
      let ids = QUOTED
        .captures_iter(&caps[1])
        .filter_map(|item| request_to_chunk.get(&item[1]).copied())
        .map(|id| id.to_string())
        .join(", ");
      format!("__packrat_require__.ensure([{ids}]")
    })
    .into_owned()
}

fn render_runtime(ctx: &RenderContext, chunk: &Chunk, module_map: &str) -> String {
  let entry_ids: Vec<u32> = match &chunk.kind {
    ChunkKind::EntryPoint { entry_modules, .. } => {
      entry_modules.iter().filter_map(|idx| ctx.graph.module_numeric_id(*idx)).collect()
    }
    ChunkKind::Common => Vec::new(),
  };

  let mut shims = String::new();
  if ctx.options.node.provide_global {
    shims.push_str("root.global = root.global || root;\n");
  }
  if ctx.options.node.provide_process {
    shims.push_str("root.process = root.process || { env: {} };\n");
  }
  if ctx.options.node.provide_buffer {
    shims
      .push_str("root.Buffer = root.Buffer || { isBuffer: function() { return false; } };\n");
  }

  let url_table = js_object(ctx.chunk_files);
  let public_path = js_string(&ctx.options.public_path);
  // This chunk is loaded by definition, so `.e()` on its own id resolves
  // immediately instead of fetching a script.
  let own_chunk_seed =
    chunk.numeric_id.map(|id| format!("{id}: Promise.resolve()")).unwrap_or_default();

  let mut entry_calls = String::new();
  if let Some((last, init)) = entry_ids.split_last() {
    for id in init {
      entry_calls.push_str(&format!("__packrat_require__({id});\n"));
    }
    entry_calls.push_str(&format!("return __packrat_require__({last});"));
  }

  format!(
    "(function(modules) {{\n\
     var root = typeof self !== \"undefined\" ? self : this;\n\
     var shared = root.__packrat_modules__ = root.__packrat_modules__ || {{}};\n\
     for (var id in modules) shared[id] = modules[id];\n\
     var installedModules = {{}};\n\
     var installedChunks = {{ {own_chunk_seed} }};\n\
     {shims}\
     function __packrat_require__(moduleId) {{\n\
     if (installedModules[moduleId]) return installedModules[moduleId].exports;\n\
     var module = installedModules[moduleId] = {{ id: moduleId, loaded: false, exports: {{}} }};\n\
     shared[moduleId].call(module.exports, module, module.exports, __packrat_require__);\n\
     module.loaded = true;\n\
     return module.exports;\n\
     }}\n\
     __packrat_require__.m = shared;\n\
     __packrat_require__.c = installedModules;\n\
     __packrat_require__.p = {public_path};\n\
     __packrat_require__.u = function(chunkId) {{ return ({url_table})[chunkId]; }};\n\
     __packrat_require__.e = function(chunkId) {{\n\
     if (installedChunks[chunkId]) return installedChunks[chunkId];\n\
     return installedChunks[chunkId] = new Promise(function(resolve, reject) {{\n\
     var script = document.createElement(\"script\");\n\
     script.src = __packrat_require__.p + __packrat_require__.u(chunkId);\n\
     script.onload = resolve;\n\
     script.onerror = reject;\n\
     document.head.appendChild(script);\n\
     }});\n\
     }};\n\
     __packrat_require__.ensure = function(chunkIds, callback) {{\n\
     Promise.all(chunkIds.map(__packrat_require__.e)).then(function() {{ callback(__packrat_require__); }});\n\
     }};\n\
     {entry_calls}\n\
     }})({module_map})"
  )
}

fn js_object(map: &FxHashMap<u32, String>) -> String {
  let body = map
    .iter()
    .sorted_by_key(|(id, _)| **id)
    .map(|(id, filename)| format!("{}: {}", js_string(&id.to_string()), js_string(filename)))
    .join(", ");
  format!("{{ {body} }}")
}
