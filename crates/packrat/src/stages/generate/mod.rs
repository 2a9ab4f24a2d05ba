mod library_wrap;
mod render_chunk;

use packrat_common::{ChunkIdx, FilenameTemplate, IndexModules, OutputAsset};
use packrat_error::BuildDiagnostic;
use packrat_plugin::{EmitArgs, HookAction};
use packrat_utils::xxhash::xxhash_hex;
use rustc_hash::FxHashMap;

use crate::{
  graph::ChunkGraph,
  types::{SharedOptions, SharedPluginDriver},
};

use render_chunk::{render_chunk, RenderContext};

pub struct GenerateStage<'a> {
  options: SharedOptions,
  modules: &'a IndexModules,
  plugins: SharedPluginDriver,
}

pub struct GenerateOutput {
  pub assets: Vec<OutputAsset>,
  pub errors: Vec<BuildDiagnostic>,
}

struct RenderedChunk {
  chunk_idx: ChunkIdx,
  filename: String,
  hash: String,
  content: String,
}

impl<'a> GenerateStage<'a> {
  pub fn new(options: SharedOptions, modules: &'a IndexModules, plugins: SharedPluginDriver) -> Self {
    Self { options, modules, plugins }
  }

  /// Non-entry chunks render first: the runtime embedded in entry chunks
  /// carries the chunk id to filename table, which only exists once every
  /// loadable chunk has a final name.
  pub fn generate(&self, graph: &mut ChunkGraph) -> GenerateOutput {
    let mut errors = Vec::new();
    let mut chunk_files: FxHashMap<u32, String> = FxHashMap::default();
    let mut rendered: Vec<RenderedChunk> = Vec::new();

    for entry_pass in [false, true] {
      for (chunk_idx, chunk) in graph.chunk_table.iter_enumerated() {
        if chunk.kind.is_user_defined_entry() != entry_pass {
          continue;
        }
        let ctx = RenderContext {
          options: &self.options,
          modules: self.modules,
          graph: &*graph,
          annotations: self.plugins.annotations(),
          chunk_files: &chunk_files,
        };
        let content = render_chunk(&ctx, chunk);
        let hash = xxhash_hex(content.as_bytes());
        let name = chunk
          .name
          .as_ref()
          .map(ToString::to_string)
          .or_else(|| chunk.numeric_id.map(|id| id.to_string()))
          .unwrap_or_default();
        let filename =
          chunk.filename_template(&self.options).render(Some(&name), chunk.numeric_id, Some(&hash));
        if let Some(id) = chunk.numeric_id {
          chunk_files.insert(id, filename.clone());
        }
        rendered.push(RenderedChunk { chunk_idx, filename, hash, content });
      }
    }

    let mut assets = Vec::with_capacity(rendered.len());
    for item in rendered {
      let chunk = &mut graph.chunk_table[item.chunk_idx];
      chunk.content_hash = Some(item.hash);
      chunk.filename = Some(item.filename.clone());

      let mut content = item.content;
      let mut sidecar = None;
      if self.options.source_map {
        let map_filename = FilenameTemplate::new(self.options.source_map_filename.clone())
          .render_sidecar(&item.filename);
        content.push_str(&format!("\n//# sourceMappingURL={map_filename}"));
        sidecar = Some(OutputAsset {
          filename: map_filename,
          content: self.render_source_map(graph, item.chunk_idx, &item.filename),
        });
      }

      let chunk_assets = std::iter::once(OutputAsset { filename: item.filename, content })
        .chain(sidecar)
        .collect::<Vec<_>>();
      for asset in chunk_assets {
        let mut args = EmitArgs { filename: asset.filename, content: asset.content };
        match self.plugins.run_before_emit(&mut args) {
          Ok(HookAction::Continue) => {
            assets.push(OutputAsset { filename: args.filename, content: args.content });
          }
          Ok(HookAction::Skip) => {}
          Err(diagnostic) => errors.push(diagnostic),
        }
      }
    }

    tracing::debug!(assets = assets.len(), "generate stage finished");
    GenerateOutput { assets, errors }
  }

  /// Skeleton source map: the sources list names every module in the chunk
  /// through the configured module filename template, with no mappings. It
  /// gives devtools stable module urls without a full position encoder.
  fn render_source_map(&self, graph: &ChunkGraph, chunk_idx: ChunkIdx, file: &str) -> String {
    let chunk = &graph.chunk_table[chunk_idx];
    let sources: Vec<String> = chunk
      .modules
      .iter()
      .filter_map(|idx| self.modules[graph.canonical(*idx)].as_normal())
      .map(|module| {
        let resource = module.stable_id.rsplit('!').next().unwrap_or(&module.stable_id);
        self.options.devtool_module_filename_template.replace("[resource-path]", resource)
      })
      .collect();
    serde_json::json!({
      "version": 3,
      "file": file,
      "sources": sources,
      "names": [],
      "mappings": "",
    })
    .to_string()
  }
}
