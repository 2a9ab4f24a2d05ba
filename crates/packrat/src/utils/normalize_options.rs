use std::{path::PathBuf, time::Duration};

use packrat_common::{
  BundlerOptions, Devtool, NormalizedBundlerOptions, NormalizedOptimizeOptions,
  NormalizedWatchOptions, ResolveOptions,
};
use packrat_error::{BuildDiagnostic, BuildResult};
use rustc_hash::FxHashSet;

pub struct NormalizeOptionsReturn {
  pub options: NormalizedBundlerOptions,
  pub resolve_options: ResolveOptions,
}

/// Collapses the all-optional configuration surface into the immutable value
/// the pipeline reads, rejecting contradictory input before any graph work.
pub fn normalize_options(raw: BundlerOptions) -> BuildResult<NormalizeOptionsReturn> {
  let mut entries = raw.entry.unwrap_or_default();
  if entries.is_empty() {
    return Err(BuildDiagnostic::config("you must supply at least one entry").into());
  }
  if entries.len() == 1 && entries[0].name.is_none() {
    entries[0].name = Some("main".to_string());
  }
  let mut seen_names = FxHashSet::default();
  for entry in &entries {
    let Some(name) = &entry.name else {
      return Err(
        BuildDiagnostic::config("every entry needs a name when more than one is configured")
          .into(),
      );
    };
    if entry.imports.is_empty() {
      return Err(BuildDiagnostic::config(format!("entry '{name}' has no imports")).into());
    }
    if !seen_names.insert(name.clone()) {
      return Err(BuildDiagnostic::config(format!("duplicate entry name '{name}'")).into());
    }
  }

  let raw_optimize = raw.optimize.unwrap_or_default();
  for commons in &raw_optimize.commons_chunks {
    if seen_names.contains(&commons.name) {
      return Err(
        BuildDiagnostic::config(format!(
          "commons chunk '{}' collides with an entry of the same name",
          commons.name
        ))
        .into(),
      );
    }
  }
  if raw_optimize.max_chunks == Some(0) {
    return Err(BuildDiagnostic::config("maxChunks must be at least 1").into());
  }

  let cwd = raw
    .context
    .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

  let output = raw.output.unwrap_or_default();
  let source_map = output.devtool == Some(Devtool::SourceMap);
  let module = raw.module.unwrap_or_default();
  let watch = raw.watch_options.unwrap_or_default();

  let optimize = NormalizedOptimizeOptions {
    dedupe: raw_optimize.dedupe.unwrap_or(false),
    occurrence_order: raw_optimize.occurrence_order.unwrap_or(true),
    commons_chunks: raw_optimize.commons_chunks,
    max_chunks: raw_optimize.max_chunks,
    min_chunk_size: raw_optimize.min_chunk_size,
    aggressive_merging: raw_optimize.aggressive_merging,
  };

  let options = NormalizedBundlerOptions {
    cwd,
    entries,
    bail: raw.bail.unwrap_or(false),
    cache: raw.cache.unwrap_or(true),
    out_dir: output.path.unwrap_or_else(|| PathBuf::from("dist")),
    filename: output.filename.unwrap_or_else(|| "[name].js".to_string()),
    chunk_filename: output.chunk_filename.unwrap_or_else(|| "[id].[name].js".to_string()),
    source_map_filename: output.source_map_filename.unwrap_or_else(|| "[file].map".to_string()),
    devtool_module_filename_template: output
      .devtool_module_filename_template
      .unwrap_or_else(|| "packrat:///[resource-path]".to_string()),
    public_path: output.public_path.unwrap_or_default(),
    pathinfo: output.pathinfo.unwrap_or(false),
    library: output.library,
    library_target: output.library_target.unwrap_or_default(),
    umd_named_define: output.umd_named_define.unwrap_or(false),
    source_map,
    pre_loaders: module.pre_loaders,
    loaders: module.loaders,
    post_loaders: module.post_loaders,
    no_parse: module.no_parse,
    externals: raw.externals.unwrap_or_default(),
    optimize,
    watch: NormalizedWatchOptions {
      aggregate_timeout: Duration::from_millis(watch.aggregate_timeout.unwrap_or(300)),
      poll: watch.poll.map(Duration::from_millis),
    },
    records_input_path: raw.records_input_path,
    records_output_path: raw.records_output_path,
    node: raw.node.unwrap_or_default(),
  };

  Ok(NormalizeOptionsReturn { options, resolve_options: raw.resolve.unwrap_or_default() })
}
