use std::{path::PathBuf, time::Duration};

use regex::Regex;

use super::{
  externals::ExternalsRule,
  module_options::LoaderRule,
  node_shims::NodeShims,
  optimize_options::{AggressiveMergingOptions, CommonsChunkOptions},
  output_options::LibraryTarget,
  EntryItem,
};

/// The single immutable configuration value the whole pipeline reads.
/// Constructed once by `normalize_options`, validated at entry, passed by
/// `Arc` into every component; nothing mutates it afterwards.
#[derive(Debug)]
pub struct NormalizedBundlerOptions {
  // --- Input
  pub cwd: PathBuf,
  pub entries: Vec<EntryItem>,
  pub bail: bool,
  pub cache: bool,

  // --- Output
  pub out_dir: PathBuf,
  pub filename: String,
  pub chunk_filename: String,
  pub source_map_filename: String,
  pub devtool_module_filename_template: String,
  pub public_path: String,
  pub pathinfo: bool,
  pub library: Option<String>,
  pub library_target: LibraryTarget,
  pub umd_named_define: bool,
  pub source_map: bool,

  // --- Module
  pub pre_loaders: Vec<LoaderRule>,
  pub loaders: Vec<LoaderRule>,
  pub post_loaders: Vec<LoaderRule>,
  pub no_parse: Vec<Regex>,

  // --- Resolve
  pub externals: Vec<ExternalsRule>,

  // --- Optimize
  pub optimize: NormalizedOptimizeOptions,

  // --- Watch / records / shims
  pub watch: NormalizedWatchOptions,
  pub records_input_path: Option<PathBuf>,
  pub records_output_path: Option<PathBuf>,
  pub node: NodeShims,
}

impl NormalizedBundlerOptions {
  pub fn bypasses_parsing(&self, module_id: &str) -> bool {
    self.no_parse.iter().any(|pattern| pattern.is_match(module_id))
  }
}

#[derive(Debug, Default)]
pub struct NormalizedOptimizeOptions {
  pub dedupe: bool,
  pub occurrence_order: bool,
  pub commons_chunks: Vec<CommonsChunkOptions>,
  pub max_chunks: Option<u32>,
  pub min_chunk_size: Option<usize>,
  pub aggressive_merging: Option<AggressiveMergingOptions>,
}

#[derive(Debug, Clone)]
pub struct NormalizedWatchOptions {
  pub aggregate_timeout: Duration,
  pub poll: Option<Duration>,
}

impl Default for NormalizedWatchOptions {
  fn default() -> Self {
    Self { aggregate_timeout: Duration::from_millis(300), poll: None }
  }
}
