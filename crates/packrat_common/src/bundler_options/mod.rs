pub mod externals;
pub mod filename_template;
pub mod module_options;
pub mod node_shims;
pub mod normalized_bundler_options;
pub mod optimize_options;
pub mod output_options;
pub mod resolve_options;
pub mod watch_options;

use std::path::PathBuf;

use self::{
  externals::ExternalsRule, module_options::ModuleOptions, node_shims::NodeShims,
  optimize_options::OptimizeOptions, output_options::OutputOptions,
  resolve_options::ResolveOptions, watch_options::WatchOptions,
};

/// The raw configuration surface an external driver hands to the core. Every
/// knob is optional; `normalize_options` collapses this into the immutable
/// [`crate::NormalizedBundlerOptions`] and rejects contradictory input before
/// any graph work begins.
#[derive(Debug, Default)]
pub struct BundlerOptions {
  // --- Input
  pub context: Option<PathBuf>,
  pub entry: Option<Vec<EntryItem>>,
  pub bail: Option<bool>,
  pub cache: Option<bool>,

  // --- Output
  pub output: Option<OutputOptions>,

  // --- Module
  pub module: Option<ModuleOptions>,

  // --- Resolve
  pub resolve: Option<ResolveOptions>,
  pub externals: Option<Vec<ExternalsRule>>,

  // --- Optimize
  pub optimize: Option<OptimizeOptions>,

  // --- Watch / records / shims
  pub watch_options: Option<WatchOptions>,
  pub records_input_path: Option<PathBuf>,
  pub records_output_path: Option<PathBuf>,
  pub node: Option<NodeShims>,
}

/// A named root of dependency discovery. An entry configured with several
/// imports produces one chunk containing all of them, in listed order.
#[derive(Debug, Default, Clone)]
pub struct EntryItem {
  pub name: Option<String>,
  pub imports: Vec<String>,
}

impl From<&str> for EntryItem {
  fn from(value: &str) -> Self {
    Self { name: None, imports: vec![value.to_string()] }
  }
}

impl EntryItem {
  pub fn named(name: impl Into<String>, import: impl Into<String>) -> Self {
    Self { name: Some(name.into()), imports: vec![import.into()] }
  }
}
