use std::path::PathBuf;

#[derive(Debug, Default, Clone)]
pub struct OutputOptions {
  pub path: Option<PathBuf>,
  /// Template for user-defined entry chunks, e.g. `[name].js`.
  pub filename: Option<String>,
  /// Template for non-entry chunks, e.g. `[id].[name].js`.
  pub chunk_filename: Option<String>,
  /// Template for source-map sidecars, e.g. `[file].map`.
  pub source_map_filename: Option<String>,
  /// Template naming modules inside an emitted source map.
  pub devtool_module_filename_template: Option<String>,
  /// Embedded verbatim as the runtime asset-path prefix; never validated.
  pub public_path: Option<String>,
  /// Adds a path comment above every module in the rendered chunk.
  pub pathinfo: Option<bool>,
  pub library: Option<String>,
  pub library_target: Option<LibraryTarget>,
  /// Name the AMD `define` call in umd output.
  pub umd_named_define: Option<bool>,
  pub devtool: Option<Devtool>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LibraryTarget {
  #[default]
  Var,
  Amd,
  CommonJs,
  Umd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Devtool {
  SourceMap,
}
