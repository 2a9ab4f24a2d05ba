use std::{path::PathBuf, sync::Arc};

use packrat_common::{BuildRecord, BundlerOptions, ModuleCache};
use packrat_error::{BuildDiagnostic, BuildResult};
use packrat_fs::{FileSystem, OsFileSystem};
use packrat_plugin::{PluginDescriptor, PluginDriver};
use packrat_resolver::Resolver;

use crate::{
  stages::{
    generate::GenerateStage,
    partition::PartitionStage,
    scan::{ScanStage, ScanStageOutput},
  },
  types::{bundle_output::BundleOutput, SharedOptions, SharedPluginDriver, SharedResolver},
  utils::normalize_options::{normalize_options, NormalizeOptionsReturn},
};

pub struct Bundler<F: FileSystem + Default + Clone + 'static = OsFileSystem> {
  pub closed: bool,
  pub(crate) fs: F,
  pub(crate) options: SharedOptions,
  pub(crate) resolver: SharedResolver<F>,
  pub(crate) plugins: SharedPluginDriver,
  /// Per-module build products carried between passes; swapped wholesale at
  /// the end of each successful scan.
  cache: Arc<ModuleCache>,
  /// Numeric id assignments from the previous pass, kept so rebuilds hand
  /// out the same ids for surviving modules and chunks.
  records: BuildRecord,
}

impl Bundler<OsFileSystem> {
  pub fn new(options: BundlerOptions) -> BuildResult<Self> {
    Self::with_plugins(options, Vec::new())
  }

  pub fn with_plugins(
    options: BundlerOptions,
    plugins: Vec<PluginDescriptor>,
  ) -> BuildResult<Self> {
    Self::with_fs(options, plugins, OsFileSystem)
  }
}

impl<F: FileSystem + Default + Clone + 'static> Bundler<F> {
  pub fn with_fs(
    options: BundlerOptions,
    plugins: Vec<PluginDescriptor>,
    fs: F,
  ) -> BuildResult<Self> {
    let NormalizeOptionsReturn { options, resolve_options } = normalize_options(options)?;

    let resolver: SharedResolver<F> =
      Resolver::new(resolve_options, options.cwd.clone(), fs.clone()).into();

    Ok(Self {
      closed: false,
      fs,
      options: Arc::new(options),
      resolver,
      plugins: Arc::new(PluginDriver::new(plugins)),
      cache: Arc::new(ModuleCache::default()),
      records: BuildRecord::default(),
    })
  }

  pub fn options(&self) -> &SharedOptions {
    &self.options
  }

  /// One full pass: scan the graph, partition it into chunks, render assets.
  /// Module-scoped failures come back inside the output; an `Err` means the
  /// pass aborted outright.
  pub async fn build(&mut self) -> BuildResult<BundleOutput> {
    self.ensure_open()?;
    let mut warnings = Vec::new();
    self.load_records(&mut warnings);

    let scan_stage = ScanStage::new(
      self.fs.clone(),
      Arc::clone(&self.options),
      Arc::clone(&self.resolver),
      Arc::clone(&self.plugins),
      Arc::clone(&self.cache),
    );
    let ScanStageOutput {
      module_table,
      importers,
      entry_points,
      cache,
      mut errors,
      warnings: scan_warnings,
    } = scan_stage.scan().await?;
    warnings.extend(scan_warnings);
    tracing::debug!(modules = module_table.modules.len(), "scan complete");

    let partition_stage =
      PartitionStage::new(&self.options, &module_table.modules, &importers, &self.records);
    let mut partition = partition_stage.partition(&entry_points, &self.plugins);
    errors.extend(partition.errors);
    tracing::debug!(chunks = partition.graph.chunk_table.len(), "partition complete");

    let generate_stage =
      GenerateStage::new(Arc::clone(&self.options), &module_table.modules, Arc::clone(&self.plugins));
    let generated = generate_stage.generate(&mut partition.graph);
    errors.extend(generated.errors);

    if self.options.bail && !errors.is_empty() {
      return Err(errors.into());
    }

    for (idx, id) in &partition.graph.module_ids {
      self.records.module_ids.insert(module_table.modules[*idx].stable_id().to_string(), *id);
    }
    for chunk in partition.graph.chunk_table.iter() {
      if let (Some(name), Some(id)) = (&chunk.name, chunk.numeric_id) {
        self.records.chunk_ids.insert(name.to_string(), id);
      }
    }
    self.write_records(&mut errors);

    if self.options.cache {
      self.cache = Arc::new(cache);
    }

    Ok(BundleOutput { assets: generated.assets, errors, warnings })
  }

  /// Build, then put every asset on disk under the configured output
  /// directory. A failing artifact is recorded and the rest still land.
  pub async fn write(&mut self) -> BuildResult<BundleOutput> {
    let mut output = self.build().await?;

    let out_dir = self.options.cwd.join(&self.options.out_dir);
    if let Err(error) = std::fs::create_dir_all(&out_dir) {
      output.errors.push(BuildDiagnostic::EmitFailure {
        filename: out_dir.display().to_string(),
        reason: error.to_string(),
      });
      return Ok(output);
    }
    for asset in &output.assets {
      let path = out_dir.join(&asset.filename);
      if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
      }
      if let Err(error) = std::fs::write(&path, &asset.content) {
        output.errors.push(BuildDiagnostic::EmitFailure {
          filename: asset.filename.clone(),
          reason: error.to_string(),
        });
      }
    }
    Ok(output)
  }

  /// Incremental pass: drop the cached products of every changed file, then
  /// build. Ids stay stable through the retained records.
  pub async fn rebuild(&mut self, changed: &[PathBuf]) -> BuildResult<BundleOutput> {
    self.ensure_open()?;
    if !changed.is_empty() {
      let changed: Vec<String> =
        changed.iter().map(|path| path.to_string_lossy().into_owned()).collect();
      Arc::make_mut(&mut self.cache).retain(|module_id, _| {
        let resource = module_id.rsplit('!').next().unwrap_or(module_id);
        !changed.iter().any(|path| path == resource)
      });
    }
    self.build().await
  }

  pub fn close(&mut self) {
    self.closed = true;
  }

  fn ensure_open(&self) -> BuildResult<()> {
    if self.closed {
      return Err(BuildDiagnostic::config("cannot build with a closed bundler").into());
    }
    Ok(())
  }

  /// Records load once, lazily. A missing file means a cold start; a corrupt
  /// file is a warning, never a failed build.
  fn load_records(&mut self, warnings: &mut Vec<BuildDiagnostic>) {
    if !self.records.is_empty() {
      return;
    }
    let Some(path) = &self.options.records_input_path else { return };
    let path = self.options.cwd.join(path);
    let Ok(raw) = self.fs.read_to_string(&path) else { return };
    match serde_json::from_str::<BuildRecord>(&raw) {
      Ok(records) => self.records = records,
      Err(error) => {
        warnings.push(BuildDiagnostic::config(format!(
          "ignoring corrupt records file '{}': {error}",
          path.display()
        )));
      }
    }
  }

  fn write_records(&self, errors: &mut Vec<BuildDiagnostic>) {
    let Some(path) = &self.options.records_output_path else { return };
    let path = self.options.cwd.join(path);
    let serialized = match serde_json::to_string_pretty(&self.records) {
      Ok(serialized) => serialized,
      Err(error) => {
        errors.push(BuildDiagnostic::EmitFailure {
          filename: path.display().to_string(),
          reason: error.to_string(),
        });
        return;
      }
    };
    if let Some(parent) = path.parent() {
      let _ = std::fs::create_dir_all(parent);
    }
    if let Err(error) = std::fs::write(&path, serialized) {
      errors.push(BuildDiagnostic::EmitFailure {
        filename: path.display().to_string(),
        reason: error.to_string(),
      });
    }
  }
}
