pub mod bundle_output;

use std::sync::Arc;

use packrat_common::NormalizedBundlerOptions;
use packrat_fs::{FileSystem, OsFileSystem};
use packrat_plugin::PluginDriver;
use packrat_resolver::Resolver;

pub type SharedOptions = Arc<NormalizedBundlerOptions>;
pub type SharedResolver<F = OsFileSystem> = Arc<Resolver<F>>;
pub type SharedPluginDriver = Arc<PluginDriver>;

/// Bound every filesystem collaborator must satisfy to flow through the
/// concurrent module loader: cloned into each spawned task.
pub trait BundlerFileSystem: FileSystem + Default + Clone + 'static {}

impl<T: FileSystem + Default + Clone + 'static> BundlerFileSystem for T {}
