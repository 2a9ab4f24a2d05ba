use std::sync::Arc;

use packrat_common::{ModuleCache, ModuleLoaderMsg};
use packrat_fs::FileSystem;
use tokio::sync::mpsc::Sender;

use crate::types::{SharedOptions, SharedPluginDriver, SharedResolver};

/// Immutable state shared by every spawned module task. The cache is the
/// snapshot taken at pass start; tasks read it, never write it.
pub struct TaskContext<F: FileSystem + Default> {
  pub fs: F,
  pub options: SharedOptions,
  pub resolver: SharedResolver<F>,
  pub plugins: SharedPluginDriver,
  pub cache: Arc<ModuleCache>,
  pub tx: Sender<ModuleLoaderMsg>,
}
