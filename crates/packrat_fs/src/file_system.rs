use std::{io, path::Path, time::SystemTime};

/// The capability set the bundler core requires from its filesystem
/// collaborator. The core never touches `std::fs` directly, which keeps the
/// whole pipeline runnable against [`crate::MemoryFileSystem`] in tests.
pub trait FileSystem: Send + Sync {
  fn read_to_string(&self, path: &Path) -> io::Result<String>;

  fn is_file(&self, path: &Path) -> bool;

  fn is_dir(&self, path: &Path) -> bool;

  /// Modification time, used by the poll-mode watch controller.
  fn modified(&self, path: &Path) -> io::Result<SystemTime>;
}
