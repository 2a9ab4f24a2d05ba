use std::{io, path::Path, time::SystemTime};

use crate::FileSystem;

#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    std::fs::read_to_string(path)
  }

  fn is_file(&self, path: &Path) -> bool {
    path.is_file()
  }

  fn is_dir(&self, path: &Path) -> bool {
    path.is_dir()
  }

  fn modified(&self, path: &Path) -> io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
  }
}
