use std::{
  io,
  path::{Path, PathBuf},
  sync::{Arc, RwLock},
  time::SystemTime,
};

use rustc_hash::FxHashMap;
use sugar_path::SugarPath;

use crate::FileSystem;

#[derive(Debug)]
struct MemoryFile {
  content: String,
  mtime: SystemTime,
}

/// In-memory filesystem used as the test fixture for the resolver and the
/// module loader. Directories exist implicitly as prefixes of file paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
  files: Arc<RwLock<FxHashMap<PathBuf, MemoryFile>>>,
}

impl MemoryFileSystem {
  pub fn new<P: AsRef<Path>>(files: impl IntoIterator<Item = (P, &'static str)>) -> Self {
    let fs = Self::default();
    for (path, content) in files {
      fs.add_file(path.as_ref(), content);
    }
    fs
  }

  pub fn add_file(&self, path: &Path, content: impl Into<String>) {
    let mut files = self.files.write().expect("memory fs poisoned");
    files.insert(
      path.normalize(),
      MemoryFile { content: content.into(), mtime: SystemTime::now() },
    );
  }

  pub fn remove_file(&self, path: &Path) {
    let mut files = self.files.write().expect("memory fs poisoned");
    files.remove(&path.normalize());
  }
}

impl FileSystem for MemoryFileSystem {
  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    let files = self.files.read().expect("memory fs poisoned");
    files
      .get(&path.normalize())
      .map(|file| file.content.clone())
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{}", path.display())))
  }

  fn is_file(&self, path: &Path) -> bool {
    let files = self.files.read().expect("memory fs poisoned");
    files.contains_key(&path.normalize())
  }

  fn is_dir(&self, path: &Path) -> bool {
    let target = path.normalize();
    let files = self.files.read().expect("memory fs poisoned");
    files.keys().any(|existing| existing.parent().is_some_and(|dir| dir.starts_with(&target)))
  }

  fn modified(&self, path: &Path) -> io::Result<SystemTime> {
    let files = self.files.read().expect("memory fs poisoned");
    files
      .get(&path.normalize())
      .map(|file| file.mtime)
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{}", path.display())))
  }
}

#[test]
fn test_memory_file_system() {
  let fs = MemoryFileSystem::new([("/app/src/index.js", "require('./lib')")]);
  assert!(fs.is_file(Path::new("/app/src/index.js")));
  assert!(fs.is_dir(Path::new("/app/src")));
  assert!(fs.is_dir(Path::new("/app")));
  assert!(!fs.is_file(Path::new("/app/src/lib.js")));
  assert_eq!(fs.read_to_string(Path::new("/app/src/index.js")).unwrap(), "require('./lib')");
}
