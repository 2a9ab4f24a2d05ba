use std::{
  path::PathBuf,
  time::{Duration, SystemTime},
};

use packrat_common::NormalizedWatchOptions;
use packrat_fs::FileSystem;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Debouncing funnel between change notifications and rebuilds. Producers push
/// paths through [`WatchController::sender`]; a rebuild loop awaits
/// [`WatchController::next_batch`] and receives each burst of changes as one
/// deduplicated batch.
pub struct WatchController {
  aggregate_timeout: Duration,
  tx: UnboundedSender<PathBuf>,
  rx: UnboundedReceiver<PathBuf>,
}

impl WatchController {
  pub fn new(options: &NormalizedWatchOptions) -> Self {
    let (tx, rx) = unbounded_channel();
    Self { aggregate_timeout: options.aggregate_timeout, tx, rx }
  }

  pub fn sender(&self) -> UnboundedSender<PathBuf> {
    self.tx.clone()
  }

  /// Waits for the first change, then keeps draining until the aggregate
  /// window passes without another event. Returns `None` once every sender
  /// is gone.
  pub async fn next_batch(&mut self) -> Option<Vec<PathBuf>> {
    let first = self.rx.recv().await?;
    let mut batch = vec![first];
    loop {
      match tokio::time::timeout(self.aggregate_timeout, self.rx.recv()).await {
        Ok(Some(path)) => batch.push(path),
        Ok(None) | Err(_) => break,
      }
    }
    batch.sort_unstable();
    batch.dedup();
    Some(batch)
  }
}

/// Mtime poller for filesystems without native change notifications. Each
/// [`PollWatcher::poll_once`] compares modification times against the last
/// sweep and reports the paths that moved.
pub struct PollWatcher<F: FileSystem> {
  fs: F,
  interval: Duration,
  mtimes: FxHashMap<PathBuf, SystemTime>,
}

impl<F: FileSystem> PollWatcher<F> {
  pub fn new(fs: F, interval: Duration) -> Self {
    Self { fs, interval, mtimes: FxHashMap::default() }
  }

  pub fn interval(&self) -> Duration {
    self.interval
  }

  pub fn watch(&mut self, path: PathBuf) {
    if let Ok(modified) = self.fs.modified(&path) {
      self.mtimes.insert(path, modified);
    } else {
      self.mtimes.insert(path, SystemTime::UNIX_EPOCH);
    }
  }

  pub fn poll_once(&mut self) -> Vec<PathBuf> {
    let mut changed = Vec::new();
    for (path, last) in &mut self.mtimes {
      let Ok(modified) = self.fs.modified(path) else {
        // Deleted files count as a change exactly once.
        if *last != SystemTime::UNIX_EPOCH {
          *last = SystemTime::UNIX_EPOCH;
          changed.push(path.clone());
        }
        continue;
      };
      if modified != *last {
        *last = modified;
        changed.push(path.clone());
      }
    }
    changed.sort_unstable();
    changed
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use packrat_fs::MemoryFileSystem;
  use std::path::Path;

  fn controller(millis: u64) -> WatchController {
    WatchController::new(&NormalizedWatchOptions {
      aggregate_timeout: Duration::from_millis(millis),
      poll: None,
    })
  }

  #[tokio::test]
  async fn burst_of_changes_arrives_as_one_batch() {
    let mut controller = controller(20);
    let tx = controller.sender();
    tx.send(PathBuf::from("/b.js")).unwrap();
    tx.send(PathBuf::from("/a.js")).unwrap();
    tx.send(PathBuf::from("/a.js")).unwrap();
    let batch = controller.next_batch().await.unwrap();
    assert_eq!(batch, vec![PathBuf::from("/a.js"), PathBuf::from("/b.js")]);
  }

  #[tokio::test]
  async fn closed_channel_ends_the_watch() {
    // The controller keeps its own sender; drop it by taking it apart.
    let WatchController { aggregate_timeout, tx, mut rx } = controller(5);
    drop(tx);
    let batch = tokio::time::timeout(aggregate_timeout * 10, rx.recv()).await.unwrap();
    assert!(batch.is_none());
  }

  #[tokio::test]
  async fn poll_watcher_reports_touched_and_removed_files() {
    let fs = MemoryFileSystem::new([("/src/index.js", "module.exports = 1;")]);
    let mut watcher = PollWatcher::new(fs.clone(), Duration::from_millis(10));
    watcher.watch(PathBuf::from("/src/index.js"));
    assert!(watcher.poll_once().is_empty());

    fs.add_file(Path::new("/src/index.js"), "module.exports = 2;");
    assert_eq!(watcher.poll_once(), vec![PathBuf::from("/src/index.js")]);
    assert!(watcher.poll_once().is_empty());

    fs.remove_file(Path::new("/src/index.js"));
    assert_eq!(watcher.poll_once(), vec![PathBuf::from("/src/index.js")]);
    assert!(watcher.poll_once().is_empty());
  }
}
