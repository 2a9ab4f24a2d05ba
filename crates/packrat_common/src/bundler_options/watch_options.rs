#[derive(Debug, Default, Clone)]
pub struct WatchOptions {
  /// Debounce window, in milliseconds, collapsing a burst of filesystem
  /// events into a single rebuild trigger.
  pub aggregate_timeout: Option<u64>,
  /// Substitute periodic mtime polling for native change notifications.
  pub poll: Option<u64>,
}
