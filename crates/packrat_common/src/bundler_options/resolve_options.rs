use std::path::PathBuf;

use packrat_utils::indexmap::FxIndexMap;
use regex::Regex;

/// Alias/root/fallback/extension rules the resolver honors. Immutable after
/// graph-build start; shared read-only by all concurrent resolve operations.
#[derive(Debug, Default, Clone)]
pub struct ResolveOptions {
  /// Request prefix substitutions applied before any further resolution.
  pub alias: FxIndexMap<String, String>,
  /// Absolute directories searched for bare requests after the
  /// modules-directories walk.
  pub root: Vec<PathBuf>,
  /// Directory names walked upward from the context directory for bare
  /// requests, e.g. `node_modules`.
  pub modules_directories: Vec<String>,
  /// Searched last, after root.
  pub fallback: Vec<PathBuf>,
  /// Appended in order to a literal path that did not resolve; `""` makes
  /// the literal path itself a candidate.
  pub extensions: Vec<String>,
  /// package.json fields consulted in order to find a directory's entry
  /// file.
  pub package_mains: Vec<String>,
  /// Memoize successful (context, request) pairs without revalidating the
  /// filesystem. Only sound if nothing mutates files mid-run.
  pub unsafe_cache: UnsafeCache,
}

#[derive(Debug, Default, Clone)]
pub enum UnsafeCache {
  #[default]
  Disabled,
  All,
  Patterns(Vec<Regex>),
}

impl UnsafeCache {
  pub fn covers(&self, request: &str) -> bool {
    match self {
      Self::Disabled => false,
      Self::All => true,
      Self::Patterns(patterns) => patterns.iter().any(|p| p.is_match(request)),
    }
  }
}

impl ResolveOptions {
  /// The defaults the normalizer fills in when the driver supplies nothing.
  pub fn with_defaults(mut self) -> Self {
    if self.modules_directories.is_empty() {
      self.modules_directories = vec!["web_modules".to_string(), "node_modules".to_string()];
    }
    if self.extensions.is_empty() {
      self.extensions = vec![String::new(), ".js".to_string(), ".json".to_string()];
    }
    if self.package_mains.is_empty() {
      self.package_mains =
        vec!["packrat".to_string(), "browser".to_string(), "web".to_string(), "main".to_string()];
    }
    self
  }
}
