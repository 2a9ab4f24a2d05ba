use std::path::{Path, PathBuf};

use arcstr::ArcStr;
use dashmap::DashMap;
use sugar_path::SugarPath;

use packrat_common::ResolveOptions;
use packrat_fs::{FileSystem, OsFileSystem};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
  #[error("Cannot resolve '{specifier}' in '{context}'")]
  NotFound { specifier: String, context: String, tried: Vec<PathBuf> },
}

/// Maps a dependency request plus a context directory to an absolute module
/// identity. Shared read-only across all concurrent resolve operations; the
/// unsafe cache is the only interior mutability and memoizes successful
/// (context, request) pairs without revalidating the filesystem.
#[derive(Debug)]
pub struct Resolver<T: FileSystem + Default = OsFileSystem> {
  cwd: PathBuf,
  fs: T,
  options: ResolveOptions,
  unsafe_cache: DashMap<(ArcStr, ArcStr), ArcStr>,
}

impl<F: FileSystem + Default> Resolver<F> {
  pub fn new(options: ResolveOptions, cwd: PathBuf, fs: F) -> Self {
    Self { cwd, fs, options: options.with_defaults(), unsafe_cache: DashMap::default() }
  }

  pub fn cwd(&self) -> &PathBuf {
    &self.cwd
  }

  /// First successful candidate wins; candidates are ordered exactly as the
  /// configuration lists them (alias substitution, then relative/absolute
  /// joining, then modules-directories walked up from the context, then
  /// roots, then fallbacks).
  pub fn resolve(&self, context_dir: Option<&Path>, request: &str) -> Result<ArcStr, ResolveError> {
    let context = context_dir.unwrap_or(self.cwd.as_path());
    let cacheable = self.options.unsafe_cache.covers(request);
    let cache_key =
      (ArcStr::from(context.to_string_lossy().as_ref()), ArcStr::from(request));

    if cacheable {
      if let Some(hit) = self.unsafe_cache.get(&cache_key) {
        return Ok(hit.value().clone());
      }
    }

    let resolved = self.resolve_uncached(context, request)?;
    if cacheable {
      self.unsafe_cache.insert(cache_key, resolved.clone());
    }
    Ok(resolved)
  }

  fn resolve_uncached(&self, context: &Path, request: &str) -> Result<ArcStr, ResolveError> {
    let request = self.apply_alias(request);
    let mut tried = Vec::new();

    let path_like = request.starts_with("./")
      || request.starts_with("../")
      || Path::new(request.as_ref()).is_absolute();

    if path_like {
      let candidate = if Path::new(request.as_ref()).is_absolute() {
        PathBuf::from(request.as_ref())
      } else {
        context.join(request.as_ref())
      };
      if let Some(found) = self.load_path(&candidate, &mut tried) {
        return Ok(found);
      }
    } else {
      // Bare request: every modules directory of every ancestor, innermost
      // first, then roots, then fallbacks.
      for ancestor in context.ancestors() {
        for modules_dir in &self.options.modules_directories {
          let candidate = ancestor.join(modules_dir).join(request.as_ref());
          if let Some(found) = self.load_path(&candidate, &mut tried) {
            return Ok(found);
          }
        }
      }
      for root in self.options.root.iter().chain(self.options.fallback.iter()) {
        let candidate = root.join(request.as_ref());
        if let Some(found) = self.load_path(&candidate, &mut tried) {
          return Ok(found);
        }
      }
    }

    Err(ResolveError::NotFound {
      specifier: request.into_owned(),
      context: context.to_string_lossy().into_owned(),
      tried,
    })
  }

  /// Alias keys substitute on exact match or as a path-segment prefix.
  fn apply_alias<'r>(&self, request: &'r str) -> std::borrow::Cow<'r, str> {
    for (key, target) in &self.options.alias {
      if request == key {
        return std::borrow::Cow::Owned(target.clone());
      }
      if let Some(rest) = request.strip_prefix(key.as_str()) {
        if rest.starts_with('/') {
          return std::borrow::Cow::Owned(format!("{target}{rest}"));
        }
      }
    }
    std::borrow::Cow::Borrowed(request)
  }

  fn load_path(&self, candidate: &Path, tried: &mut Vec<PathBuf>) -> Option<ArcStr> {
    let candidate = candidate.normalize();

    if self.fs.is_file(&candidate) {
      return Some(canonical(&candidate));
    }
    tried.push(candidate.clone());

    // A resolved directory consults packageMains in configured order, then
    // falls back to its index file.
    if self.fs.is_dir(&candidate) {
      if let Some(entry) =
        crate::package_json::entry_from_package_json(&self.fs, &candidate, &self.options.package_mains)
      {
        let entry_path = candidate.join(entry).normalize();
        if self.fs.is_file(&entry_path) {
          return Some(canonical(&entry_path));
        }
        if let Some(found) = self.try_extensions(&entry_path, tried) {
          return Some(found);
        }
      }
      if let Some(found) = self.try_extensions(&candidate.join("index"), tried) {
        return Some(found);
      }
    }

    // No main field matched: append each configured extension to the
    // literal path, in order.
    self.try_extensions(&candidate, tried)
  }

  fn try_extensions(&self, base: &Path, tried: &mut Vec<PathBuf>) -> Option<ArcStr> {
    let base_str = base.to_string_lossy();
    for extension in &self.options.extensions {
      let with_extension = PathBuf::from(format!("{base_str}{extension}"));
      if self.fs.is_file(&with_extension) {
        return Some(canonical(&with_extension));
      }
      tried.push(with_extension);
    }
    None
  }
}

fn canonical(path: &Path) -> ArcStr {
  dunce::simplified(&path.normalize()).to_string_lossy().into()
}

#[cfg(test)]
mod tests {
  use super::*;
  use packrat_common::UnsafeCache as Cache;
  use packrat_fs::MemoryFileSystem;
  use packrat_utils::indexmap::FxIndexMap;

  fn resolver(fs: MemoryFileSystem, options: ResolveOptions) -> Resolver<MemoryFileSystem> {
    Resolver::new(options, PathBuf::from("/app"), fs)
  }

  #[test]
  fn relative_request_resolves_against_context() {
    let fs = MemoryFileSystem::new([("/app/src/lib.js", "")]);
    let r = resolver(fs, ResolveOptions::default());
    let id = r.resolve(Some(Path::new("/app/src")), "./lib").unwrap();
    assert_eq!(&*id, "/app/src/lib.js");
  }

  #[test]
  fn repeated_resolution_is_deterministic() {
    let fs = MemoryFileSystem::new([("/app/src/lib.js", "")]);
    let r = resolver(fs, ResolveOptions::default());
    let first = r.resolve(Some(Path::new("/app/src")), "./lib").unwrap();
    let second = r.resolve(Some(Path::new("/app/src")), "./lib").unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn bare_request_walks_modules_directories_upward() {
    let fs = MemoryFileSystem::new([
      ("/app/node_modules/dep/package.json", r#"{ "main": "./entry.js" }"#),
      ("/app/node_modules/dep/entry.js", ""),
    ]);
    let r = resolver(fs, ResolveOptions::default());
    let id = r.resolve(Some(Path::new("/app/src/deep")), "dep").unwrap();
    assert_eq!(&*id, "/app/node_modules/dep/entry.js");
  }

  #[test]
  fn directory_without_package_json_falls_back_to_index() {
    let fs = MemoryFileSystem::new([("/app/node_modules/jquery/index.js", "")]);
    let r = resolver(fs, ResolveOptions::default());
    let id = r.resolve(Some(Path::new("/app/src")), "jquery").unwrap();
    assert_eq!(&*id, "/app/node_modules/jquery/index.js");
  }

  #[test]
  fn package_json_without_usable_main_still_reaches_index() {
    let fs = MemoryFileSystem::new([
      ("/app/node_modules/dep/package.json", r#"{ "main": "./gone.js" }"#),
      ("/app/node_modules/dep/index.js", ""),
    ]);
    let r = resolver(fs, ResolveOptions::default());
    let id = r.resolve(Some(Path::new("/app/src")), "dep").unwrap();
    assert_eq!(&*id, "/app/node_modules/dep/index.js");
  }

  #[test]
  fn first_match_beats_outer_candidates() {
    // An inner node_modules shadows an outer one even when both exist.
    let fs = MemoryFileSystem::new([
      ("/app/src/node_modules/dep.js", ""),
      ("/app/node_modules/dep.js", ""),
    ]);
    let r = resolver(fs, ResolveOptions::default());
    let id = r.resolve(Some(Path::new("/app/src")), "dep").unwrap();
    assert_eq!(&*id, "/app/src/node_modules/dep.js");
  }

  #[test]
  fn alias_substitutes_before_resolution() {
    let fs = MemoryFileSystem::new([("/app/shims/jq.js", "")]);
    let mut alias = FxIndexMap::default();
    alias.insert("jquery".to_string(), "./shims/jq".to_string());
    let r = resolver(fs, ResolveOptions { alias, ..ResolveOptions::default() });
    let id = r.resolve(Some(Path::new("/app")), "jquery").unwrap();
    assert_eq!(&*id, "/app/shims/jq.js");
  }

  #[test]
  fn not_found_reports_tried_candidates() {
    let fs = MemoryFileSystem::default();
    let r = resolver(fs, ResolveOptions::default());
    let err = r.resolve(Some(Path::new("/app")), "./missing").unwrap_err();
    let ResolveError::NotFound { specifier, tried, .. } = err;
    assert_eq!(specifier, "./missing");
    assert!(!tried.is_empty());
  }

  #[test]
  fn unsafe_cache_masks_filesystem_changes() {
    // Documented exception to determinism: with the unsafe cache enabled, a
    // mid-run filesystem change is not observed.
    let fs = MemoryFileSystem::new([("/app/src/lib.js", "")]);
    let r = resolver(
      fs.clone(),
      ResolveOptions { unsafe_cache: Cache::All, ..ResolveOptions::default() },
    );
    let first = r.resolve(Some(Path::new("/app/src")), "./lib").unwrap();
    fs.remove_file(Path::new("/app/src/lib.js"));
    let second = r.resolve(Some(Path::new("/app/src")), "./lib").unwrap();
    assert_eq!(first, second);
  }
}
