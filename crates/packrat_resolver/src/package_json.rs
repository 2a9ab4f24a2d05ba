use std::path::Path;

use packrat_fs::FileSystem;

/// Pick a directory's entry file from its package.json, consulting the
/// configured main fields in preference order. Anything unparsable is
/// treated as absent; resolution then falls back to extension probing.
pub fn entry_from_package_json<F: FileSystem>(
  fs: &F,
  dir: &Path,
  package_mains: &[String],
) -> Option<String> {
  let manifest = fs.read_to_string(&dir.join("package.json")).ok()?;
  let value: serde_json::Value = serde_json::from_str(&manifest).ok()?;
  let fields = value.as_object()?;

  package_mains
    .iter()
    .find_map(|field| fields.get(field).and_then(serde_json::Value::as_str))
    .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
  use super::*;
  use packrat_fs::MemoryFileSystem;

  #[test]
  fn first_configured_field_wins() {
    let fs = MemoryFileSystem::new([(
      "/app/node_modules/lib/package.json",
      r#"{ "main": "./lib/index.js", "browser": "./browser.js" }"#,
    )]);
    let mains = vec!["browser".to_string(), "main".to_string()];
    let entry = entry_from_package_json(&fs, Path::new("/app/node_modules/lib"), &mains);
    assert_eq!(entry.as_deref(), Some("./browser.js"));
  }

  #[test]
  fn malformed_manifest_is_absent() {
    let fs = MemoryFileSystem::new([("/app/node_modules/lib/package.json", "not json")]);
    let mains = vec!["main".to_string()];
    assert!(entry_from_package_json(&fs, Path::new("/app/node_modules/lib"), &mains).is_none());
  }
}
