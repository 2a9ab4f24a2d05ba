use std::path::Path;

use arcstr::ArcStr;
use sugar_path::SugarPath;

/// `ModuleId` is the unique string identifier for each module: the
/// canonicalized absolute resolved path, optionally prefixed with the
/// signature of the loader chain that produced it (`json!...`, mirroring
/// inline loader syntax). Two requests resolving to the same path but
/// through different loader chains are distinct modules.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct ModuleId(ArcStr);

impl ModuleId {
  pub fn new(value: impl Into<ArcStr>) -> Self {
    Self(value.into())
  }

  pub fn with_loader_signature(path: &str, signature: &str) -> Self {
    if signature.is_empty() {
      Self::new(path)
    } else {
      Self::new(format!("{signature}!{path}"))
    }
  }

  /// The filesystem path component, with any loader signature stripped.
  pub fn resource_path(&self) -> &str {
    self.0.rsplit('!').next().unwrap_or(&self.0)
  }

  /// Cwd-relative form used in build records and diagnostics, stable across
  /// machines.
  pub fn stabilize(&self, cwd: &Path) -> String {
    let resource = self.resource_path();
    if Path::new(resource).is_absolute() {
      let relative = Path::new(resource).relative(cwd).as_path().to_slash_lossy().into_owned();
      match self.0.rfind('!') {
        Some(idx) => format!("{}!{relative}", &self.0[..idx]),
        None => relative,
      }
    } else {
      self.0.to_string()
    }
  }
}

impl std::ops::Deref for ModuleId {
  type Target = str;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl AsRef<str> for ModuleId {
  fn as_ref(&self) -> &str {
    self
  }
}

impl From<ArcStr> for ModuleId {
  fn from(value: ArcStr) -> Self {
    Self::new(value)
  }
}

#[test]
fn test_stabilize() {
  let id = ModuleId::new("/app/src/lib.js");
  assert_eq!(id.stabilize(Path::new("/app")), "src/lib.js");

  let id = ModuleId::with_loader_signature("/app/src/data.json", "json");
  assert_eq!(id.resource_path(), "/app/src/data.json");
  assert_eq!(id.stabilize(Path::new("/app")), "json!src/data.json");
}
