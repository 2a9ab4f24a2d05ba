use arcstr::ArcStr;

/// Outcome of resolving one request: either a concrete module identity or an
/// external marker carrying the substitute request the emitted bundle should
/// reference at runtime.
#[derive(Debug, Clone)]
pub struct ResolvedId {
  pub id: ArcStr,
  pub is_external: bool,
  /// Set by an Ignore-style hook veto: the request resolves to an empty
  /// module instead of hitting the filesystem.
  pub ignored: bool,
}

impl ResolvedId {
  pub fn normal(id: impl Into<ArcStr>) -> Self {
    Self { id: id.into(), is_external: false, ignored: false }
  }

  pub fn external(id: impl Into<ArcStr>) -> Self {
    Self { id: id.into(), is_external: true, ignored: false }
  }

  pub fn ignored(id: impl Into<ArcStr>) -> Self {
    Self { id: id.into(), is_external: false, ignored: true }
  }
}
