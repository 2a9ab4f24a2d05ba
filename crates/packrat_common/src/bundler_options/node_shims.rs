/// Node-builtin shims, resolved to concrete capability flags at
/// configuration validation time instead of an open-ended builtin map. The
/// emitter injects the corresponding prelude bindings.
#[derive(Debug, Default, Clone)]
pub struct NodeShims {
  pub provide_process: bool,
  pub provide_buffer: bool,
  pub provide_global: bool,
  pub filename: PathShim,
  pub dirname: PathShim,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PathShim {
  #[default]
  Disabled,
  /// A fixed mock value (`"/index.js"` / `"/"`), independent of the real
  /// module location.
  Mock,
  /// The module's real path, relative to the configured context.
  Real,
}
