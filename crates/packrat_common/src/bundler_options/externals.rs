use std::{fmt, path::Path, sync::Arc};

use futures::future::BoxFuture;
use regex::Regex;
use rustc_hash::FxHashMap;

/// Function-form externals are explicit suspend points: the builder awaits
/// the returned future before the module is marked resolved. `Ok(None)`
/// falls through to normal filesystem resolution; `Err` escalates as a build
/// error.
pub type ExternalsFunction = Arc<
  dyn Fn(&Path, &str) -> BoxFuture<'static, anyhow::Result<Option<String>>> + Send + Sync,
>;

/// Externals rules are consulted before any filesystem resolution. A match
/// short-circuits to an External result carrying the substitute request.
#[derive(Clone)]
pub enum ExternalsRule {
  /// The request is external as itself.
  Request(String),
  /// Any matching request is external as itself.
  Pattern(Regex),
  /// Per-request mapping: `false` forces normal resolution, `true` makes the
  /// request external as-is, a string substitutes the runtime request.
  Map(FxHashMap<String, ExternalsValue>),
  Function(ExternalsFunction),
}

#[derive(Debug, Clone)]
pub enum ExternalsValue {
  Enabled(bool),
  Substitute(String),
}

impl fmt::Debug for ExternalsRule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Request(request) => f.debug_tuple("Request").field(request).finish(),
      Self::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.as_str()).finish(),
      Self::Map(map) => f.debug_tuple("Map").field(map).finish(),
      Self::Function(_) => f.write_str("Function(..)"),
    }
  }
}
