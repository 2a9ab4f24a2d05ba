// Request-to-identity resolution honoring alias/root/fallback/extension
// rules. Resolution is first-match, not best-match: the first candidate that
// exists on the filesystem wins.

mod package_json;
mod resolver;

pub use crate::resolver::{ResolveError, Resolver};

pub use packrat_common::ResolveOptions;
