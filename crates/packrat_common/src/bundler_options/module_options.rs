use std::{fmt, sync::Arc};

use futures::future::BoxFuture;
use regex::Regex;

/// A content transform applied to a module's source before dependency
/// scanning. Transforms are plain handlers registered in the configuration
/// (there is no on-disk loader resolution); a loader may suspend, so the
/// transform returns a boxed future and the pipeline awaits it without
/// blocking unrelated modules.
#[derive(Clone)]
pub struct Loader {
  pub name: String,
  /// Passed through opaquely to the loader's invocation context.
  pub query: Option<String>,
  pub transform: LoaderTransform,
}

pub type LoaderTransform =
  Arc<dyn Fn(LoaderContext, String) -> BoxFuture<'static, anyhow::Result<LoaderOutput>> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct LoaderContext {
  /// Absolute path of the module being transformed.
  pub resource: String,
  pub query: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct LoaderOutput {
  pub source: String,
  /// Further dependency requests this loader declares on top of whatever the
  /// scanner finds.
  pub extra_dependencies: Vec<String>,
}

impl Loader {
  /// Wrap a synchronous transform; most built-in loaders are sync.
  pub fn sync<F>(name: impl Into<String>, transform: F) -> Self
  where
    F: Fn(&LoaderContext, String) -> anyhow::Result<LoaderOutput> + Send + Sync + 'static,
  {
    let transform = Arc::new(transform);
    Self {
      name: name.into(),
      query: None,
      transform: Arc::new(move |ctx, source| {
        let transform = Arc::clone(&transform);
        Box::pin(async move { transform(&ctx, source) })
      }),
    }
  }

  pub fn with_query(mut self, query: impl Into<String>) -> Self {
    self.query = Some(query.into());
    self
  }

  /// Part of the module identity: two resolutions of the same path through
  /// different chains are different modules.
  pub fn signature(&self) -> String {
    match &self.query {
      Some(query) => format!("{}?{query}", self.name),
      None => self.name.clone(),
    }
  }
}

impl fmt::Debug for Loader {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Loader").field("name", &self.name).field("query", &self.query).finish()
  }
}

#[derive(Clone)]
pub enum RuleCondition {
  /// Matches when the absolute path starts with the given prefix.
  Prefix(String),
  Pattern(Regex),
  Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
  Any(Vec<RuleCondition>),
}

impl RuleCondition {
  pub fn matches(&self, absolute_path: &str) -> bool {
    match self {
      Self::Prefix(prefix) => absolute_path.starts_with(prefix.as_str()),
      Self::Pattern(pattern) => pattern.is_match(absolute_path),
      Self::Predicate(predicate) => predicate(absolute_path),
      Self::Any(conditions) => conditions.iter().any(|c| c.matches(absolute_path)),
    }
  }
}

impl fmt::Debug for RuleCondition {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Prefix(prefix) => f.debug_tuple("Prefix").field(prefix).finish(),
      Self::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.as_str()).finish(),
      Self::Predicate(_) => f.write_str("Predicate(..)"),
      Self::Any(conditions) => f.debug_tuple("Any").field(conditions).finish(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct LoaderRule {
  pub test: RuleCondition,
  pub include: Option<RuleCondition>,
  pub exclude: Option<RuleCondition>,
  pub loaders: Vec<Loader>,
}

impl LoaderRule {
  pub fn new(test: RuleCondition, loaders: Vec<Loader>) -> Self {
    Self { test, include: None, exclude: None, loaders }
  }

  /// Exclude wins over include; include wins over an unmatched test.
  pub fn applies_to(&self, absolute_path: &str) -> bool {
    if let Some(exclude) = &self.exclude {
      if exclude.matches(absolute_path) {
        return false;
      }
    }
    if let Some(include) = &self.include {
      if include.matches(absolute_path) {
        return true;
      }
    }
    self.test.matches(absolute_path)
  }
}

#[derive(Debug, Default, Clone)]
pub struct ModuleOptions {
  pub pre_loaders: Vec<LoaderRule>,
  pub loaders: Vec<LoaderRule>,
  pub post_loaders: Vec<LoaderRule>,
  /// Modules matching any of these bypass the loader chain and the
  /// dependency scanner entirely; they become graph leaves.
  pub no_parse: Vec<Regex>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn noop_loader() -> Loader {
    Loader::sync("noop", |_, source| Ok(LoaderOutput { source, extra_dependencies: vec![] }))
  }

  #[test]
  fn exclude_wins_over_include() {
    let rule = LoaderRule {
      test: RuleCondition::Pattern(Regex::new(r"\.js$").unwrap()),
      include: Some(RuleCondition::Prefix("/app/src".into())),
      exclude: Some(RuleCondition::Prefix("/app/src/vendor".into())),
      loaders: vec![noop_loader()],
    };
    assert!(rule.applies_to("/app/src/index.js"));
    assert!(!rule.applies_to("/app/src/vendor/lib.js"));
  }

  #[test]
  fn include_wins_over_unmatched_test() {
    let rule = LoaderRule {
      test: RuleCondition::Pattern(Regex::new(r"\.coffee$").unwrap()),
      include: Some(RuleCondition::Prefix("/app/extra".into())),
      exclude: None,
      loaders: vec![noop_loader()],
    };
    assert!(rule.applies_to("/app/extra/main.js"));
    assert!(!rule.applies_to("/app/src/main.js"));
  }
}
