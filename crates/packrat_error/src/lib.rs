use std::ops::{Deref, DerefMut};

/// Everything that can go wrong while producing a bundle. Module-scoped
/// failures (`ResolutionFailure`, `LoaderFailure`) are recorded and attached
/// to the final result without aborting the build unless `bail` is set.
/// `ConfigurationError` is always fatal and raised before any graph work.
#[derive(Debug, thiserror::Error)]
pub enum BuildDiagnostic {
  #[error("Cannot resolve '{specifier}' in '{context}' (tried: {tried:?})")]
  ResolutionFailure { specifier: String, context: String, tried: Vec<String> },

  #[error("Loader '{loader}' failed while transforming '{module}': {reason}")]
  LoaderFailure { loader: String, module: String, reason: String },

  #[error("Circular dependency: {chain}")]
  CycleWarning { chain: String },

  #[error("Invalid configuration: {0}")]
  ConfigurationError(String),

  #[error("Failed to emit '{filename}': {reason}")]
  EmitFailure { filename: String, reason: String },

  #[error(transparent)]
  Unhandled(#[from] anyhow::Error),
}

impl BuildDiagnostic {
  pub fn config(message: impl Into<String>) -> Self {
    Self::ConfigurationError(message.into())
  }

  /// Cycles are structurally supported; they never fail a build on their own.
  pub fn is_warning(&self) -> bool {
    matches!(self, Self::CycleWarning { .. })
  }
}

#[derive(Debug)]
pub struct BuildError(pub Vec<BuildDiagnostic>);

impl Deref for BuildError {
  type Target = Vec<BuildDiagnostic>;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl DerefMut for BuildError {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.0
  }
}

impl From<BuildDiagnostic> for BuildError {
  fn from(diagnostic: BuildDiagnostic) -> Self {
    Self(vec![diagnostic])
  }
}

impl From<Vec<BuildDiagnostic>> for BuildError {
  fn from(diagnostics: Vec<BuildDiagnostic>) -> Self {
    Self(diagnostics)
  }
}

impl From<anyhow::Error> for BuildError {
  fn from(error: anyhow::Error) -> Self {
    Self(vec![BuildDiagnostic::Unhandled(error)])
  }
}

pub type BuildResult<T> = Result<T, BuildError>;
