use packrat_common::OutputAsset;
use packrat_error::BuildDiagnostic;

/// What one build pass produced. `errors` holds module-scoped failures the
/// pass survived (missing resolutions, failing loaders); `warnings` holds
/// cycle notices and other advisories. An `Err` from the bundler instead of
/// this value means the pass aborted (bad configuration, or `bail`).
#[derive(Debug)]
pub struct BundleOutput {
  pub assets: Vec<OutputAsset>,
  pub errors: Vec<BuildDiagnostic>,
  pub warnings: Vec<BuildDiagnostic>,
}
