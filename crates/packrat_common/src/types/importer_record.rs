use arcstr::ArcStr;

use crate::{DependencyKind, ModuleIdx};

/// Reverse edge, recorded at insert time. Reference counts derived from these
/// drive occurrence-order id assignment.
#[derive(Debug, Clone)]
pub struct ImporterRecord {
  pub importer: ModuleIdx,
  pub request: ArcStr,
  pub kind: DependencyKind,
}
