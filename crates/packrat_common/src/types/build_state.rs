/// Terminal state of a module once the loader loop materializes it. `Failed`
/// modules stay in the table so diagnostics can point at them, but are
/// omitted from chunk assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
  Built,
  Failed,
}
