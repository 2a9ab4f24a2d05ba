/// Small helper for stitching rendered fragments with newline separators
/// without intermediate allocations per fragment pair.
#[derive(Debug, Default)]
pub struct SourceJoiner {
  buffer: String,
}

impl SourceJoiner {
  pub fn append(&mut self, fragment: &str) {
    if !self.buffer.is_empty() {
      self.buffer.push('\n');
    }
    self.buffer.push_str(fragment);
  }

  pub fn append_owned(&mut self, fragment: String) {
    self.append(&fragment);
  }

  pub fn join(self) -> String {
    self.buffer
  }
}

#[test]
fn test_source_joiner() {
  let mut joiner = SourceJoiner::default();
  joiner.append("a");
  joiner.append("b");
  assert_eq!(joiner.join(), "a\nb");
}
