use std::sync::LazyLock;

use packrat_common::{DependencyKind, RawDependency};
use regex::Regex;

pub(crate) static STATIC_REQUIRE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"\brequire\s*\(\s*["']([^"']+)["']\s*\)"#).expect("static require pattern")
});
pub(crate) static DYNAMIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"\bimport\s*\(\s*["']([^"']+)["']\s*\)"#).expect("dynamic import pattern")
});
pub(crate) static REQUIRE_ENSURE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"\brequire\s*\.\s*ensure\s*\(\s*\[([^\]]*)\]").expect("require.ensure pattern")
});
pub(crate) static QUOTED: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"["']([^"']+)["']"#).expect("quoted pattern"));

/// Extracts outgoing requests from transformed source, in source order.
/// `require(..)` edges are static, `import(..)` and `require.ensure([..])`
/// items are dynamic split points. Repeats of the same (request, kind) pair
/// collapse to the first occurrence.
pub fn scan_dependencies(source: &str) -> Vec<RawDependency> {
  let mut found: Vec<(usize, &str, DependencyKind)> = Vec::new();

  for capture in STATIC_REQUIRE.captures_iter(source) {
    let matched = capture.get(1).expect("capture group");
    found.push((matched.start(), matched.as_str(), DependencyKind::Static));
  }
  for capture in DYNAMIC_IMPORT.captures_iter(source) {
    let matched = capture.get(1).expect("capture group");
    found.push((matched.start(), matched.as_str(), DependencyKind::Dynamic));
  }
  for capture in REQUIRE_ENSURE.captures_iter(source) {
    let list = capture.get(1).expect("capture group");
    for item in QUOTED.captures_iter(list.as_str()) {
      let matched = item.get(1).expect("capture group");
      found.push((list.start() + matched.start(), matched.as_str(), DependencyKind::Dynamic));
    }
  }

  found.sort_by_key(|(offset, ..)| *offset);

  let mut dependencies = Vec::new();
  for (_, request, kind) in found {
    if !dependencies
      .iter()
      .any(|existing: &RawDependency| existing.request == request && existing.kind == kind)
    {
      dependencies.push(RawDependency::new(request, kind));
    }
  }
  dependencies
}

/// Whole-word reference check used for Provide-style identifier bindings.
/// `\b` cannot anchor identifiers like `$`, so the boundaries are spelled
/// out against the JS identifier alphabet.
pub fn references_identifier(source: &str, identifier: &str) -> bool {
  let pattern = format!(r"(^|[^\w$]){}([^\w$]|$)", regex::escape(identifier));
  Regex::new(&pattern).is_ok_and(|regex| regex.is_match(source))
}
