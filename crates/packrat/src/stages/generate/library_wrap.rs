use packrat_common::{LibraryTarget, NormalizedBundlerOptions};

/// Wraps the rendered entry expression in the configured library shape. The
/// input is an expression evaluating to the entry module's exports; the
/// output is a complete statement.
pub(super) fn wrap_library(body: String, options: &NormalizedBundlerOptions) -> String {
  let name = options.library.as_deref();
  match (options.library_target, name) {
    (LibraryTarget::Var, Some(name)) => format!("var {name} = {body};"),
    (LibraryTarget::Var, None) => format!("{body};"),
    (LibraryTarget::CommonJs, _) => format!("module.exports = {body};"),
    (LibraryTarget::Amd, name) => {
      let named = name.map(|n| format!("{}, ", js_string(n))).unwrap_or_default();
      format!("define({named}[], function() {{\nreturn {body};\n}});")
    }
    (LibraryTarget::Umd, name) => {
      let global_name = js_string(name.unwrap_or("packrat"));
      let amd_name = if options.umd_named_define {
        name.map(|n| format!("{}, ", js_string(n))).unwrap_or_default()
      } else {
        String::new()
      };
      format!(
        "(function(root, factory) {{\n\
         if (typeof exports === \"object\" && typeof module === \"object\")\n\
         module.exports = factory();\n\
         else if (typeof define === \"function\" && define.amd)\n\
         define({amd_name}[], factory);\n\
         else\n\
         root[{global_name}] = factory();\n\
         }})(typeof self !== \"undefined\" ? self : this, function() {{\n\
         return {body};\n\
         }});"
      )
    }
  }
}

pub(super) fn js_string(value: &str) -> String {
  serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

#[cfg(test)]
mod tests {
  use super::*;
  use packrat_common::{BundlerOptions, EntryItem, LibraryTarget, OutputOptions};

  use crate::utils::normalize_options::normalize_options;

  fn options(library: Option<&str>, target: LibraryTarget) -> NormalizedBundlerOptions {
    normalize_options(BundlerOptions {
      entry: Some(vec![EntryItem::from("./index.js")]),
      output: Some(OutputOptions {
        library: library.map(ToString::to_string),
        library_target: Some(target),
        ..OutputOptions::default()
      }),
      ..BundlerOptions::default()
    })
    .unwrap()
    .options
  }

  #[test]
  fn var_target_declares_the_name() {
    let wrapped = wrap_library("(42)".to_string(), &options(Some("Lib"), LibraryTarget::Var));
    assert_eq!(wrapped, "var Lib = (42);");
  }

  #[test]
  fn commonjs_target_assigns_exports() {
    let wrapped = wrap_library("(42)".to_string(), &options(None, LibraryTarget::CommonJs));
    assert_eq!(wrapped, "module.exports = (42);");
  }

  #[test]
  fn umd_target_covers_all_three_environments() {
    let wrapped = wrap_library("(42)".to_string(), &options(Some("Lib"), LibraryTarget::Umd));
    assert!(wrapped.contains("module.exports = factory()"));
    assert!(wrapped.contains("define.amd"));
    assert!(wrapped.contains("root[\"Lib\"] = factory()"));
  }
}
