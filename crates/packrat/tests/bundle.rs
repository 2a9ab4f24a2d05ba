use std::{
  path::PathBuf,
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
};

use packrat::{
  Bundler, BundlerOptions, BuildDiagnostic, CommonsChunkOptions, Devtool, EntryItem,
  ExternalsRule, ExternalsValue, LibraryTarget, Loader, LoaderOutput, LoaderRule,
  MemoryFileSystem, ModuleOptions, OptimizeOptions, OutputOptions, RuleCondition,
};
use regex::Regex;
use rustc_hash::FxHashMap;

fn bundler(fs: MemoryFileSystem, options: BundlerOptions) -> Bundler<MemoryFileSystem> {
  Bundler::with_fs(options, Vec::new(), fs).expect("valid configuration")
}

fn base_options(entries: Vec<EntryItem>) -> BundlerOptions {
  BundlerOptions {
    context: Some(PathBuf::from("/app")),
    entry: Some(entries),
    ..BundlerOptions::default()
  }
}

fn asset<'a>(output: &'a packrat::BundleOutput, fragment: &str) -> &'a packrat::OutputAsset {
  output
    .assets
    .iter()
    .find(|asset| asset.filename.contains(fragment))
    .unwrap_or_else(|| panic!("no asset matching '{fragment}'"))
}

#[tokio::test]
async fn single_entry_produces_a_runnable_chunk() {
  let fs = MemoryFileSystem::new([
    ("/app/src/index.js", "var lib = require('./lib');\nmodule.exports = lib + 1;"),
    ("/app/src/lib.js", "module.exports = 41;"),
  ]);
  let mut bundler = bundler(fs, base_options(vec![EntryItem::from("./src/index.js")]));

  let output = bundler.build().await.unwrap();
  assert!(output.errors.is_empty(), "unexpected errors: {:?}", output.errors);
  assert_eq!(output.assets.len(), 1);

  let main = asset(&output, "main.js");
  assert!(main.content.contains("__packrat_require__"));
  assert!(main.content.contains("module.exports = 41;"));
  // The static request was rewritten to a numeric id.
  assert!(!main.content.contains("require('./lib')"));
  assert!(main.content.contains("var lib = __packrat_require__("));
}

#[tokio::test]
async fn missing_dependency_is_recorded_without_bail() {
  let fs = MemoryFileSystem::new([("/app/src/index.js", "require('./missing');")]);
  let mut bundler = bundler(fs, base_options(vec![EntryItem::from("./src/index.js")]));

  let output = bundler.build().await.unwrap();
  assert_eq!(output.assets.len(), 1);
  assert!(output
    .errors
    .iter()
    .any(|error| matches!(error, BuildDiagnostic::ResolutionFailure { specifier, .. } if specifier == "./missing")));
}

#[tokio::test]
async fn missing_dependency_aborts_under_bail() {
  let fs = MemoryFileSystem::new([("/app/src/index.js", "require('./missing');")]);
  let mut options = base_options(vec![EntryItem::from("./src/index.js")]);
  options.bail = Some(true);
  let mut bundler = bundler(fs, options);

  let error = bundler.build().await.unwrap_err();
  assert!(!error.is_empty());
}

#[tokio::test]
async fn whitespace_inside_request_calls_is_still_rewritten() {
  // Every spelling the scanner accepts must be rewritten the same way, or
  // the emitted chunk keeps a bare `require` the runtime never defines.
  let fs = MemoryFileSystem::new([
    ("/app/src/index.js", "var lib = require( './lib' );\nvar cfg = require(\"./cfg\" );"),
    ("/app/src/lib.js", "module.exports = 41;"),
    ("/app/src/cfg.js", "module.exports = {};"),
  ]);
  let mut bundler = bundler(fs, base_options(vec![EntryItem::from("./src/index.js")]));

  let output = bundler.build().await.unwrap();
  assert!(output.errors.is_empty(), "unexpected errors: {:?}", output.errors);

  let main = asset(&output, "main.js");
  assert!(main.content.contains("var lib = __packrat_require__("));
  assert!(main.content.contains("var cfg = __packrat_require__("));
  assert!(!main.content.contains("require( './lib' )"));
  assert!(!main.content.contains("require(\"./cfg\" )"));
}

#[tokio::test]
async fn dependency_cycle_builds_with_a_warning() {
  let fs = MemoryFileSystem::new([
    ("/app/src/index.js", "require('./a');"),
    ("/app/src/a.js", "require('./b'); module.exports = 'a';"),
    ("/app/src/b.js", "require('./a'); module.exports = 'b';"),
  ]);
  let mut bundler = bundler(fs, base_options(vec![EntryItem::from("./src/index.js")]));

  let output = bundler.build().await.unwrap();
  assert!(output.errors.is_empty());
  assert!(output
    .warnings
    .iter()
    .any(|warning| matches!(warning, BuildDiagnostic::CycleWarning { chain } if chain.contains("src/a.js"))));

  let main = asset(&output, "main.js");
  assert!(main.content.contains("module.exports = 'a';"));
  assert!(main.content.contains("module.exports = 'b';"));
}

#[tokio::test]
async fn externals_skip_the_filesystem_and_stay_runtime_requires() {
  let fs = MemoryFileSystem::new([("/app/src/index.js", "var react = require('react');")]);
  let mut options = base_options(vec![EntryItem::from("./src/index.js")]);
  options.externals = Some(vec![ExternalsRule::Request("react".to_string())]);
  let mut bundler = bundler(fs, options);

  let output = bundler.build().await.unwrap();
  assert!(output.errors.is_empty(), "unexpected errors: {:?}", output.errors);

  let main = asset(&output, "main.js");
  assert!(main.content.contains("module.exports = require(\"react\")"));
  assert!(main.content.contains("var react = __packrat_require__("));
}

#[tokio::test]
async fn externals_map_substitutes_the_runtime_request() {
  let fs = MemoryFileSystem::new([("/app/src/index.js", "var $ = require('jquery');")]);
  let mut map = FxHashMap::default();
  map.insert("jquery".to_string(), ExternalsValue::Substitute("jQuery".to_string()));
  let mut options = base_options(vec![EntryItem::from("./src/index.js")]);
  options.externals = Some(vec![ExternalsRule::Map(map)]);
  let mut bundler = bundler(fs, options);

  let output = bundler.build().await.unwrap();
  assert!(output.errors.is_empty());
  assert!(asset(&output, "main.js").content.contains("module.exports = require(\"jQuery\")"));
}

#[tokio::test]
async fn loaders_transform_matching_modules() {
  let fs = MemoryFileSystem::new([
    ("/app/src/index.js", "module.exports = require('./message.txt');"),
    ("/app/src/message.txt", "hello"),
  ]);
  let raw_loader = Loader::sync("raw", |_, source: String| {
    Ok(LoaderOutput { source: format!("module.exports = {source:?};"), extra_dependencies: vec![] })
  });
  let mut options = base_options(vec![EntryItem::from("./src/index.js")]);
  options.module = Some(ModuleOptions {
    loaders: vec![LoaderRule::new(
      RuleCondition::Pattern(Regex::new(r"\.txt$").unwrap()),
      vec![raw_loader],
    )],
    ..ModuleOptions::default()
  });
  let mut bundler = bundler(fs, options);

  let output = bundler.build().await.unwrap();
  assert!(output.errors.is_empty(), "unexpected errors: {:?}", output.errors);
  assert!(asset(&output, "main.js").content.contains("module.exports = \"hello\";"));
}

#[tokio::test]
async fn no_parse_modules_become_graph_leaves() {
  let fs = MemoryFileSystem::new([
    ("/app/src/index.js", "require('./vendor');"),
    ("/app/src/vendor.js", "var x = require('./does-not-exist');"),
  ]);
  let mut options = base_options(vec![EntryItem::from("./src/index.js")]);
  options.module = Some(ModuleOptions {
    no_parse: vec![Regex::new("vendor").unwrap()],
    ..ModuleOptions::default()
  });
  let mut bundler = bundler(fs, options);

  let output = bundler.build().await.unwrap();
  assert!(output.errors.is_empty(), "unexpected errors: {:?}", output.errors);
  // The unparsed source survives verbatim, unresolved request included.
  assert!(asset(&output, "main.js").content.contains("require('./does-not-exist')"));
}

#[tokio::test]
async fn dynamic_import_founds_its_own_chunk() {
  let fs = MemoryFileSystem::new([
    ("/app/src/index.js", "import('./extra').then(function(m) { m.run(); });"),
    ("/app/src/extra.js", "exports.run = function() {};"),
  ]);
  let mut bundler = bundler(fs, base_options(vec![EntryItem::from("./src/index.js")]));

  let output = bundler.build().await.unwrap();
  assert!(output.errors.is_empty(), "unexpected errors: {:?}", output.errors);
  assert_eq!(output.assets.len(), 2);

  let main = asset(&output, "main.js");
  let extra = asset(&output, "extra.js");
  assert!(main.content.contains("__packrat_require__.e("));
  // The runtime's url table names the async chunk so it can be loaded.
  assert!(main.content.contains(&extra.filename));
  assert!(extra.content.contains("__packrat_modules__"));
  assert!(extra.content.contains("exports.run"));
  assert!(!main.content.contains("exports.run"));
}

#[tokio::test]
async fn require_ensure_lists_are_rewritten_to_chunk_ids() {
  let fs = MemoryFileSystem::new([
    ("/app/src/index.js", "require.ensure(['./extra'], function() {});"),
    ("/app/src/extra.js", "module.exports = 'later';"),
  ]);
  let mut bundler = bundler(fs, base_options(vec![EntryItem::from("./src/index.js")]));

  let output = bundler.build().await.unwrap();
  assert!(output.errors.is_empty(), "unexpected errors: {:?}", output.errors);

  let main = asset(&output, "main.js");
  assert!(main.content.contains("__packrat_require__.ensure(["));
  assert!(!main.content.contains("'./extra'"));
}

#[tokio::test]
async fn commons_chunk_extracts_modules_shared_by_entries() {
  let fs = MemoryFileSystem::new([
    ("/app/src/app1.js", "require('./shared'); module.exports = 'app1';"),
    ("/app/src/app2.js", "require('./shared'); module.exports = 'app2';"),
    ("/app/src/shared.js", "module.exports = 'shared-code';"),
  ]);
  let mut options = base_options(vec![
    EntryItem::named("app1", "./src/app1.js"),
    EntryItem::named("app2", "./src/app2.js"),
  ]);
  options.optimize = Some(OptimizeOptions {
    commons_chunks: vec![CommonsChunkOptions {
      name: "commons".to_string(),
      chunks: None,
      min_count: None,
    }],
    ..OptimizeOptions::default()
  });
  let mut bundler = bundler(fs, options);

  let output = bundler.build().await.unwrap();
  assert!(output.errors.is_empty(), "unexpected errors: {:?}", output.errors);
  assert_eq!(output.assets.len(), 3);

  let commons = asset(&output, "commons");
  assert!(commons.content.contains("'shared-code'"));
  assert!(!asset(&output, "app1.js").content.contains("'shared-code'"));
  assert!(!asset(&output, "app2.js").content.contains("'shared-code'"));
}

#[tokio::test]
async fn dedupe_emits_identical_sources_once() {
  let fs = MemoryFileSystem::new([
    ("/app/src/index.js", "require('./a'); require('./b');"),
    ("/app/src/a.js", "module.exports = \"twin-module\";"),
    ("/app/src/b.js", "module.exports = \"twin-module\";"),
  ]);
  let mut options = base_options(vec![EntryItem::from("./src/index.js")]);
  options.optimize = Some(OptimizeOptions { dedupe: Some(true), ..OptimizeOptions::default() });
  let mut bundler = bundler(fs, options);

  let output = bundler.build().await.unwrap();
  assert!(output.errors.is_empty());
  assert_eq!(asset(&output, "main.js").content.matches("twin-module").count(), 1);
}

#[tokio::test]
async fn max_chunks_merges_everything_into_one_asset() {
  let fs = MemoryFileSystem::new([
    ("/app/src/index.js", "import('./extra');"),
    ("/app/src/extra.js", "module.exports = 'merged-in';"),
  ]);
  let mut options = base_options(vec![EntryItem::from("./src/index.js")]);
  options.optimize = Some(OptimizeOptions { max_chunks: Some(1), ..OptimizeOptions::default() });
  let mut bundler = bundler(fs, options);

  let output = bundler.build().await.unwrap();
  assert!(output.errors.is_empty());
  assert_eq!(output.assets.len(), 1);

  // The dynamic target was merged into the entry chunk, so the import must
  // resolve in place rather than ask the script loader for a chunk that has
  // no url.
  let main = asset(&output, "main.js");
  assert!(main.content.contains("'merged-in'"));
  assert!(main.content.contains("Promise.resolve().then(function() { return __packrat_require__("));
  assert!(!main.content.contains("__packrat_require__.e("));
}

#[tokio::test]
async fn umd_library_covers_all_environments() {
  let fs = MemoryFileSystem::new([("/app/src/index.js", "module.exports = 'lib';")]);
  let mut options = base_options(vec![EntryItem::from("./src/index.js")]);
  options.output = Some(OutputOptions {
    library: Some("MyLib".to_string()),
    library_target: Some(LibraryTarget::Umd),
    umd_named_define: Some(true),
    ..OutputOptions::default()
  });
  let mut bundler = bundler(fs, options);

  let output = bundler.build().await.unwrap();
  let main = asset(&output, "main.js");
  assert!(main.content.contains("define(\"MyLib\", [], factory)"));
  assert!(main.content.contains("root[\"MyLib\"] = factory()"));
}

#[tokio::test]
async fn devtool_source_map_emits_a_sidecar() {
  let fs = MemoryFileSystem::new([("/app/src/index.js", "module.exports = 1;")]);
  let mut options = base_options(vec![EntryItem::from("./src/index.js")]);
  options.output =
    Some(OutputOptions { devtool: Some(Devtool::SourceMap), ..OutputOptions::default() });
  let mut bundler = bundler(fs, options);

  let output = bundler.build().await.unwrap();
  assert_eq!(output.assets.len(), 2);

  let main = asset(&output, "main.js");
  assert!(main.content.contains("//# sourceMappingURL=main.js.map"));
  let map = asset(&output, "main.js.map");
  assert!(map.content.contains("packrat:///src/index.js"));
}

#[tokio::test]
async fn repeated_builds_are_deterministic() {
  let fs = MemoryFileSystem::new([
    ("/app/src/index.js", "require('./lib');"),
    ("/app/src/lib.js", "module.exports = 'stable';"),
  ]);
  let mut bundler = bundler(fs, base_options(vec![EntryItem::from("./src/index.js")]));

  let first = bundler.build().await.unwrap();
  let second = bundler.build().await.unwrap();
  assert_eq!(first.assets.len(), second.assets.len());
  for (a, b) in first.assets.iter().zip(&second.assets) {
    assert_eq!(a.filename, b.filename);
    assert_eq!(a.content, b.content);
  }
}

#[tokio::test]
async fn records_keep_module_ids_stable_across_rebuilds() {
  let fs = MemoryFileSystem::new([
    ("/app/src/index.js", "require('./a');"),
    ("/app/src/a.js", "module.exports = 'a';"),
  ]);
  let mut options = base_options(vec![EntryItem::from("./src/index.js")]);
  options.output = Some(OutputOptions { pathinfo: Some(true), ..OutputOptions::default() });
  let mut bundler = bundler(fs.clone(), options);

  let first = bundler.build().await.unwrap();
  assert!(asset(&first, "main.js").content.contains("/* src/a.js */\n1: "));

  // A newly discovered module must not steal a previously assigned id, even
  // when it now comes first in discovery order.
  fs.add_file(std::path::Path::new("/app/src/index.js"), "require('./b'); require('./a');");
  fs.add_file(std::path::Path::new("/app/src/b.js"), "module.exports = 'b';");
  let second = bundler.rebuild(&[PathBuf::from("/app/src/index.js")]).await.unwrap();

  let main = asset(&second, "main.js");
  assert!(main.content.contains("/* src/a.js */\n1: "));
  assert!(main.content.contains("/* src/b.js */\n2: "));
}

#[tokio::test]
async fn unchanged_modules_are_served_from_the_cache() {
  let fs = MemoryFileSystem::new([
    ("/app/src/index.js", "require('./data.txt');"),
    ("/app/src/data.txt", "payload"),
  ]);
  let runs = Arc::new(AtomicUsize::new(0));
  let counted = {
    let runs = Arc::clone(&runs);
    Loader::sync("counted", move |_, source: String| {
      runs.fetch_add(1, Ordering::SeqCst);
      Ok(LoaderOutput { source: format!("module.exports = {source:?};"), extra_dependencies: vec![] })
    })
  };
  let mut options = base_options(vec![EntryItem::from("./src/index.js")]);
  options.module = Some(ModuleOptions {
    loaders: vec![LoaderRule::new(
      RuleCondition::Pattern(Regex::new(r"\.txt$").unwrap()),
      vec![counted],
    )],
    ..ModuleOptions::default()
  });
  let mut bundler = bundler(fs, options);

  bundler.build().await.unwrap();
  assert_eq!(runs.load(Ordering::SeqCst), 1);

  // Nothing changed: the cached transform is reused.
  bundler.rebuild(&[]).await.unwrap();
  assert_eq!(runs.load(Ordering::SeqCst), 1);

  // Invalidation forces the loader chain to run again.
  bundler.rebuild(&[PathBuf::from("/app/src/data.txt")]).await.unwrap();
  assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn closed_bundler_refuses_to_build() {
  let fs = MemoryFileSystem::new([("/app/src/index.js", "module.exports = 1;")]);
  let mut bundler = bundler(fs, base_options(vec![EntryItem::from("./src/index.js")]));
  bundler.close();
  assert!(bundler.build().await.is_err());
}
