use itertools::Itertools;
use packrat_common::{Loader, LoaderContext, NormalizedBundlerOptions};
use packrat_error::BuildDiagnostic;

/// Flattens the three rule tiers into the concrete loader chain for one
/// resource: every matching pre rule, then every matching normal rule, then
/// every matching post rule, each contributing its loaders in listed order.
pub fn matching_loaders(options: &NormalizedBundlerOptions, resource: &str) -> Vec<Loader> {
  let mut chain = Vec::new();
  for tier in [&options.pre_loaders, &options.loaders, &options.post_loaders] {
    for rule in tier {
      if rule.applies_to(resource) {
        chain.extend(rule.loaders.iter().cloned());
      }
    }
  }
  chain
}

pub fn chain_signature(chain: &[Loader]) -> String {
  chain.iter().map(Loader::signature).join("!")
}

/// Runs the chain in order, threading the source through each transform. The
/// first failing loader aborts the chain; the module is then marked failed
/// while the rest of the build continues.
pub async fn run_chain(
  chain: &[Loader],
  resource: &str,
  mut source: String,
) -> Result<(String, Vec<String>), BuildDiagnostic> {
  let mut extra_dependencies = Vec::new();
  for loader in chain {
    let context = LoaderContext { resource: resource.to_string(), query: loader.query.clone() };
    let output = (loader.transform)(context, source).await.map_err(|error| {
      BuildDiagnostic::LoaderFailure {
        loader: loader.name.clone(),
        module: resource.to_string(),
        reason: format!("{error:#}"),
      }
    })?;
    source = output.source;
    extra_dependencies.extend(output.extra_dependencies);
  }
  Ok((source, extra_dependencies))
}
