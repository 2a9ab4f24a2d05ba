use std::path::Path;

use packrat_common::{ExternalsRule, ExternalsValue, NormalizedBundlerOptions, ResolvedId};
use packrat_error::BuildDiagnostic;
use packrat_fs::FileSystem;
use packrat_plugin::{HookAction, PluginDriver, ResolveArgs};
use packrat_resolver::{ResolveError, Resolver};

/// Full request-to-identity pipeline for one outgoing edge: resolve hooks
/// first (a Skip veto yields an ignored module), then the externals rules,
/// and only when neither claims the request the filesystem resolver. A
/// function-form external is awaited here; `Ok(None)` falls through.
pub async fn resolve_request<F: FileSystem + Default>(
  options: &NormalizedBundlerOptions,
  resolver: &Resolver<F>,
  plugins: &PluginDriver,
  importer_dir: Option<&Path>,
  request: &str,
) -> Result<ResolvedId, BuildDiagnostic> {
  let mut args = ResolveArgs {
    request: request.to_string(),
    context_dir: importer_dir.unwrap_or_else(|| resolver.cwd().as_path()).to_path_buf(),
  };
  if plugins.run_before_resolve(&mut args)? == HookAction::Skip {
    return Ok(ResolvedId::ignored(args.request));
  }

  for rule in &options.externals {
    match rule {
      ExternalsRule::Request(external) if external == &args.request => {
        return Ok(ResolvedId::external(args.request));
      }
      ExternalsRule::Pattern(pattern) if pattern.is_match(&args.request) => {
        return Ok(ResolvedId::external(args.request));
      }
      ExternalsRule::Map(map) => {
        if let Some(value) = map.get(&args.request) {
          match value {
            ExternalsValue::Enabled(true) => return Ok(ResolvedId::external(args.request)),
            // An explicit `false` forces normal resolution, overriding any
            // later rule.
            ExternalsValue::Enabled(false) => break,
            ExternalsValue::Substitute(name) => {
              return Ok(ResolvedId::external(name.clone()));
            }
          }
        }
      }
      ExternalsRule::Function(callback) => {
        if let Some(name) = callback(&args.context_dir, &args.request).await? {
          return Ok(ResolvedId::external(name));
        }
      }
      _ => {}
    }
  }

  match resolver.resolve(Some(&args.context_dir), &args.request) {
    Ok(id) => Ok(ResolvedId::normal(id)),
    Err(ResolveError::NotFound { specifier, context, tried }) => {
      Err(BuildDiagnostic::ResolutionFailure {
        specifier,
        context,
        tried: tried.iter().map(|path| path.display().to_string()).collect(),
      })
    }
  }
}
