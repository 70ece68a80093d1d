mod build;
mod clean;
mod info;

pub use build::cmd_build;
pub use clean::cmd_clean;
pub use info::cmd_info;

use anyhow::{Context, Result};
use vsimbuild_lib::config::{BuildConfig, BuildOverrides, Project};
use vsimbuild_lib::platform::Platform;

use crate::GlobalOpts;

/// Resolve the configuration for this invocation: project file, then the
/// environment, then command-line flags.
fn resolve_config(opts: &GlobalOpts) -> Result<BuildConfig> {
  let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
  let cwd = dunce::canonicalize(&cwd).unwrap_or(cwd);

  let project = Project::discover(&cwd, opts.config.as_deref())?;
  let overrides = BuildOverrides::from_env().merge(opts.overrides());

  Ok(BuildConfig::resolve(&project, overrides, Platform::current(), &cwd))
}
