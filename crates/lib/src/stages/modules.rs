//! Nested modules build.
//!
//! The modules build is self-contained: it only gets its output directory and
//! its makefile, never any simulator flag.

use crate::config::BuildConfig;
use crate::execute::process::{Invocation, ToolRunner};
use crate::execute::types::{BuildError, Stage};
use crate::util::fs::ensure_dir;

/// `<make> -C <modules dir> -f <modules makefile>`
pub fn invocation(config: &BuildConfig) -> Invocation {
  let mut invocation = Invocation::from_command(&config.make);
  invocation
    .arg("-C")
    .arg(&config.modules_dir)
    .arg("-f")
    .arg(&config.modules_makefile);
  invocation
}

/// Create the modules directory and hand over to the nested build.
pub async fn build<R: ToolRunner>(config: &BuildConfig, runner: &R) -> Result<(), BuildError> {
  ensure_dir(&config.modules_dir).await?;
  runner.run(Stage::Modules, &invocation(config)).await
}

#[cfg(test)]
mod tests {
  use tempfile::TempDir;

  use super::*;
  use crate::config::{BuildOverrides, Project};
  use crate::util::testutil::ScriptedRunner;

  #[tokio::test]
  async fn creates_directory_then_delegates() {
    let temp = TempDir::new().unwrap();
    let config = BuildConfig::resolve(&Project::bare(temp.path()), BuildOverrides::default(), None, temp.path());
    let runner = ScriptedRunner::default();

    build(&config, &runner).await.unwrap();
    build(&config, &runner).await.unwrap();

    assert!(config.modules_dir.is_dir());
    let calls = runner.calls_for(Stage::Modules);
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].value_of("-C"), Some(config.modules_dir.display().to_string()));
    assert_eq!(calls[0].value_of("-f"), Some(config.modules_makefile.display().to_string()));
  }

  #[test]
  fn feature_flags_never_reach_the_modules_build() {
    let mut config = BuildConfig::resolve(
      &Project::bare("/work"),
      BuildOverrides::default(),
      None,
      std::path::Path::new("/work"),
    );
    let plain = invocation(&config);

    config.features.coverage = true;
    config.features.savable = true;
    config.features.threads = Some("4".to_string());
    config.jobs = Some("16".to_string());
    assert_eq!(invocation(&config), plain);
  }
}
