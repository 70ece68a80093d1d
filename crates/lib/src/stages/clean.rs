//! Removal of build output.
//!
//! Only the build-output directory is removed. The modules output belongs to
//! the nested build and survives a clean.

use std::io::ErrorKind;

use tracing::info;

use crate::config::BuildConfig;
use crate::execute::types::BuildError;

/// What a clean did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanOutcome {
  Removed,
  AlreadyClean,
}

/// Remove the build-output directory. Cleaning a clean tree succeeds.
pub fn clean(config: &BuildConfig) -> Result<CleanOutcome, BuildError> {
  let dir = &config.build_dir;
  match std::fs::remove_dir_all(dir) {
    Ok(()) => {
      info!(dir = %dir.display(), "removed build output");
      Ok(CleanOutcome::Removed)
    }
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(CleanOutcome::AlreadyClean),
    Err(source) => Err(BuildError::RemoveDir {
      path: dir.clone(),
      source,
    }),
  }
}
