//! Filesystem helpers shared by the stages.

use std::path::Path;
use std::time::SystemTime;

use tracing::debug;

use crate::execute::BuildError;

/// Create `dir` and its parents.
///
/// Succeeds when the directory already exists, including when another task
/// creates it concurrently.
pub async fn ensure_dir(dir: &Path) -> Result<(), BuildError> {
  match tokio::fs::create_dir_all(dir).await {
    Ok(()) => Ok(()),
    Err(_) if dir.is_dir() => Ok(()),
    Err(source) => Err(BuildError::CreateDir {
      path: dir.to_path_buf(),
      source,
    }),
  }
}

/// Whether `output` exists and is at least as new as `input`.
///
/// A missing or unreadable input counts as stale so the tool runs and reports
/// the problem itself.
pub fn is_up_to_date(input: &Path, output: &Path) -> bool {
  let (Some(input_time), Some(output_time)) = (modified(input), modified(output)) else {
    return false;
  };
  let fresh = output_time >= input_time;
  debug!(input = %input.display(), output = %output.display(), fresh, "timestamp check");
  fresh
}

fn modified(path: &Path) -> Option<SystemTime> {
  std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
