//! Object compilation of auxiliary sources.

use tracing::debug;

use crate::config::BuildConfig;
use crate::execute::process::{Invocation, ToolRunner};
use crate::execute::types::{BuildError, Stage, TaskOutcome};
use crate::flags::AssembledFlags;
use crate::sources::SourceUnit;
use crate::util::fs::{ensure_dir, is_up_to_date};

/// `<cc> -c <cflags> -I<source dir> -o <object> <source>`
pub fn invocation(config: &BuildConfig, flags: &AssembledFlags, unit: &SourceUnit) -> Invocation {
  let include_dir = unit.source.parent().unwrap_or(config.primary_src_dir());

  let mut invocation = Invocation::from_command(&config.compiler);
  invocation
    .arg("-c")
    .args(&flags.cflags)
    .arg(format!("-I{}", include_dir.display()))
    .arg("-o")
    .arg(&unit.object)
    .arg(&unit.source);
  invocation
}

/// Name of the file in the build directory that records what the objects were
/// compiled with.
pub const FLAGS_STAMP: &str = ".vsimbuild-cflags";

/// The compiler command and flags every object depends on besides its source.
pub fn flags_stamp(config: &BuildConfig, flags: &AssembledFlags) -> String {
  format!("{}\n{}\n", config.compiler, flags.cflags_string())
}

/// Whether the objects on disk were built with something other than `stamp`.
///
/// A missing stamp counts as changed.
pub fn flags_changed(config: &BuildConfig, stamp: &str) -> bool {
  match std::fs::read_to_string(config.build_dir.join(FLAGS_STAMP)) {
    Ok(previous) => previous != stamp,
    Err(_) => true,
  }
}

/// Record `stamp` once every object has been compiled with it.
pub async fn write_flags_stamp(config: &BuildConfig, stamp: &str) -> Result<(), BuildError> {
  tokio::fs::write(config.build_dir.join(FLAGS_STAMP), stamp).await?;
  Ok(())
}

/// Compile one source unless its object is already newer.
///
/// `rebuild` skips the timestamp check, for when the flags changed since the
/// object was built. A failed compilation leaves no object behind, so the next
/// run retries it.
pub async fn compile<R: ToolRunner>(
  config: &BuildConfig,
  flags: &AssembledFlags,
  unit: &SourceUnit,
  rebuild: bool,
  runner: &R,
) -> Result<TaskOutcome, BuildError> {
  if !rebuild && is_up_to_date(&unit.source, &unit.object) {
    debug!(object = %unit.object.display(), "object up to date");
    return Ok(TaskOutcome::UpToDate);
  }

  ensure_dir(&config.build_dir).await?;
  if let Err(e) = runner.run(Stage::Compile, &invocation(config, flags, unit)).await {
    let _ = tokio::fs::remove_file(&unit.object).await;
    return Err(e);
  }
  Ok(TaskOutcome::Ran)
}
