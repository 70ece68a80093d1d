//! Types for build execution.
//!
//! This module defines the error type, build targets, the top-level state
//! machine and the report returned by a successful run.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// The kind of work a task performs; used in logs and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
  Compile,
  Modules,
  Generate,
  Link,
}

impl Stage {
  /// Lowercase stage name, as used in logs and error messages.
  pub fn as_str(&self) -> &'static str {
    match self {
      Stage::Compile => "compile",
      Stage::Modules => "modules",
      Stage::Generate => "generate",
      Stage::Link => "link",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Errors that can occur during a build.
#[derive(Debug, Error)]
pub enum BuildError {
  /// An external tool ran and exited unsuccessfully.
  #[error("{stage} failed: `{program}` exited with {}", describe_code(.code))]
  ToolFailed {
    stage: Stage,
    program: String,
    code: Option<i32>,
  },

  /// An external tool could not be started.
  #[error("failed to run `{program}`: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// Two auxiliary sources map to the same object file.
  #[error("object {} would be built from both {} and {}", .object.display(), .first.display(), .second.display())]
  ObjectCollision {
    object: PathBuf,
    first: PathBuf,
    second: PathBuf,
  },

  /// A directory could not be created.
  #[error("failed to create directory {}: {source}", .path.display())]
  CreateDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A directory could not be removed.
  #[error("failed to remove directory {}: {source}", .path.display())]
  RemoveDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// I/O error during execution.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// Cycle detected in the task graph.
  #[error("dependency cycle detected")]
  CycleDetected,

  /// A task panicked or was cancelled before finishing.
  #[error("task did not complete: {0}")]
  Join(String),

  /// The build was interrupted (e.g. Ctrl-C) and in-flight tools were killed.
  #[error("build interrupted")]
  Interrupted,
}

fn describe_code(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("code {}", code),
    None => "a signal".to_string(),
  }
}

impl BuildError {
  /// Process exit code for this failure.
  ///
  /// A failing tool's own exit code is propagated. An interrupt exits with
  /// 130, the shell convention for death by SIGINT. Everything else is 1.
  pub fn exit_code(&self) -> u8 {
    match self {
      BuildError::ToolFailed { code: Some(code), .. } => u8::try_from(*code).ok().filter(|&c| c != 0).unwrap_or(1),
      BuildError::Interrupted => 130,
      _ => 1,
    }
  }
}

/// What to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
  /// Modules and the simulator.
  #[default]
  All,
  /// The simulator only.
  Sim,
  /// The modules build only.
  Modules,
}

impl Target {
  pub fn includes_sim(&self) -> bool {
    matches!(self, Target::All | Target::Sim)
  }

  pub fn includes_modules(&self) -> bool {
    matches!(self, Target::All | Target::Modules)
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Target::All => "all",
      Target::Sim => "sim",
      Target::Modules => "modules",
    })
  }
}

impl Stage {
  /// The state entered once every task of this stage has finished.
  pub fn completed_state(&self) -> BuildState {
    match self {
      Stage::Compile => BuildState::ObjectsCompiled,
      Stage::Modules => BuildState::SubmodulesBuilt,
      Stage::Generate => BuildState::Generated,
      Stage::Link => BuildState::Linked,
    }
  }
}

/// States of a build, in the order they are entered.
///
/// `ObjectsCompiled` and `SubmodulesBuilt` are reached concurrently; any
/// failure moves straight to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildState {
  Start,
  PlatformResolved,
  FlagsAssembled,
  ObjectsCompiled,
  SubmodulesBuilt,
  Generated,
  Linked,
  Done,
  Failed,
}

/// Whether a task had to do any work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
  Ran,
  UpToDate,
}

/// Summary of a build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
  pub target: Target,
  pub states: Vec<BuildState>,
  /// Objects that were (re)compiled.
  pub compiled: Vec<PathBuf>,
  /// Objects skipped because they were newer than their source.
  pub up_to_date: Vec<PathBuf>,
  /// Number of tool invocations performed.
  pub invocations: usize,
  /// The simulator executable, when the simulator was built.
  pub executable: Option<PathBuf>,
}

impl BuildReport {
  /// Move to `state`. Entering the current state again is a no-op.
  pub(crate) fn enter(&mut self, state: BuildState) {
    if self.states.last() != Some(&state) {
      debug!(?state, "build state");
      self.states.push(state);
    }
  }
}
