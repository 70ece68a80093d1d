//! External tool invocations.
//!
//! Every call to the compiler, the translator or make is first described as an
//! [`Invocation`] and then handed to a [`ToolRunner`]. [`ProcessRunner`] spawns
//! real processes; [`DryRunRunner`] only prints and records them.

use std::ffi::OsString;
use std::fmt;
use std::future::Future;
use std::process::Stdio;
use std::sync::Mutex;

use tokio::process::Command;
use tracing::{debug, info};

use super::types::{BuildError, Stage};

/// A fully assembled command line.
///
/// Tools always run in the orchestrator's working directory, so every path in
/// `args` is absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: String,
  pub args: Vec<OsString>,
}

impl Invocation {
  /// An invocation of `program` without arguments.
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  /// Build an invocation from a make-style command variable such as
  /// `CC="ccache gcc"`: the first word is the program, the rest leading arguments.
  pub fn from_command(command: &str) -> Self {
    let mut words = command.split_whitespace();
    let mut invocation = Self::new(words.next().unwrap_or_default());
    invocation.args(words);
    invocation
  }

  /// Append one argument.
  pub fn arg(&mut self, arg: impl Into<OsString>) -> &mut Self {
    self.args.push(arg.into());
    self
  }

  /// Append several arguments in order.
  pub fn args<I, S>(&mut self, args: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }
}

#[cfg(test)]
impl Invocation {
  pub fn arg_strings(&self) -> Vec<String> {
    self.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
  }

  pub fn has_arg(&self, flag: &str) -> bool {
    self.args.iter().any(|a| a == flag)
  }

  /// The argument following the first occurrence of `flag`.
  pub fn value_of(&self, flag: &str) -> Option<String> {
    let pos = self.args.iter().position(|a| a == flag)?;
    self.args.get(pos + 1).map(|a| a.to_string_lossy().into_owned())
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", quote(&self.program))?;
    for arg in &self.args {
      write!(f, " {}", quote(&arg.to_string_lossy()))?;
    }
    Ok(())
  }
}

/// Single-quote a word for display if the shell would split or expand it.
fn quote(word: &str) -> String {
  let plain = !word.is_empty()
    && word
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
  if plain {
    word.to_string()
  } else {
    format!("'{}'", word.replace('\'', r"'\''"))
  }
}

/// Executes invocations on behalf of the build.
pub trait ToolRunner: Send + Sync + 'static {
  fn run(&self, stage: Stage, invocation: &Invocation) -> impl Future<Output = Result<(), BuildError>> + Send;

  /// Whether invocations really run. Build stamps are only written when they do.
  fn executes(&self) -> bool {
    true
  }
}

/// Spawns each invocation as a child process.
///
/// Output is inherited so the user sees exactly what the tool printed. On unix
/// each child leads its own process group, and the whole group is killed when
/// the task is dropped before the child exits. That is how a failed sibling or
/// an interrupt tears down in-flight work, including anything the tool forked.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
  async fn run(&self, stage: Stage, invocation: &Invocation) -> Result<(), BuildError> {
    info!(stage = %stage, "{}", invocation);

    let mut command = Command::new(&invocation.program);
    command.args(&invocation.args).stdin(Stdio::null()).kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command.spawn().map_err(|source| BuildError::Spawn {
      program: invocation.program.clone(),
      source,
    })?;
    let group = GroupGuard(child.id());
    let status = child.wait().await?;
    group.disarm();

    if !status.success() {
      return Err(BuildError::ToolFailed {
        stage,
        program: invocation.program.clone(),
        code: status.code(),
      });
    }

    debug!(stage = %stage, program = %invocation.program, "tool finished");
    Ok(())
  }
}

/// Kills a child's process group unless disarmed once the child was reaped.
///
/// The group id stays valid until the leader is reaped, so the kill never
/// reaches an unrelated group.
struct GroupGuard(Option<u32>);

impl GroupGuard {
  fn disarm(mut self) {
    self.0 = None;
  }
}

impl Drop for GroupGuard {
  fn drop(&mut self) {
    if let Some(id) = self.0.take() {
      kill_group(id);
    }
  }
}

#[cfg(unix)]
fn kill_group(id: u32) {
  use rustix::process::{Pid, Signal, kill_process_group};

  let Some(pid) = i32::try_from(id).ok().and_then(Pid::from_raw) else {
    return;
  };
  match kill_process_group(pid, Signal::KILL) {
    Ok(()) => debug!(pgid = id, "killed process group"),
    Err(err) => debug!(pgid = id, error = %err, "process group already gone"),
  }
}

#[cfg(not(unix))]
fn kill_group(_id: u32) {}

/// Prints invocations instead of running them, like `make -n`.
#[derive(Debug, Default)]
pub struct DryRunRunner {
  quiet: bool,
  recorded: Mutex<Vec<(Stage, Invocation)>>,
}

impl DryRunRunner {
  /// A runner that prints each invocation to stdout.
  pub fn new() -> Self {
    Self::default()
  }

  /// Everything run so far, in completion order.
  pub fn recorded(&self) -> Vec<(Stage, Invocation)> {
    self.recorded.lock().map(|r| r.clone()).unwrap_or_default()
  }
}

#[cfg(test)]
impl DryRunRunner {
  /// Record without printing.
  pub fn quiet() -> Self {
    Self {
      quiet: true,
      ..Self::default()
    }
  }

  pub fn recorded_for(&self, stage: Stage) -> Vec<Invocation> {
    self
      .recorded()
      .into_iter()
      .filter(|(s, _)| *s == stage)
      .map(|(_, i)| i)
      .collect()
  }
}

impl ToolRunner for DryRunRunner {
  async fn run(&self, stage: Stage, invocation: &Invocation) -> Result<(), BuildError> {
    if !self.quiet {
      println!("{}", invocation);
    }
    if let Ok(mut recorded) = self.recorded.lock() {
      recorded.push((stage, invocation.clone()));
    }
    Ok(())
  }

  fn executes(&self) -> bool {
    false
  }
}
