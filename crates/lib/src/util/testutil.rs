//! Test utilities for vsimbuild-lib.
//!
//! Cross-platform shell helpers and runners that stand in for the real
//! compiler, translator and make.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::execute::process::{Invocation, ToolRunner};
use crate::execute::types::{BuildError, Stage};

/// Returns the shell command and args to execute a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("/bin/sh", vec!["-c".to_string(), script.to_string()])
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> (&'static str, Vec<String>) {
  ("cmd.exe", vec!["/C".to_string(), script.to_string()])
}

/// Write an executable shell script into `dir` and return its path.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join(name);
  std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
  let mut perms = std::fs::metadata(&path).unwrap().permissions();
  perms.set_mode(0o755);
  std::fs::set_permissions(&path, perms).unwrap();
  path
}

/// A runner that records every invocation and fails the first one of `fail_stage`.
///
/// Compile invocations "produce" their object by writing the `-o` target, so
/// timestamp checks behave as with a real compiler.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
  pub fail_stage: Option<(Stage, i32)>,
  pub calls: Mutex<Vec<(Stage, Invocation)>>,
}

impl ScriptedRunner {
  pub fn failing(stage: Stage, code: i32) -> Self {
    Self {
      fail_stage: Some((stage, code)),
      ..Self::default()
    }
  }

  pub fn calls_for(&self, stage: Stage) -> Vec<Invocation> {
    self
      .calls
      .lock()
      .unwrap()
      .iter()
      .filter(|(s, _)| *s == stage)
      .map(|(_, i)| i.clone())
      .collect()
  }

  pub fn stages(&self) -> Vec<Stage> {
    self.calls.lock().unwrap().iter().map(|(s, _)| *s).collect()
  }
}

impl ToolRunner for ScriptedRunner {
  async fn run(&self, stage: Stage, invocation: &Invocation) -> Result<(), BuildError> {
    self.calls.lock().unwrap().push((stage, invocation.clone()));

    if let Some((fail, code)) = self.fail_stage
      && fail == stage
    {
      return Err(BuildError::ToolFailed {
        stage,
        program: invocation.program.clone(),
        code: Some(code),
      });
    }

    if stage == Stage::Compile
      && let Some(object) = invocation.value_of("-o")
    {
      std::fs::write(object, b"obj")?;
    }
    Ok(())
  }
}
