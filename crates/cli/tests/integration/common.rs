//! Shared test helpers for CLI integration tests.
//!
//! Every test gets a scratch project with two auxiliary sources and fake
//! `cc`, `verilator` and `make` scripts that append their command line to a
//! log instead of doing real work.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Writes the `-o` target so objects look freshly built.
const FAKE_CC: &str = r#"prev=""
out=""
for a in "$@"; do
  if [ "$prev" = "-o" ]; then out="$a"; fi
  prev="$a"
done
echo "cc $*" >> "$LOG"
: > "$out""#;

const FAKE_VERILATOR: &str = r#"echo "verilator $*" >> "$LOG"
exit "${FAKE_VERILATOR_EXIT:-0}""#;

const FAKE_MAKE: &str = r#"echo "make $*" >> "$LOG""#;

/// Isolated project directory with fake tools.
pub struct TestEnv {
  pub temp: TempDir,
  pub log: PathBuf,
  bin: PathBuf,
}

impl TestEnv {
  /// A project with `src/uart.c` and `src/eth.c`.
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();
    let log = root.join("tools.log");
    let bin = root.join("bin");
    std::fs::create_dir_all(&bin).unwrap();

    let env = Self { temp, log, bin };
    env.write_tool("cc", FAKE_CC);
    env.write_tool("verilator", FAKE_VERILATOR);
    env.write_tool("make", FAKE_MAKE);
    env.write_file("src/uart.c", "int uart;");
    env.write_file("src/eth.c", "int eth;");
    env
  }

  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
    self.root().join(relative)
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.path(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Replace one of the fake tools. The script sees `$LOG`.
  pub fn write_tool(&self, name: &str, body: &str) {
    let path = self.bin.join(name);
    std::fs::write(&path, format!("#!/bin/sh\nLOG='{}'\n{}\n", self.log.display(), body)).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
  }

  /// The binary, run in the project with a clean environment pointing at the fake tools.
  pub fn cmd(&self) -> Command {
    Command::from_std(self.std_cmd())
  }

  /// Same as [`TestEnv::cmd`], for tests that need to spawn and signal the process.
  pub fn std_cmd(&self) -> std::process::Command {
    let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_vsimbuild"));
    cmd
      .current_dir(self.root())
      .env_clear()
      .env("PATH", std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".to_string()))
      .env("CC", self.bin.join("cc"))
      .env("VERILATOR", self.bin.join("verilator"))
      .env("MAKE", self.bin.join("make"));
    cmd
  }

  /// Logged command lines, in invocation order.
  pub fn log_lines(&self) -> Vec<String> {
    std::fs::read_to_string(&self.log)
      .unwrap_or_default()
      .lines()
      .map(str::to_string)
      .collect()
  }

  /// Logged command lines of one tool.
  pub fn calls(&self, tool: &str) -> Vec<String> {
    let prefix = format!("{} ", tool);
    self.log_lines().into_iter().filter(|l| l.starts_with(&prefix)).collect()
  }

  pub fn clear_log(&self) {
    let _ = std::fs::remove_file(&self.log);
  }
}
