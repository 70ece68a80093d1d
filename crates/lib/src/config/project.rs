//! Optional `vsimbuild.toml` project file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::ConfigError;

/// Project file looked up in the working directory.
const PROJECT_FILE: &str = "vsimbuild.toml";

/// Settings read from the project file. Every field is optional; unset fields
/// fall back to the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectFile {
  pub src_dirs: Option<Vec<PathBuf>>,
  pub build_dir: Option<PathBuf>,
  pub modules_dir: Option<PathBuf>,
  pub modules_makefile: Option<PathBuf>,
  pub top_module: Option<String>,
  pub wrapper_sources: Option<Vec<PathBuf>>,
  pub cc_srcs: Option<String>,
  pub verilator: Option<String>,
  pub make: Option<String>,
  pub verilator_args: Vec<String>,
  pub opt_level: Option<String>,
}

/// A parsed project file together with the directory its relative paths refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
  pub root: PathBuf,
  pub file: ProjectFile,
}

impl Project {
  /// A project with no file: defaults only, paths relative to `root`.
  pub fn bare(root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      file: ProjectFile::default(),
    }
  }

  /// Parse the project file at `path`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let file: ProjectFile = toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source: Box::new(source),
    })?;

    let root = match path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
      _ => PathBuf::from("."),
    };
    let root = dunce::canonicalize(&root).unwrap_or(root);

    debug!(path = %path.display(), root = %root.display(), "loaded project file");
    Ok(Self { root, file })
  }

  /// Load `path` if given, otherwise `vsimbuild.toml` in `dir` if it exists,
  /// otherwise a bare project rooted at `dir`.
  pub fn discover(dir: &Path, path: Option<&Path>) -> Result<Self, ConfigError> {
    if let Some(path) = path {
      return Self::load(path);
    }

    let candidate = dir.join(PROJECT_FILE);
    if candidate.is_file() {
      Self::load(&candidate)
    } else {
      Ok(Self::bare(dir))
    }
  }

  /// Resolve a path from the project file against the project root.
  pub fn path(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.root.join(path)
    }
  }
}
