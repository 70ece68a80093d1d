//! Auxiliary source discovery.
//!
//! Every `*.c` file directly inside a configured source directory becomes one
//! [`SourceUnit`] whose object lives in the build-output directory under the
//! same stem. Object names must be unique across all directories.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::execute::BuildError;

/// Extension of the auxiliary sources picked up by discovery.
const AUX_SOURCE_EXT: &str = "c";

/// Extension of compiled auxiliary objects.
const OBJECT_EXT: &str = "o";

/// One auxiliary source and the object it compiles to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceUnit {
  pub source: PathBuf,
  pub object: PathBuf,
}

impl SourceUnit {
  /// Object file name, e.g. `ethernet.o`.
  pub fn object_name(&self) -> String {
    self
      .object
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }
}

/// The auxiliary sources of one build, in a deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSet {
  units: Vec<SourceUnit>,
}

impl SourceSet {
  /// Scan `src_dirs` (non-recursively) for auxiliary sources.
  ///
  /// Missing directories contribute nothing. Two sources that map to the same
  /// object name are an error.
  pub fn discover(src_dirs: &[PathBuf], build_dir: &Path) -> Result<Self, BuildError> {
    let mut sources = Vec::new();

    for dir in src_dirs {
      if !dir.is_dir() {
        debug!(dir = %dir.display(), "source directory missing, skipping");
        continue;
      }

      let mut found: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == AUX_SOURCE_EXT))
        .collect();
      found.sort();
      sources.extend(found);
    }

    Self::from_sources(sources, build_dir)
  }

  /// Map explicit source paths to objects in `build_dir`.
  pub fn from_sources(sources: Vec<PathBuf>, build_dir: &Path) -> Result<Self, BuildError> {
    let mut owners: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut units = Vec::with_capacity(sources.len());

    for source in sources {
      let Some(stem) = source.file_stem() else {
        continue;
      };
      let object = build_dir.join(Path::new(stem).with_extension(OBJECT_EXT));

      if let Some(first) = owners.get(&object) {
        return Err(BuildError::ObjectCollision {
          object,
          first: first.clone(),
          second: source,
        });
      }
      owners.insert(object.clone(), source.clone());
      units.push(SourceUnit { source, object });
    }

    debug!(count = units.len(), "discovered auxiliary sources");
    Ok(Self { units })
  }

  /// Every unit, in discovery order.
  pub fn units(&self) -> &[SourceUnit] {
    &self.units
  }

  /// Whether no auxiliary source was found.
  pub fn is_empty(&self) -> bool {
    self.units.is_empty()
  }

  /// Object paths in discovery order, as handed to the translator.
  pub fn objects(&self) -> impl Iterator<Item = &Path> {
    self.units.iter().map(|u| u.object.as_path())
  }
}
