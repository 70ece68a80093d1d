//! Build configuration.
//!
//! A [`BuildConfig`] is resolved once per invocation from, lowest precedence
//! first: built-in defaults, the project file, environment variables and
//! command-line flags. It is then passed explicitly to every stage; nothing
//! downstream reads the environment or the working directory.

pub mod overrides;
pub mod project;

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::platform::{Platform, PlatformFlags};

pub use overrides::BuildOverrides;
pub use project::{Project, ProjectFile};

/// Top-level hardware module handed to the translator.
const DEFAULT_TOP_MODULE: &str = "sim";

/// Directory holding the auxiliary C sources and the simulator wrappers.
const DEFAULT_SRC_DIR: &str = "src";

/// Build-output directory: objects and the translator's generated build.
const DEFAULT_BUILD_DIR: &str = "obj_dir";

/// Output directory of the nested modules build.
const DEFAULT_MODULES_DIR: &str = "modules";

/// Makefile driving the modules build, relative to the first source directory.
const DEFAULT_MODULES_MAKEFILE: &str = "modules/Makefile";

/// Hand-written C++ wrappers compiled into the simulator, relative to the first source directory.
const DEFAULT_WRAPPER_SOURCES: &[&str] = &["sim_init.cpp", "veril.cpp"];

const DEFAULT_OPT_LEVEL: &str = "-O3";
const DEFAULT_VERILATOR: &str = "verilator";
const DEFAULT_MAKE: &str = "make";

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read project file {}: {source}", .path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse project file {}: {source}", .path.display())]
  Parse {
    path: PathBuf,
    #[source]
    source: Box<toml::de::Error>,
  },
}

/// Waveform tracing compiled into the simulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceMode {
  #[default]
  None,
  /// The translator's default trace format.
  Vcd,
  /// Structured FST traces.
  Fst,
}

/// Optional features of the generated simulator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Features {
  pub coverage: bool,
  pub trace: TraceMode,
  pub savable: bool,
  /// Raw `THREADS` value, forwarded without validation.
  pub threads: Option<String>,
  pub video: bool,
}

impl Features {
  /// The thread count to forward to the translator, if any.
  ///
  /// Unset, zero and negative values mean single-threaded and are dropped.
  /// Anything that is not an integer is forwarded as-is for the translator to reject.
  pub fn thread_count(&self) -> Option<&str> {
    let raw = self.threads.as_deref()?.trim();
    match raw.parse::<i64>() {
      Ok(n) if n <= 0 => None,
      _ if raw.is_empty() => None,
      _ => Some(raw),
    }
  }
}

/// Fully resolved configuration for one build invocation.
#[derive(Debug, Clone, Serialize)]
pub struct BuildConfig {
  /// Detected host, `None` when unrecognized.
  #[serde(serialize_with = "serialize_platform")]
  pub platform: Option<Platform>,
  pub toolchain: &'static PlatformFlags,
  pub compiler: String,
  pub opt_level: String,
  pub features: Features,
  /// Raw `JOBS` value for the native link stage.
  pub jobs: Option<String>,

  pub src_dirs: Vec<PathBuf>,
  /// Absolute build-output directory.
  pub build_dir: PathBuf,
  pub modules_dir: PathBuf,
  pub modules_makefile: PathBuf,
  pub top_module: String,
  pub wrapper_sources: Vec<PathBuf>,
  /// Hardware source reference, split on whitespace when forwarded.
  pub cc_srcs: String,

  pub verilator: String,
  pub make: String,
  pub verilator_args: Vec<String>,

  /// Maximum number of concurrently running tasks.
  pub parallelism: usize,
}

fn serialize_platform<S: serde::Serializer>(platform: &Option<Platform>, s: S) -> Result<S::Ok, S::Error> {
  match platform {
    Some(p) => s.serialize_some(&p.triple()),
    None => s.serialize_none(),
  }
}

impl BuildConfig {
  /// Resolve a configuration.
  ///
  /// `cwd` anchors relative paths given through overrides; project file paths
  /// are anchored at the project root.
  pub fn resolve(project: &Project, overrides: BuildOverrides, platform: Option<Platform>, cwd: &Path) -> Self {
    let file = &project.file;
    let toolchain = crate::platform::resolve(platform);

    let src_dirs: Vec<PathBuf> = match &file.src_dirs {
      Some(dirs) if !dirs.is_empty() => dirs.iter().map(|d| project.path(d)).collect(),
      _ => vec![project.path(Path::new(DEFAULT_SRC_DIR))],
    };
    let primary_src = src_dirs[0].clone();

    let build_dir = match overrides.build_dir {
      Some(dir) => dir,
      None => project.path(file.build_dir.as_deref().unwrap_or(Path::new(DEFAULT_BUILD_DIR))),
    };
    let build_dir = absolutize(cwd, &build_dir);

    let modules_dir = project.path(file.modules_dir.as_deref().unwrap_or(Path::new(DEFAULT_MODULES_DIR)));
    let modules_makefile = match &file.modules_makefile {
      Some(path) => project.path(path),
      None => primary_src.join(DEFAULT_MODULES_MAKEFILE),
    };

    let top_module = file.top_module.clone().unwrap_or_else(|| DEFAULT_TOP_MODULE.to_string());
    let wrapper_sources = match &file.wrapper_sources {
      Some(sources) => sources.iter().map(|s| project.path(s)).collect(),
      None => DEFAULT_WRAPPER_SOURCES.iter().map(|s| primary_src.join(s)).collect(),
    };
    let cc_srcs = overrides
      .cc_srcs
      .or_else(|| file.cc_srcs.clone())
      .unwrap_or_else(|| format!("--cc {}.v", top_module));

    let trace = if overrides.trace_fst.unwrap_or(false) {
      TraceMode::Fst
    } else if overrides.trace.unwrap_or(false) {
      TraceMode::Vcd
    } else {
      TraceMode::None
    };

    let features = Features {
      coverage: overrides.coverage.unwrap_or(false),
      trace,
      savable: overrides.savable.unwrap_or(false),
      threads: overrides.threads,
      video: overrides.video.unwrap_or(false),
    };

    Self {
      platform,
      toolchain,
      compiler: overrides.cc.unwrap_or_else(|| toolchain.compiler.to_string()),
      opt_level: overrides
        .opt_level
        .or_else(|| file.opt_level.clone())
        .unwrap_or_else(|| DEFAULT_OPT_LEVEL.to_string()),
      features,
      jobs: overrides.jobs,
      src_dirs,
      build_dir,
      modules_dir,
      modules_makefile,
      top_module,
      wrapper_sources,
      cc_srcs,
      verilator: overrides
        .verilator
        .or_else(|| file.verilator.clone())
        .unwrap_or_else(|| DEFAULT_VERILATOR.to_string()),
      make: overrides
        .make
        .or_else(|| file.make.clone())
        .unwrap_or_else(|| DEFAULT_MAKE.to_string()),
      verilator_args: file.verilator_args.clone(),
      parallelism: overrides.parallelism.filter(|&n| n > 0).unwrap_or_else(num_cpus),
    }
  }

  /// Directory passed to the C compiler as an include path for auxiliary sources.
  pub fn primary_src_dir(&self) -> &Path {
    &self.src_dirs[0]
  }

  /// Name of the executable the native build produces (`V<top>`).
  pub fn executable_name(&self) -> String {
    format!("V{}", self.top_module)
  }

  /// Makefile the translator writes into the build directory (`V<top>.mk`).
  pub fn generated_makefile(&self) -> String {
    format!("V{}.mk", self.top_module)
  }
}

fn absolutize(base: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() {
    path.to_path_buf()
  } else {
    base.join(path)
  }
}

/// Get the number of CPUs for default parallelism.
fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}
