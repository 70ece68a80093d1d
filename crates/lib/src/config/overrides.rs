//! Variable-style overrides from the environment and the command line.
//!
//! Both sources produce a [`BuildOverrides`]; the command line is merged on top
//! of the environment so an explicit flag always wins.

use std::path::PathBuf;

/// Environment variable names recognized as overrides.
pub mod vars {
  pub const CC: &str = "CC";
  pub const COVERAGE: &str = "COVERAGE";
  pub const TRACE: &str = "TRACE";
  pub const TRACE_FST: &str = "TRACE_FST";
  pub const SAVABLE: &str = "SAVABLE";
  pub const VIDEO: &str = "VIDEO";
  pub const THREADS: &str = "THREADS";
  pub const JOBS: &str = "JOBS";
  pub const OPT_LEVEL: &str = "OPT_LEVEL";
  pub const CC_SRCS: &str = "CC_SRCS";
  pub const VERILATOR: &str = "VERILATOR";
  pub const MAKE: &str = "MAKE";
  pub const BUILD_DIR: &str = "BUILD_DIR";
}

/// A partial configuration. `None` means "not set at this layer".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOverrides {
  pub cc: Option<String>,
  pub coverage: Option<bool>,
  pub trace: Option<bool>,
  pub trace_fst: Option<bool>,
  pub savable: Option<bool>,
  pub video: Option<bool>,
  pub threads: Option<String>,
  pub jobs: Option<String>,
  pub opt_level: Option<String>,
  pub cc_srcs: Option<String>,
  pub verilator: Option<String>,
  pub make: Option<String>,
  pub build_dir: Option<PathBuf>,
  pub parallelism: Option<usize>,
}

impl BuildOverrides {
  /// Read overrides from the process environment.
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Read overrides through an arbitrary variable lookup.
  ///
  /// Empty values count as unset, matching make's `ifdef`: any non-empty value
  /// enables a toggle, including `0`.
  pub fn from_lookup<F>(lookup: F) -> Self
  where
    F: Fn(&str) -> Option<String>,
  {
    let value = |key: &str| lookup(key).filter(|v| !v.is_empty());
    let toggle = |key: &str| value(key).map(|_| true);

    Self {
      cc: value(vars::CC),
      coverage: toggle(vars::COVERAGE),
      trace: toggle(vars::TRACE),
      trace_fst: toggle(vars::TRACE_FST),
      savable: toggle(vars::SAVABLE),
      video: toggle(vars::VIDEO),
      threads: value(vars::THREADS),
      jobs: value(vars::JOBS),
      opt_level: value(vars::OPT_LEVEL),
      cc_srcs: value(vars::CC_SRCS),
      verilator: value(vars::VERILATOR),
      make: value(vars::MAKE),
      build_dir: value(vars::BUILD_DIR).map(PathBuf::from),
      parallelism: None,
    }
  }

  /// Layer `higher` on top of `self`; every field set in `higher` wins.
  pub fn merge(self, higher: BuildOverrides) -> Self {
    Self {
      cc: higher.cc.or(self.cc),
      coverage: higher.coverage.or(self.coverage),
      trace: higher.trace.or(self.trace),
      trace_fst: higher.trace_fst.or(self.trace_fst),
      savable: higher.savable.or(self.savable),
      video: higher.video.or(self.video),
      threads: higher.threads.or(self.threads),
      jobs: higher.jobs.or(self.jobs),
      opt_level: higher.opt_level.or(self.opt_level),
      cc_srcs: higher.cc_srcs.or(self.cc_srcs),
      verilator: higher.verilator.or(self.verilator),
      make: higher.make.or(self.make),
      build_dir: higher.build_dir.or(self.build_dir),
      parallelism: higher.parallelism.or(self.parallelism),
    }
  }
}
