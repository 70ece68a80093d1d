//! Compiler and linker flag assembly.
//!
//! Flags are built by folding a fixed list of independent toggles over the
//! platform fragment. Each toggle owns a disjoint snippet and contributes it only
//! when its predicate holds, so toggles never interact. Nothing is deduplicated:
//! the downstream tools accept repeated flags and honor the last one.

use serde::Serialize;

use crate::config::{Features, TraceMode};
use crate::platform::PlatformFlags;

/// One optional feature and the flags it adds.
pub struct Toggle {
  pub name: &'static str,
  pub enabled: fn(&Features) -> bool,
  pub cflags: &'static [&'static str],
  pub ldflags: &'static [&'static str],
}

/// Feature toggles in the order their snippets are appended.
pub static TOGGLES: &[Toggle] = &[
  Toggle {
    name: "coverage",
    enabled: |f| f.coverage,
    cflags: &["-DVM_COVERAGE"],
    ldflags: &[],
  },
  Toggle {
    name: "trace-fst",
    enabled: |f| f.trace == TraceMode::Fst,
    cflags: &["-DTRACE_FST"],
    ldflags: &[],
  },
  Toggle {
    name: "savable",
    enabled: |f| f.savable,
    cflags: &["-DSAVABLE"],
    ldflags: &[],
  },
  Toggle {
    name: "video",
    enabled: |f| f.video,
    cflags: &["-DWITH_VIDEO"],
    ldflags: &["-lSDL2"],
  },
];

/// Final compiler and linker flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssembledFlags {
  pub cflags: Vec<String>,
  pub ldflags: Vec<String>,
}

impl AssembledFlags {
  /// Compiler flags as a single space-separated string.
  pub fn cflags_string(&self) -> String {
    self.cflags.join(" ")
  }

  /// Linker flags as a single space-separated string.
  pub fn ldflags_string(&self) -> String {
    self.ldflags.join(" ")
  }
}

/// Merge the platform fragment with the optimization level and enabled toggles.
///
/// Order: platform flags, include paths, the optimization level, then toggle
/// snippets, so toggles come last and win under last-flag-wins semantics.
pub fn assemble(platform: &PlatformFlags, opt_level: &str, features: &Features) -> AssembledFlags {
  let mut flags = AssembledFlags {
    cflags: platform
      .cflags
      .iter()
      .map(|f| f.to_string())
      .chain(platform.include_flags())
      .collect(),
    ldflags: platform.link_flags().collect(),
  };

  if !opt_level.is_empty() {
    flags.cflags.push(opt_level.to_string());
  }

  TOGGLES
    .iter()
    .filter(|toggle| (toggle.enabled)(features))
    .fold(flags, |mut acc, toggle| {
      acc.cflags.extend(toggle.cflags.iter().map(|f| f.to_string()));
      acc.ldflags.extend(toggle.ldflags.iter().map(|f| f.to_string()));
      acc
    })
}
