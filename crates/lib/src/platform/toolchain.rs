//! Per-platform toolchain table.
//!
//! Maps a normalized (OS, architecture) key to the base compiler, include paths,
//! library search paths and link libraries the simulator build needs. Every key
//! that is not listed, and every host that cannot be identified at all, falls
//! back to [`DEFAULT_TOOLCHAIN`] without an error, a Linux-like GCC setup.

use serde::Serialize;

use super::Platform;
use super::arch::Arch;
use super::os::Os;

/// Immutable toolchain fragment for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformFlags {
  /// Short name used in logs and `info` output.
  pub name: &'static str,
  /// Compiler used when `CC` is not overridden.
  pub compiler: &'static str,
  /// Compiler flags that always come first (e.g. debug info).
  pub cflags: &'static [&'static str],
  pub include_paths: &'static [&'static str],
  pub library_paths: &'static [&'static str],
  /// Raw linker arguments placed before the libraries.
  pub link_args: &'static [&'static str],
  /// Library names, without the `-l` prefix, in link order.
  pub link_libs: &'static [&'static str],
}

const SIM_LIBS: &[&str] = &["pthread", "json-c", "z", "m", "stdc++", "dl", "event"];

const MACOS_X86_64: PlatformFlags = PlatformFlags {
  name: "macos-intel",
  compiler: "cc",
  cflags: &[],
  include_paths: &["/usr/local/include"],
  library_paths: &["/usr/local/lib"],
  link_args: &[],
  link_libs: SIM_LIBS,
};

const MACOS_AARCH64: PlatformFlags = PlatformFlags {
  name: "macos-homebrew",
  compiler: "cc",
  cflags: &[],
  include_paths: &["/opt/homebrew/include"],
  library_paths: &["/opt/homebrew/lib"],
  link_args: &[],
  link_libs: SIM_LIBS,
};

/// Generic Linux-like toolchain used for every platform not in the table.
pub const DEFAULT_TOOLCHAIN: PlatformFlags = PlatformFlags {
  name: "generic",
  compiler: "gcc",
  cflags: &["-ggdb"],
  include_paths: &[],
  library_paths: &[],
  link_args: &["-Wl,--no-as-needed"],
  link_libs: SIM_LIBS,
};

static TOOLCHAINS: &[((Os, Arch), PlatformFlags)] = &[
  ((Os::MacOs, Arch::X86_64), MACOS_X86_64),
  ((Os::MacOs, Arch::Aarch64), MACOS_AARCH64),
];

/// Look up the toolchain fragment for a platform.
///
/// `None` means the host could not be identified; like any unlisted platform it
/// resolves to [`DEFAULT_TOOLCHAIN`].
pub fn resolve(platform: Option<Platform>) -> &'static PlatformFlags {
  let Some(platform) = platform else {
    return &DEFAULT_TOOLCHAIN;
  };

  TOOLCHAINS
    .iter()
    .find(|((os, arch), _)| *os == platform.os && *arch == platform.arch)
    .map(|(_, flags)| flags)
    .unwrap_or(&DEFAULT_TOOLCHAIN)
}

impl PlatformFlags {
  /// `-I` arguments for the include paths.
  pub fn include_flags(&self) -> impl Iterator<Item = String> + '_ {
    self.include_paths.iter().map(|p| format!("-I{}", p))
  }

  /// Linker arguments: search paths, raw link args, then `-l` libraries.
  pub fn link_flags(&self) -> impl Iterator<Item = String> + '_ {
    self
      .library_paths
      .iter()
      .map(|p| format!("-L{}", p))
      .chain(self.link_args.iter().map(|a| a.to_string()))
      .chain(self.link_libs.iter().map(|l| format!("-l{}", l)))
  }
}
