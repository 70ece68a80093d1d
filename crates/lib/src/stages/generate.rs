//! Translator invocation.
//!
//! Assembles the Verilator command line from the configuration, the assembled
//! flags and the object list. Disabled features contribute nothing: no
//! "off" switches and no empty arguments.

use crate::config::{BuildConfig, TraceMode};
use crate::execute::process::Invocation;
use crate::flags::AssembledFlags;
use crate::sources::SourceSet;

/// Arguments every translator run starts with.
const BASE_ARGS: &[&str] = &["-Wno-fatal", "-O3"];

/// Build the translator invocation. Output lands in `config.build_dir`.
pub fn invocation(config: &BuildConfig, flags: &AssembledFlags, sources: &SourceSet) -> Invocation {
  let features = &config.features;
  let mut invocation = Invocation::from_command(&config.verilator);

  invocation
    .args(BASE_ARGS.iter().copied())
    .args(config.cc_srcs.split_whitespace())
    .arg("--top-module")
    .arg(&config.top_module)
    .arg("--exe")
    .args(&config.wrapper_sources)
    .args(sources.objects());

  if let Some(threads) = features.thread_count() {
    invocation.arg("--threads").arg(threads);
  }

  let cflags: Vec<String> = flags
    .cflags
    .iter()
    .cloned()
    .chain(config.src_dirs.iter().map(|d| format!("-I{}", d.display())))
    .collect();
  invocation.arg("-CFLAGS").arg(cflags.join(" "));

  if !flags.ldflags.is_empty() {
    invocation.arg("-LDFLAGS").arg(flags.ldflags_string());
  }

  match features.trace {
    TraceMode::None => {}
    TraceMode::Vcd => {
      invocation.arg("--trace");
    }
    TraceMode::Fst => {
      invocation.arg("--trace-fst").arg("--trace-structs");
    }
  }

  if features.coverage {
    invocation.arg("--coverage");
  }
  if features.savable {
    invocation.arg("--savable");
  }

  invocation
    .args(config.verilator_args.iter().filter(|a| !a.is_empty()))
    .arg("--Mdir")
    .arg(&config.build_dir);
  invocation
}
