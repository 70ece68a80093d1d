//! Native build of the generated simulator.

use crate::config::BuildConfig;
use crate::execute::process::Invocation;

/// `<make> -j[JOBS] -C <build dir> -f V<top>.mk V<top>`
///
/// Without `JOBS` make gets a bare `-j`. The value is not validated; make
/// rejects anything it does not understand.
pub fn invocation(config: &BuildConfig) -> Invocation {
  let jobs = match config.jobs.as_deref().map(str::trim) {
    Some(jobs) if !jobs.is_empty() => format!("-j{}", jobs),
    _ => "-j".to_string(),
  };

  let mut invocation = Invocation::from_command(&config.make);
  invocation
    .arg(jobs)
    .arg("-C")
    .arg(&config.build_dir)
    .arg("-f")
    .arg(config.generated_makefile())
    .arg(config.executable_name());
  invocation
}
