//! Implementation of the `all`, `sim` and `modules` commands.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::debug;

use vsimbuild_lib::execute::{self, BuildReport, DryRunRunner, ProcessRunner, Target};

use crate::GlobalOpts;
use crate::output::{format_elapsed, print_info, print_stat, print_success};

/// Build `target`. Ctrl-C or SIGTERM stops the build and kills the running tools.
pub fn cmd_build(target: Target, opts: &GlobalOpts) -> Result<()> {
  let config = super::resolve_config(opts)?;
  debug!(?config, "resolved configuration");

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let started = Instant::now();

  if opts.dry_run {
    let runner = Arc::new(DryRunRunner::new());
    rt.block_on(execute::run_until(target, &config, runner.clone(), interrupted()))?;
    print_info(&format!("Dry run, {} commands not executed", runner.recorded().len()));
    return Ok(());
  }

  let report = rt.block_on(execute::run_until(target, &config, Arc::new(ProcessRunner), interrupted()))?;
  print_summary(&report, started);
  Ok(())
}

/// Resolves on Ctrl-C or SIGTERM.
///
/// A signal whose handler cannot be installed never fires.
async fn interrupted() {
  let ctrl_c = async {
    if tokio::signal::ctrl_c().await.is_err() {
      std::future::pending::<()>().await;
    }
  };
  tokio::select! {
    () = ctrl_c => debug!("received Ctrl-C"),
    () = terminated() => debug!("received SIGTERM"),
  }
}

#[cfg(unix)]
async fn terminated() {
  use tokio::signal::unix::{SignalKind, signal};

  match signal(SignalKind::terminate()) {
    Ok(mut term) => {
      term.recv().await;
    }
    Err(_) => std::future::pending::<()>().await,
  }
}

#[cfg(not(unix))]
async fn terminated() {
  std::future::pending::<()>().await
}

fn print_summary(report: &BuildReport, started: Instant) {
  print_success(&format!("Built {} in {}", report.target, format_elapsed(started.elapsed())));
  if !report.compiled.is_empty() || !report.up_to_date.is_empty() {
    print_stat(
      "Objects",
      &format!("{} compiled, {} up to date", report.compiled.len(), report.up_to_date.len()),
    );
  }
  if let Some(executable) = &report.executable {
    print_stat("Simulator", &executable.display().to_string());
  }
}
