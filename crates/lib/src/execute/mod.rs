//! Build execution.
//!
//! A build is a [`TaskGraph`] run wave by wave. Tasks inside a wave run in
//! parallel, bounded by the configured parallelism. The first failing task
//! aborts its siblings (their process groups are killed) and no later wave
//! starts, so the translator never sees a partial object set and the native
//! build never runs against a failed translation.
//!
//! # Entry points
//!
//! - [`run`]: build a target to completion
//! - [`run_until`]: same, but stop when a shutdown future resolves
//!
//! Both take any [`ToolRunner`], so the same executor drives real tools,
//! dry runs and test doubles.

pub mod graph;
pub mod process;
pub mod types;

use std::collections::HashMap;
use std::future::{Future, pending};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::config::BuildConfig;
use crate::flags::{AssembledFlags, assemble};
use crate::sources::SourceSet;
use crate::stages;
use crate::util::fs::ensure_dir;

pub use graph::{Task, TaskGraph};
pub use process::{DryRunRunner, Invocation, ProcessRunner, ToolRunner};
pub use types::{BuildError, BuildReport, BuildState, Stage, Target, TaskOutcome};

/// Everything a task needs, shared across the tasks of one build.
struct BuildContext {
  /// Owned copy, so tasks can be spawned onto the runtime.
  config: BuildConfig,
  /// Flags shared by compilation and translation.
  flags: AssembledFlags,
  /// Auxiliary sources; empty when the target has no simulator.
  sources: SourceSet,
  /// Compiler and flags the objects of this build are compiled with.
  stamp: String,
  /// Recompile every object because `stamp` differs from the last build's.
  rebuild_objects: bool,
}

/// Build `target` to completion.
///
/// Equivalent to [`run_until`] with a shutdown that never fires.
pub async fn run<R: ToolRunner>(target: Target, config: &BuildConfig, runner: Arc<R>) -> Result<BuildReport, BuildError> {
  run_until(target, config, runner, pending()).await
}

/// Build `target`, stopping early when `shutdown` resolves.
///
/// The build walks the states of [`BuildState`] in order and records them in
/// the returned [`BuildReport`]. On shutdown every in-flight task is aborted,
/// which kills its tool and everything the tool forked, and
/// [`BuildError::Interrupted`] is returned.
///
/// Objects are recompiled when their source is newer or when the compiler or
/// its flags changed since the last successful compilation.
pub async fn run_until<R, F>(
  target: Target,
  config: &BuildConfig,
  runner: Arc<R>,
  shutdown: F,
) -> Result<BuildReport, BuildError>
where
  R: ToolRunner,
  F: Future<Output = ()>,
{
  tokio::pin!(shutdown);

  let mut report = BuildReport {
    target,
    ..Default::default()
  };
  report.enter(BuildState::Start);

  match &config.platform {
    Some(platform) => info!(platform = %platform, toolchain = config.toolchain.name, "resolved platform"),
    None => info!(toolchain = config.toolchain.name, "unrecognized platform, using default toolchain"),
  }
  report.enter(BuildState::PlatformResolved);

  let flags = assemble(config.toolchain, &config.opt_level, &config.features);
  debug!(cflags = %flags.cflags_string(), ldflags = %flags.ldflags_string(), "assembled flags");
  report.enter(BuildState::FlagsAssembled);

  let sources = if target.includes_sim() {
    SourceSet::discover(&config.src_dirs, &config.build_dir)?
  } else {
    SourceSet::default()
  };

  let stamp = stages::compile::flags_stamp(config, &flags);
  let rebuild_objects = target.includes_sim() && stages::compile::flags_changed(config, &stamp);
  if rebuild_objects && !sources.is_empty() {
    info!("compiler flags changed, recompiling every object");
  }

  let graph = TaskGraph::for_target(target, &sources)?;
  let waves = graph.waves()?;
  info!(target = %target, tasks = graph.task_count(), waves = waves.len(), "starting build");

  let mut remaining: HashMap<Stage, usize> = HashMap::new();
  for task in waves.iter().flatten() {
    *remaining.entry(task.stage()).or_default() += 1;
  }
  if target.includes_sim() && !remaining.contains_key(&Stage::Compile) {
    report.enter(BuildState::ObjectsCompiled);
  }

  let context = Arc::new(BuildContext {
    config: config.clone(),
    flags,
    sources,
    stamp,
    rebuild_objects,
  });
  let semaphore = Arc::new(Semaphore::new(config.parallelism.max(1)));

  for (wave_idx, wave) in waves.into_iter().enumerate() {
    debug!(wave = wave_idx, tasks = wave.len(), "executing wave");

    let mut join_set = JoinSet::new();
    for task in wave {
      let context = context.clone();
      let runner = runner.clone();
      let semaphore = semaphore.clone();

      join_set.spawn(async move {
        let _permit = semaphore
          .acquire_owned()
          .await
          .map_err(|e| BuildError::Join(e.to_string()))?;
        let outcome = run_task(&task, &context, runner.as_ref()).await?;
        Ok::<_, BuildError>((task, outcome))
      });
    }

    loop {
      let next = tokio::select! {
        next = join_set.join_next() => next,
        () = &mut shutdown => {
          info!("interrupted, stopping running tools");
          abort(&mut join_set).await;
          report.enter(BuildState::Failed);
          return Err(BuildError::Interrupted);
        }
      };

      let Some(joined) = next else {
        break;
      };

      let result = match joined.map_err(|e| BuildError::Join(e.to_string())).and_then(|r| r) {
        Ok((task, outcome)) => {
          debug!(task = %task, ?outcome, "task finished");
          record(&mut report, &task, outcome);

          let stage = task.stage();
          match remaining.get_mut(&stage) {
            Some(count) => {
              *count -= 1;
              if *count == 0 {
                report.enter(stage.completed_state());
                stage_finished(stage, &context, runner.as_ref()).await
              } else {
                Ok(())
              }
            }
            None => Ok(()),
          }
        }
        Err(e) => Err(e),
      };

      if let Err(e) = result {
        error!(error = %e, "build failed");
        abort(&mut join_set).await;
        report.enter(BuildState::Failed);
        return Err(e);
      }
    }
  }

  if target.includes_sim() {
    report.executable = Some(config.build_dir.join(config.executable_name()));
  }
  report.enter(BuildState::Done);

  info!(
    compiled = report.compiled.len(),
    up_to_date = report.up_to_date.len(),
    invocations = report.invocations,
    "build complete"
  );
  Ok(report)
}

/// Cancel the remaining tasks and wait for them to be dropped, so their
/// process groups are killed before we return.
async fn abort<T: 'static>(join_set: &mut JoinSet<T>) {
  join_set.abort_all();
  while join_set.join_next().await.is_some() {}
}

/// Bookkeeping after the last task of `stage` succeeded.
///
/// Once all objects exist the flags stamp is updated, unless nothing really ran.
async fn stage_finished<R: ToolRunner>(stage: Stage, context: &BuildContext, runner: &R) -> Result<(), BuildError> {
  if stage == Stage::Compile && runner.executes() {
    stages::compile::write_flags_stamp(&context.config, &context.stamp).await?;
  }
  Ok(())
}

/// Count the task in the report.
fn record(report: &mut BuildReport, task: &Task, outcome: TaskOutcome) {
  if outcome == TaskOutcome::Ran {
    report.invocations += 1;
  }
  if let Task::Compile(unit) = task {
    match outcome {
      TaskOutcome::Ran => report.compiled.push(unit.object.clone()),
      TaskOutcome::UpToDate => report.up_to_date.push(unit.object.clone()),
    }
  }
}

/// Run one task through the stage that owns it.
async fn run_task<R: ToolRunner>(task: &Task, context: &BuildContext, runner: &R) -> Result<TaskOutcome, BuildError> {
  let config = &context.config;

  match task {
    Task::Compile(unit) => {
      stages::compile::compile(config, &context.flags, unit, context.rebuild_objects, runner).await
    }
    Task::Modules => {
      stages::modules::build(config, runner).await?;
      Ok(TaskOutcome::Ran)
    }
    Task::Generate => {
      ensure_dir(&config.build_dir).await?;
      runner
        .run(
          Stage::Generate,
          &stages::generate::invocation(config, &context.flags, &context.sources),
        )
        .await?;
      Ok(TaskOutcome::Ran)
    }
    Task::Link => {
      runner.run(Stage::Link, &stages::link::invocation(config)).await?;
      Ok(TaskOutcome::Ran)
    }
  }
}
