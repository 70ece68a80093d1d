use std::process::Stdio;
use std::thread::sleep;
use std::time::Duration;

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn default_target_runs_every_tool() {
  let env = TestEnv::new();

  env
    .cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("Built all"));

  assert_eq!(env.calls("cc").len(), 2);
  assert_eq!(env.calls("verilator").len(), 1);

  let make = env.calls("make");
  assert_eq!(make.len(), 2);
  assert!(make.iter().any(|l| l.contains("modules/Makefile")));
  assert!(make.iter().any(|l| l.contains("-f Vsim.mk Vsim")));

  assert!(env.path("obj_dir/uart.o").exists());
  assert!(env.path("obj_dir/eth.o").exists());
  assert!(env.path("modules").is_dir());

  // Linking comes last
  let last = env.log_lines().pop().unwrap();
  assert!(last.contains("Vsim.mk"));
}

#[test]
fn translator_receives_every_object_once() {
  let env = TestEnv::new();
  env.cmd().arg("sim").assert().success();

  let verilator = &env.calls("verilator")[0];
  let uart = env.path("obj_dir/uart.o").display().to_string();
  let eth = env.path("obj_dir/eth.o").display().to_string();
  assert_eq!(verilator.matches(&uart).count(), 1);
  assert_eq!(verilator.matches(&eth).count(), 1);
  assert!(verilator.starts_with("verilator -Wno-fatal -O3 --cc sim.v --top-module sim --exe"));
  assert!(!verilator.contains("--trace"));
  assert!(!verilator.contains("--threads"));
}

#[test]
fn rebuild_skips_fresh_objects() {
  let env = TestEnv::new();
  env.cmd().arg("sim").assert().success();
  env.clear_log();

  env
    .cmd()
    .arg("sim")
    .assert()
    .success()
    .stdout(predicate::str::contains("0 compiled, 2 up to date"));

  assert!(env.calls("cc").is_empty());
  assert_eq!(env.calls("verilator").len(), 1);
}

#[test]
fn toggling_a_feature_recompiles_objects() {
  let env = TestEnv::new();
  env.cmd().arg("sim").assert().success();
  env.clear_log();

  env
    .cmd()
    .arg("sim")
    .env("COVERAGE", "1")
    .assert()
    .success()
    .stdout(predicate::str::contains("2 compiled, 0 up to date"));
  assert_eq!(env.calls("cc").len(), 2);
  env.clear_log();

  env.cmd().arg("sim").env("COVERAGE", "1").assert().success();
  assert!(env.calls("cc").is_empty());
}

#[test]
fn sim_target_leaves_modules_alone() {
  let env = TestEnv::new();
  env.cmd().arg("sim").assert().success();

  assert!(env.calls("make").iter().all(|l| !l.contains("modules/Makefile")));
  assert!(!env.path("modules").exists());
}

#[test]
fn modules_target_only_runs_nested_build() {
  let env = TestEnv::new();
  env.cmd().arg("modules").assert().success();

  assert!(env.calls("cc").is_empty());
  assert!(env.calls("verilator").is_empty());
  let make = env.calls("make");
  assert_eq!(make.len(), 1);
  assert!(make[0].contains(&format!("-C {}", env.path("modules").display())));
}

#[test]
fn environment_toggles_are_forwarded() {
  let env = TestEnv::new();
  env
    .cmd()
    .arg("sim")
    .env("THREADS", "4")
    .env("TRACE_FST", "1")
    .env("COVERAGE", "yes")
    .env("JOBS", "8")
    .assert()
    .success();

  let verilator = &env.calls("verilator")[0];
  assert!(verilator.contains("--threads 4"));
  assert!(verilator.contains("--trace-fst --trace-structs"));
  assert!(verilator.contains("--coverage"));
  assert!(verilator.contains("-DTRACE_FST"));
  assert!(verilator.contains("-DVM_COVERAGE"));
  assert!(env.calls("cc").iter().all(|l| l.contains("-DVM_COVERAGE")));

  let link = env.calls("make").pop().unwrap();
  assert!(link.contains("-j8 -C"));
}

#[test]
fn zero_threads_is_single_threaded() {
  let env = TestEnv::new();
  env.cmd().arg("sim").env("THREADS", "0").assert().success();
  assert!(!env.calls("verilator")[0].contains("--threads"));
}

#[test]
fn command_line_beats_environment() {
  let env = TestEnv::new();
  env
    .cmd()
    .args(["sim", "--opt-level", "-O1"])
    .env("OPT_LEVEL", "-O2")
    .assert()
    .success();

  for line in env.calls("cc") {
    assert!(line.contains("-O1"));
    assert!(!line.contains("-O2"));
  }
}

#[test]
fn failing_translator_exit_code_propagates() {
  let env = TestEnv::new();

  env
    .cmd()
    .arg("sim")
    .env("FAKE_VERILATOR_EXIT", "3")
    .assert()
    .code(3)
    .stderr(predicate::str::contains("generate failed"));

  assert!(env.calls("make").is_empty());
}

#[test]
fn sigterm_stops_the_build_and_what_tools_forked() {
  let env = TestEnv::new();
  let marker = env.path("marker");
  env.write_tool("make", &format!("(sleep 3; touch '{}') &\nwait", marker.display()));

  let mut child = env
    .std_cmd()
    .arg("modules")
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()
    .unwrap();
  sleep(Duration::from_millis(800));

  let kill = std::process::Command::new("kill")
    .args(["-TERM", &child.id().to_string()])
    .status()
    .unwrap();
  assert!(kill.success());
  assert_eq!(child.wait().unwrap().code(), Some(130));

  sleep(Duration::from_millis(3000));
  assert!(!marker.exists(), "the nested build survived the orchestrator");
}

#[test]
fn missing_tool_fails_with_code_one() {
  let env = TestEnv::new();

  env
    .cmd()
    .arg("sim")
    .env("VERILATOR", env.path("bin/no-such-verilator"))
    .assert()
    .code(1)
    .stderr(predicate::str::contains("failed to run"));
}

#[test]
fn dry_run_prints_without_running() {
  let env = TestEnv::new();

  env
    .cmd()
    .arg("--dry-run")
    .assert()
    .success()
    .stdout(predicate::str::contains("--top-module sim"))
    .stdout(predicate::str::contains("Vsim.mk"))
    .stdout(predicate::str::contains("Dry run"));

  assert!(env.log_lines().is_empty());
}

#[test]
fn project_file_changes_the_top_module() {
  let env = TestEnv::new();
  env.write_file(
    "vsimbuild.toml",
    r#"
top_module = "dut"
verilator_args = ["--x-assign", "fast"]
"#,
  );

  env.cmd().arg("sim").assert().success();

  let verilator = &env.calls("verilator")[0];
  assert!(verilator.contains("--cc dut.v --top-module dut"));
  assert!(verilator.contains("--x-assign fast --Mdir"));
  assert!(env.calls("make")[0].contains("-f Vdut.mk Vdut"));
}

#[test]
fn invalid_project_file_is_reported() {
  let env = TestEnv::new();
  env.write_file("vsimbuild.toml", "no_such_key = 1\n");

  env
    .cmd()
    .assert()
    .code(1)
    .stderr(predicate::str::contains("vsimbuild.toml"));
  assert!(env.log_lines().is_empty());
}
