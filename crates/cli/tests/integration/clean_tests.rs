use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn clean_removes_build_output_but_not_modules() {
  let env = TestEnv::new();
  env.cmd().assert().success();
  env.write_file("modules/clocker.so", "");

  env
    .cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed"));

  assert!(!env.path("obj_dir").exists());
  assert!(env.path("modules/clocker.so").exists());
  assert!(env.path("src/uart.c").exists());
}

#[test]
fn clean_twice_succeeds() {
  let env = TestEnv::new();
  env.cmd().arg("clean").assert().success();
  env
    .cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing to clean"));
}

#[test]
fn clean_honors_build_dir_override() {
  let env = TestEnv::new();
  env.write_file("out/sim/uart.o", "");
  env.write_file("obj_dir/eth.o", "");

  env.cmd().args(["clean", "--build-dir", "out/sim"]).assert().success();

  assert!(!env.path("out/sim").exists());
  assert!(env.path("obj_dir/eth.o").exists());
}

#[test]
fn clean_dry_run_keeps_files() {
  let env = TestEnv::new();
  env.write_file("obj_dir/uart.o", "");

  env
    .cmd()
    .args(["clean", "-n"])
    .assert()
    .success()
    .stdout(predicate::str::contains("rm -rf"));
  assert!(env.path("obj_dir/uart.o").exists());
}
