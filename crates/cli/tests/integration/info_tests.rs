use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn info_shows_resolved_flags() {
  let env = TestEnv::new();

  env
    .cmd()
    .args(["info", "--savable"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Platform"))
    .stdout(predicate::str::contains("-DSAVABLE"))
    .stdout(predicate::str::contains("--savable"));
}

#[test]
fn info_json_is_valid() {
  let env = TestEnv::new();

  let output = env.cmd().args(["info", "-o", "json"]).env("VIDEO", "1").output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["config"]["top_module"], "sim");
  assert_eq!(json["config"]["features"]["video"], true);
  let ldflags = json["flags"]["ldflags"].as_array().unwrap();
  assert_eq!(ldflags.last().unwrap(), "-lSDL2");
  assert!(json["translator"].as_str().unwrap().contains("--top-module sim"));
}
