//! CLI 端到端测试

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_joints_lists_all_names() {
    Command::cargo_bin("wbc-cli")
        .unwrap()
        .arg("joints")
        .assert()
        .success()
        .stdout(predicate::str::contains("r_hip_yaw"))
        .stdout(predicate::str::contains("l_ank_roll"));
}

#[test]
fn test_gains_init_then_check() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("wbc-cli")
        .unwrap()
        .args(["gains", "init"])
        .arg(dir.path())
        .assert()
        .success();

    Command::cargo_bin("wbc-cli")
        .unwrap()
        .args(["gains", "check"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("r_knee"));
}

#[test]
fn test_gains_check_missing_directory() {
    let dir = tempfile::tempdir().unwrap();

    Command::cargo_bin("wbc-cli")
        .unwrap()
        .args(["gains", "check"])
        .arg(dir.path().join("missing"))
        .assert()
        .failure();
}

#[test]
fn test_simulate_joint_pose() {
    Command::cargo_bin("wbc-cli")
        .unwrap()
        .args(["simulate", "--joint", "r_knee=0.5", "--mov-time", "0.5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("r_knee"))
        .stdout(predicate::str::contains("0.5000"));
}

#[test]
fn test_simulate_rejects_unknown_joint() {
    Command::cargo_bin("wbc-cli")
        .unwrap()
        .args(["simulate", "--joint", "tail=0.5"])
        .assert()
        .failure();
}
