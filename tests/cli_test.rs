//! End-to-end tests for the kernel-host binary.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Runs the binary against an empty config so the user's own config never
/// leaks into a test.
fn kernel_host(config_dir: &TempDir) -> Command {
    let config = config_dir.path().join("config.json");
    std::fs::write(&config, "{}").expect("Failed to write config");
    let mut cmd = Command::cargo_bin("kernel-host").expect("binary not built");
    cmd.env("KERNEL_HOST_CONFIG", &config).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_markup_argument() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    kernel_host(&temp)
        .args(["markup", "\x1b[32mok\x1b[0m <tag>"])
        .assert()
        .success()
        .stdout("<span style=\"color: #50fa7b\">ok</span> &lt;tag&gt;\n");
}

#[test]
fn test_markup_stdin_json() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    kernel_host(&temp)
        .args(["--format", "json", "markup"])
        .write_stdin("\x1b[Lmlmmail\x1b[Lem")
        .assert()
        .success()
        .stdout(predicate::str::contains("mailto:billiebaskarawibawa101@gmail.com"))
        .stdout(predicate::str::contains("\"plain\":\"mail\""));
}

#[test]
fn test_run_missing_kernel_is_critical() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    kernel_host(&temp)
        .args(["run", "/nonexistent/kernel.wasm"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(
            "CRITICAL ERROR: Could not load kernel.wasm",
        ))
        .stderr(predicate::str::contains("failed to load module"));
}

#[test]
fn test_bad_config_is_reported() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let config = temp.path().join("broken.json");
    std::fs::write(&config, "{ nope").expect("Failed to write config");

    Command::cargo_bin("kernel-host")
        .expect("binary not built")
        .args(["--config"])
        .arg(&config)
        .args(["markup", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration error"));
}
