//! Integration tests for the proof-login CLI
//!
//! Each test runs against an isolated config pointing the storage adapter at
//! a file backend inside a temp directory, so nothing touches the real
//! keychain or talks to a network.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct TestEnv {
    _temp_dir: TempDir,
    config_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let secrets_path = temp_dir
            .path()
            .join("secrets.json")
            .to_string_lossy()
            .replace('\\', "\\\\");

        let config_content = format!(
            r#"
[storage]
backend = "file"
file_path = "{}"
"#,
            secrets_path
        );

        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, config_content).unwrap();

        Self {
            _temp_dir: temp_dir,
            config_path,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("proof-login").unwrap();
        cmd.env("PROOFROOM_CONFIG", &self.config_path);
        cmd
    }
}

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("proof-login")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("store"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("clear"));
}

#[test]
fn test_show_without_token() {
    let env = TestEnv::new();
    env.cmd()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("No token stored"));
}

#[test]
fn test_store_from_stdin_and_show_redacted() {
    let env = TestEnv::new();

    env.cmd()
        .args(["store", "--stdin", "--no-verify"])
        .write_stdin("tok-abcdefghijklmnop\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Token stored"));

    env.cmd()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("Token stored"))
        // The redacted form never echoes the token's middle.
        .stdout(predicate::str::contains("abcdefghijkl").not());
}

#[test]
fn test_store_empty_token_fails() {
    let env = TestEnv::new();
    env.cmd()
        .args(["store", "--stdin", "--no-verify"])
        .write_stdin("\n")
        .assert()
        .failure();
}

#[test]
fn test_clear_removes_the_token() {
    let env = TestEnv::new();

    env.cmd()
        .args(["store", "--token", "tok-123456789", "--no-verify"])
        .assert()
        .success();

    env.cmd()
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Token cleared"));

    env.cmd()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("No token stored"));
}
