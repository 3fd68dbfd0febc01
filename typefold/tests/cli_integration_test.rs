//! Tests that spawn the real `typefold-bin` binary.
use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn write_duplicate_fixture(temp: &TempDir) -> Result<()> {
    fs::write(
        temp.path().join("alpha.rs"),
        "pub struct Account {\n    pub id: i64,\n}\n",
    )?;
    fs::write(
        temp.path().join("beta.rs"),
        "pub struct Account {\n    pub id: i64,\n}\n\nimpl Account {\n    pub fn id(&self) -> i64 {\n        self.id\n    }\n}\n",
    )?;
    Ok(())
}

#[test]
fn test_cli_help() -> Result<()> {
    let mut cmd = Command::cargo_bin("typefold-bin")?;
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("typefold"))
        .stdout(predicate::str::contains("--dry-run"));
    Ok(())
}

#[test]
fn test_cli_missing_path_fails() -> Result<()> {
    let mut cmd = Command::cargo_bin("typefold-bin")?;
    cmd.arg("/nonexistent/typefold-fixture-path")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
    Ok(())
}

#[test]
fn test_cli_consolidates_directory() -> Result<()> {
    let temp = TempDir::new()?;
    write_duplicate_fixture(&temp)?;

    let mut cmd = Command::cargo_bin("typefold-bin")?;
    cmd.arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[SUMMARY]"));

    let beta = fs::read_to_string(temp.path().join("beta.rs"))?;
    assert!(beta.starts_with("use crate::resources::{Account};\n"));

    let alpha = fs::read_to_string(temp.path().join("alpha.rs"))?;
    assert!(alpha.contains("// consolidated: impl for Account"));
    Ok(())
}

#[test]
fn test_cli_json_output() -> Result<()> {
    let temp = TempDir::new()?;
    write_duplicate_fixture(&temp)?;

    let mut cmd = Command::cargo_bin("typefold-bin")?;
    let assert = cmd.arg("--json").arg(temp.path()).assert().success();

    let value: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(value["duplicate_groups"], 1);
    assert_eq!(value["groups"][0]["name"], "Account");
    Ok(())
}

#[test]
fn test_cli_dry_run_preserves_files() -> Result<()> {
    let temp = TempDir::new()?;
    write_duplicate_fixture(&temp)?;
    let beta_before = fs::read_to_string(temp.path().join("beta.rs"))?;

    let mut cmd = Command::cargo_bin("typefold-bin")?;
    cmd.arg("--dry-run")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY-RUN] No files were written"));

    assert_eq!(fs::read_to_string(temp.path().join("beta.rs"))?, beta_before);
    Ok(())
}

#[test]
fn test_cli_quiet_mode() -> Result<()> {
    let temp = TempDir::new()?;
    write_duplicate_fixture(&temp)?;

    let mut cmd = Command::cargo_bin("typefold-bin")?;
    cmd.arg("-q")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    Ok(())
}
