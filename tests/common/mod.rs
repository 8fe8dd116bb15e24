//! Shared test helpers for integration tests
//!
//! This module provides common utilities used across all test files.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use tempfile::TempDir;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "secret1";

/// Helper to get a sawtrack command isolated from the user's config and env
pub fn sawtrack() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("sawtrack"));
    cmd.env("XDG_CONFIG_HOME", std::env::temp_dir().join("sawtrack-tests-no-config"))
        .env_remove("SAWTRACK_PASSWORD")
        .env_remove("SAWTRACK_NEW_PASSWORD")
        .env_remove("SAWTRACK_DEFAULT_BRANCH")
        .env_remove("SAWTRACK_REPORT_DIR")
        .env_remove("SAWTRACK_LOG");
    cmd
}

/// Helper to run a command inside the project
pub fn run_in(tmp: &TempDir, args: &[&str]) -> assert_cmd::assert::Assert {
    sawtrack().current_dir(tmp.path()).args(args).assert()
}

/// Helper to create a project with the "Main" branch and an administrator
pub fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    run_in(
        &tmp,
        &["init", "--admin-email", ADMIN_EMAIL, "--password", ADMIN_PASSWORD],
    )
    .success();
    tmp
}

/// Helper to sign in
pub fn login(tmp: &TempDir, email: &str, password: &str) {
    run_in(tmp, &["login", "--email", email, "--password", password]).success();
}

/// Helper to create a project and sign in as its administrator
pub fn setup_signed_in_project() -> TempDir {
    let tmp = setup_test_project();
    login(&tmp, ADMIN_EMAIL, ADMIN_PASSWORD);
    tmp
}

/// Helper to create a blade type and return its ID
pub fn create_blade_type(tmp: &TempDir, code: &str, name: &str) -> String {
    let output = sawtrack()
        .current_dir(tmp.path())
        .args(["type", "new", "--code", code, "--name", name, "--format", "id"])
        .output()
        .unwrap();
    assert!(output.status.success(), "type new failed: {:?}", output);
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Helper to create a branch and return its ID
pub fn create_branch(tmp: &TempDir, name: &str) -> String {
    let output = sawtrack()
        .current_dir(tmp.path())
        .args([
            "branch", "new", "--name", name, "--address", "Av. Central 12", "--phone", "555-0100",
            "--format", "id",
        ])
        .output()
        .unwrap();
    assert!(output.status.success(), "branch new failed: {:?}", output);
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Helper to register a blade at the "Main" branch
pub fn register_blade(tmp: &TempDir, code: &str, blade_type: &str) {
    run_in(
        tmp,
        &["blade", "register", code, "--branch", "Main", "--type", blade_type],
    )
    .success();
}
