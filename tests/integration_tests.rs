mod common;

use common::{CommandOutput, TestContext};
use std::fs;

#[test]
fn test_help_and_version() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .cmd()
        .arg("--help")
        .output()
        .expect("Failed to run ci-provision")
        .into();

    output
        .assert_success()
        .assert_stdout_contains("Install or reuse cached CI build tools")
        .assert_stdout_contains("Usage: ci-provision")
        .assert_stdout_contains("SCCACHE_DIR");

    let output: CommandOutput = ctx
        .cmd()
        .arg("--version")
        .output()
        .expect("Failed to run ci-provision")
        .into();

    output.assert_success().assert_stdout_contains("ci-provision");
}

#[test]
fn test_cache_dir_created_then_reused() {
    let ctx = TestContext::new();
    let cache_dir = ctx.path("sccache");

    let output: CommandOutput = ctx
        .cmd()
        .env("SCCACHE_DIR", &cache_dir)
        .args(["--step", "cache-dir"])
        .output()
        .expect("Failed to run ci-provision")
        .into();

    output
        .assert_success()
        .assert_stdout_contains("Provisioning Summary")
        .assert_stdout_contains("created");
    assert!(cache_dir.is_dir());

    let output: CommandOutput = ctx
        .cmd()
        .env("SCCACHE_DIR", &cache_dir)
        .args(["--step", "cache-dir"])
        .output()
        .expect("Failed to run ci-provision")
        .into();

    output
        .assert_success()
        .assert_stdout_contains("Reusing directory");
}

#[test]
fn test_missing_cache_dir_setting_fails() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .cmd()
        .args(["--step", "cache-dir"])
        .output()
        .expect("Failed to run ci-provision")
        .into();

    output
        .assert_failure()
        .assert_stderr_contains("step 'cache-dir' failed")
        .assert_stderr_contains("SCCACHE_DIR");
}

#[test]
fn test_sdk_step_requires_sdk_dir() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .cmd()
        .args(["--step", "sdk"])
        .output()
        .expect("Failed to run ci-provision")
        .into();

    output
        .assert_failure()
        .assert_stderr_contains("step 'sdk' failed")
        .assert_stderr_contains("VITASDK");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_check_mode_creates_nothing() {
    let ctx = TestContext::new();
    let cache_dir = ctx.path("sccache");

    let output: CommandOutput = ctx
        .cmd()
        .env("SCCACHE_DIR", &cache_dir)
        .args(["--check", "--step", "cache-dir"])
        .output()
        .expect("Failed to run ci-provision")
        .into();

    output.assert_success().assert_stdout_contains("missing");
    assert!(!cache_dir.exists());
}

#[test]
fn test_config_file_formats() {
    let ctx = TestContext::new();

    let yaml_dir = ctx.path("from-yaml");
    let yaml_path = ctx.path("provision.yaml");
    fs::write(
        &yaml_path,
        format!("cache_dir: \"{}\"\n", yaml_dir.display()),
    )
    .expect("Failed to write config");

    let output: CommandOutput = ctx
        .cmd()
        .arg("--config")
        .arg(&yaml_path)
        .args(["--step", "cache-dir"])
        .output()
        .expect("Failed to run ci-provision")
        .into();

    output.assert_success();
    assert!(yaml_dir.is_dir());

    let json_dir = ctx.path("from-json");
    let json_path = ctx.path("provision.json");
    fs::write(
        &json_path,
        serde_json::json!({ "cache_dir": json_dir }).to_string(),
    )
    .expect("Failed to write config");

    // Picked up through the environment this time
    let output: CommandOutput = ctx
        .cmd()
        .env("CI_PROVISION_CONFIG", &json_path)
        .args(["--step", "cache-dir"])
        .output()
        .expect("Failed to run ci-provision")
        .into();

    output.assert_success();
    assert!(json_dir.is_dir());
}

#[test]
fn test_env_overrides_config_file() {
    let ctx = TestContext::new();
    let file_dir = ctx.path("from-file");
    let env_dir = ctx.path("from-env");
    let config_path = ctx.path("provision.json");
    fs::write(
        &config_path,
        serde_json::json!({ "cache_dir": file_dir }).to_string(),
    )
    .expect("Failed to write config");

    let output: CommandOutput = ctx
        .cmd()
        .env("SCCACHE_DIR", &env_dir)
        .arg("--config")
        .arg(&config_path)
        .args(["--step", "cache-dir"])
        .output()
        .expect("Failed to run ci-provision")
        .into();

    output.assert_success();
    assert!(env_dir.is_dir());
    assert!(!file_dir.exists());
}

#[test]
fn test_unreadable_config_fails() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .cmd()
        .arg("--config")
        .arg(ctx.path("does-not-exist.json"))
        .args(["--step", "cache-dir"])
        .output()
        .expect("Failed to run ci-provision")
        .into();

    output
        .assert_failure()
        .assert_stderr_contains("Could not read config file");
}

#[test]
fn test_unknown_step_rejected() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .cmd()
        .args(["--step", "docker"])
        .output()
        .expect("Failed to run ci-provision")
        .into();

    output.assert_failure().assert_stderr_contains("invalid value");
}
