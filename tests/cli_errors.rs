use predicates::str::contains;
use std::fs;

#[test]
fn empty_targets_fail() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("deploy-verify");
    cmd.args(["check", "--targets", ""]);
    cmd.assert()
        .code(2)
        .stderr(contains("Error: targets must not be empty"));
}

#[test]
fn duplicate_target_names_fail() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("deploy-verify");
    cmd.args([
        "check",
        "--target",
        "api=http://localhost:8000/health",
        "--target",
        "api=http://localhost:8001/health",
    ]);
    cmd.assert()
        .code(2)
        .stderr(contains("Error: duplicate target name 'api'"));
}

#[test]
fn url_without_scheme_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("deploy-verify");
    cmd.args(["check", "--target", "api=api:8000/health"]);
    cmd.assert().code(2).stderr(contains(
        "Error: invalid url 'api:8000/health': expected http:// or https://",
    ));
}

#[test]
fn zero_trials_fail() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("deploy-verify");
    cmd.args(["probe", "--trials", "0"]);
    cmd.assert()
        .code(2)
        .stderr(contains("Error: trials must be greater than 0"));
}

#[test]
fn fleet_without_critical_targets_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("deploy-verify");
    cmd.args(["check", "--target", "docs=http://localhost:9000/health:optional"]);
    cmd.assert()
        .code(2)
        .stderr(contains("Error: at least one target must be critical"));
}

#[test]
fn missing_compose_file_stops_before_any_check() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("verify.toml");
    fs::write(
        &config,
        "[deploy]\ncompose_file = \"/nonexistent/docker-compose.yml\"\n",
    )
    .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("deploy-verify");
    cmd.args(["run", "--deploy", "--config", config.to_str().unwrap()]);
    cmd.assert()
        .code(2)
        .stdout("")
        .stderr(contains(
            "Error: required deployment artifact '/nonexistent/docker-compose.yml' not found",
        ));
}

#[test]
fn unsupported_config_format_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("verify.yaml");
    fs::write(&config, "targets: []\n").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("deploy-verify");
    cmd.args(["check", "--config", config.to_str().unwrap()]);
    cmd.assert()
        .code(2)
        .stderr(contains("Error: unsupported config format 'yaml'"));
}

#[test]
fn unknown_flag_is_reported() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("deploy-verify");
    cmd.args(["check", "--bogus"]);
    cmd.assert().code(2).stderr(contains("Error:"));
}
