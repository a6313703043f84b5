use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn bin() -> Command {
    Command::cargo_bin("voice-dialer").expect("binary")
}

#[test]
fn no_arguments_prints_help_and_exits_zero() {
    bin()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("register"));
}

#[test]
fn dialing_a_non_dial_scheme_is_a_silent_no_op() {
    bin()
        .arg("http://example.com/page")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn status_json_reports_the_probe_fields() {
    let output = bin().arg("status").arg("--json").output().expect("status run");
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert!(report["version"].is_string());
    let object = report.as_object().expect("object");
    for field in ["registered", "shortcut", "app_id", "launcher", "browser", "icon_location"] {
        assert!(object.contains_key(field), "missing field {field}");
    }
}

#[test]
fn version_flag_reports_the_package_version() {
    bin()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
