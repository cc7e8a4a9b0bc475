//! CLI integration tests

use std::process::Command;

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = Command::new("cargo")
        .args(["run", "-p", "snapshot-cli", "--", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Snapshot cluster resource usage"),
        "Should show app description"
    );
    assert!(stdout.contains("--pod"), "Should show pod filter");
    assert!(
        stdout.contains("--deployment"),
        "Should show deployment filter"
    );
    assert!(
        stdout.contains("--namespace"),
        "Should show namespace filter"
    );
    assert!(stdout.contains("--print"), "Should show print selector");
    assert!(
        stdout.contains("--csv-output"),
        "Should show csv-output option"
    );
    assert!(stdout.contains("--debug"), "Should show debug flag");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = Command::new("cargo")
        .args(["run", "-p", "snapshot-cli", "--", "--version"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("kube-snapshot"), "Should show binary name");
}

/// Test that the print selector rejects unknown sections
#[test]
fn test_print_rejects_unknown_section() {
    let output = Command::new("cargo")
        .args(["run", "-p", "snapshot-cli", "--", "--print", "everything"])
        .output()
        .expect("Failed to execute command");

    assert!(
        !output.status.success(),
        "Unknown print section should be rejected"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("invalid value"),
        "Should explain the invalid value"
    );
}
