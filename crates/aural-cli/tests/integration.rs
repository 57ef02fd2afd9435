//! Integration tests for aural-cli.
//!
//! Exercises the CLI binary end to end via `Command`: device listing and
//! offline rendering (the backend-device tests run without a real audio
//! device present).

use std::process::Command;

fn aural_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_aural"))
}

#[test]
fn cli_devices_lists_without_error() {
    let output = aural_bin().arg("devices").output().expect("failed to run aural devices");
    assert!(output.status.success(), "aural devices failed");
}

#[test]
fn cli_devices_info_reports_defaults() {
    let output = aural_bin().args(["devices", "info"]).output().expect("failed to run aural devices info");
    assert!(output.status.success(), "aural devices info failed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Default Input"));
    assert!(stdout.contains("Default Output"));
}

#[test]
fn cli_render_writes_a_nonempty_wav() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("tone.wav");

    let output = aural_bin()
        .args(["render", "--tone-hz", "220", "--duration", "0.2", "--position", "1,0,3"])
        .arg(&out_path)
        .output()
        .expect("failed to run aural render");

    assert!(output.status.success(), "aural render failed: {}", String::from_utf8_lossy(&output.stderr));
    assert!(out_path.metadata().unwrap().len() > 44, "rendered WAV should contain sample data past the header");
}

#[test]
fn cli_render_rejects_malformed_position() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("bad.wav");

    let output = aural_bin()
        .args(["render", "--position", "not-a-position"])
        .arg(&out_path)
        .output()
        .expect("failed to run aural render");

    assert!(!output.status.success());
}
