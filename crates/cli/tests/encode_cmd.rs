//! CLI tests for the `labelterm encode` subcommand.

use std::process::Command;

use assert_cmd::cargo;

fn labelterm_cmd() -> Command {
    Command::new(cargo::cargo_bin!("labelterm"))
}

#[test]
fn encode_pretty_writes_raw_stream() {
    let output = labelterm_cmd()
        .args([
            "encode", "--id", "PN123", "--qty", "5", "--date", "2026-10-16", "--output", "pretty",
        ])
        .output()
        .expect("run encode command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("JOB\nDEF "));
    assert!(stdout.contains("BCD TP=7,X=0,Y=0,NW=1,RA=2,MG=1,HT=80\nPN123\n"));
    assert!(stdout.contains("TEXT X=0,Y=260,L=1\n2026.10.16\n"));
    assert!(stdout.contains("\n001/5\n"));
    assert!(stdout.ends_with("QTY P=5\nEND\nJOBE\n"));
}

#[test]
fn encode_json_lists_twelve_commands() {
    let output = labelterm_cmd()
        .args([
            "encode", "--id", "PN123", "--qty", "5", "--date", "2026-01-05", "--output", "json",
        ])
        .output()
        .expect("run encode command");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let commands = json["commands"].as_array().expect("commands array");
    assert_eq!(commands.len(), 12);
    assert_eq!(commands[0], "JOB\n");
    assert_eq!(commands[9], "QTY P=5\n");
    assert_eq!(json["job"]["date"], "2026.1.5");
    assert_eq!(json["job"]["identifier"], "PN123");
}

#[test]
fn encode_is_deterministic() {
    let run = || {
        labelterm_cmd()
            .args(["encode", "--id", "A", "--qty", "2", "--date", "2026-10-16"])
            .output()
            .expect("run encode command")
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn encode_rejects_bad_date() {
    let output = labelterm_cmd()
        .args(["encode", "--id", "A", "--date", "16/10/2026"])
        .output()
        .expect("run encode command");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--date"));
}
