//! End-to-end runs of the `line-processor` binary against files.

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::tempdir;

const BIN: &str = env!("CARGO_BIN_EXE_line-processor");

/// Two lines whose transformed content is exactly 160 bytes.
fn two_record_input() -> String {
    let first = format!("{}++\n", "A".repeat(78));
    let second = format!("{}\n", "B".repeat(79));
    format!("{first}{second}STOP\nignored after stop\n")
}

#[test]
fn test_file_to_file() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("input.txt");
    let output_path = dir.path().join("out/output.txt");
    fs::write(&input_path, two_record_input()).unwrap();

    let status = Command::new(BIN)
        .arg(&input_path)
        .arg("-o")
        .arg(&output_path)
        .status()
        .unwrap();
    assert!(status.success());

    let output = fs::read_to_string(&output_path).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], format!("{}^ ", "A".repeat(78)));
    assert_eq!(lines[1], format!("{} ", "B".repeat(79)));
}

#[test]
fn test_stdin_to_stdout() {
    let mut child = Command::new(BIN)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(two_record_input().as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 2);
    assert!(stdout.lines().all(|l| l.len() == 80));
}

#[test]
fn test_short_input_writes_nothing() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("short.txt");
    fs::write(&input_path, "hello++world\nSTOP\n").unwrap();

    let output = Command::new(BIN).arg(&input_path).output().unwrap();
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_serial_flag_matches_threaded() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("input.txt");
    let text: String = (0..500)
        .map(|i| format!("{i}: some+++text++here\n"))
        .collect();
    fs::write(&input_path, text).unwrap();

    let threaded = Command::new(BIN).arg(&input_path).output().unwrap();
    let serial = Command::new(BIN)
        .arg(&input_path)
        .arg("--serial")
        .output()
        .unwrap();
    assert!(threaded.status.success());
    assert!(serial.status.success());
    assert!(!threaded.stdout.is_empty());
    assert_eq!(threaded.stdout, serial.stdout);
}

#[test]
fn test_verbose_reports_on_stderr_only() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("input.txt");
    fs::write(&input_path, two_record_input()).unwrap();

    let output = Command::new(BIN)
        .arg(&input_path)
        .arg("--verbose")
        .env_remove("RUST_LOG")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stdout.lines().count(), 2);
    assert!(stderr.contains("Executor: threaded"));
    assert!(stderr.contains("2 records out"));
}

#[test]
fn test_missing_input_file_fails() {
    let dir = tempdir().unwrap();
    let output = Command::new(BIN)
        .arg(dir.path().join("does-not-exist.txt"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error reading input file"));
}
