// crates/fitslim-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests that run the `fitslim` binary.
// Purpose: Ensure config, exclusions and stdio serving behave end to end.
// Dependencies: fitslim-cli binary, fitslim-wire
// ============================================================================

//! ## Overview
//! Runs the CLI binary against temporary config files. Invalid configuration
//! must fail closed with a non-zero exit code and a message on stderr.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Cursor;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;
use std::process::Stdio;

use fitslim_core::Tree;
use fitslim_wire::decode;
use fitslim_wire::encode;
use fitslim_wire::framing::frame;
use fitslim_wire::read_frame;
use tempfile::NamedTempFile;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn fitslim_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_fitslim"))
}

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn run(args: &[&str], config: &Path) -> Output {
    Command::new(fitslim_bin())
        .args(args)
        .arg("--config")
        .arg(config)
        .output()
        .expect("run fitslim")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8(output.stderr.clone()).unwrap()
}

const STDIO_CONFIG: &str = r#"
[server]
transport = "stdio"

[audit]
sink = "none"
"#;

// ============================================================================
// SECTION: Config Validate
// ============================================================================

#[test]
fn config_validate_accepts_valid_file() {
    let file = config_file(STDIO_CONFIG);
    let output = run(&["config", "validate"], file.path());
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "config ok\n");
}

#[test]
fn config_validate_rejects_invalid_file() {
    let file = config_file("[server]\nmax_message_bytes = 0\n");
    let output = run(&["config", "validate"], file.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to load config"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn config_validate_reads_env_override() {
    let file = config_file("[server]\nbind = \"not an address\"\n");
    let output = Command::new(fitslim_bin())
        .args(["config", "validate"])
        .env("FITSLIM_CONFIG", file.path())
        .output()
        .expect("run fitslim");
    assert!(!output.status.success());
    assert!(stderr(&output).contains("bind"));
}

#[test]
fn blank_env_override_falls_back_to_default_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fitslim.toml"), STDIO_CONFIG).unwrap();
    let output = Command::new(fitslim_bin())
        .args(["config", "validate"])
        .env("FITSLIM_CONFIG", "  ")
        .current_dir(dir.path())
        .output()
        .expect("run fitslim");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "config ok\n");
}

// ============================================================================
// SECTION: Exclusions Check
// ============================================================================

#[test]
fn exclusions_check_reports_each_name() {
    let file = config_file("[exclusions]\npatterns = [\"^draft\", \"\\\\.bak$\"]\n");
    let output = run(&["exclusions", "check", "draftSuite", "Main.html", "old.bak"], file.path());
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "excluded draftSuite (^draft)\nincluded Main.html\nexcluded old.bak (\\.bak$)\n"
    );
}

#[test]
fn exclusions_check_fails_on_bad_pattern() {
    let file = config_file("[exclusions]\npatterns = [\"(unclosed\"]\n");
    let output = run(&["exclusions", "check", "Main.html"], file.path());
    assert!(!output.status.success());
    assert!(stderr(&output).contains("(unclosed"));
}

// ============================================================================
// SECTION: Serve Over Stdio
// ============================================================================

#[test]
fn serve_stdio_executes_demo_fixtures() {
    let file = config_file(STDIO_CONFIG);
    let batch = encode(&calculator_batch());
    let input = format!("{}{}", frame(&batch), frame("bye"));

    let mut child = Command::new(fitslim_bin())
        .arg("serve")
        .arg("--config")
        .arg(file.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn fitslim");
    child.stdin.take().unwrap().write_all(input.as_bytes()).unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let text = stdout(&output);
    let (greeting, rest) = text.split_at(text.find('\n').unwrap() + 1);
    assert_eq!(greeting, "Slim -- V0.3\n");
    let mut reader = Cursor::new(rest.as_bytes());
    let payload = read_frame(&mut reader, 1 << 20).unwrap().unwrap();
    let response = decode(&payload).unwrap();
    assert_eq!(response.branches().len(), 4);
    assert_eq!(response.value_at(&[0, 1]).unwrap(), "OK");
    assert_eq!(response.value_at(&[3, 1]).unwrap(), "7");
    assert!(read_frame(&mut reader, 1 << 20).unwrap().is_none());
}

fn calculator_batch() -> Tree<String> {
    let rows: [&[&str]; 4] = [
        &["m", "make", "calc", "demo.Calculator"],
        &["l", "call", "calc", "setLeft", "3"],
        &["r", "call", "calc", "setRight", "4"],
        &["s", "call", "calc", "sum"],
    ];
    Tree::list(rows.iter().map(|row| Tree::text_list(row.iter().copied())).collect())
}
