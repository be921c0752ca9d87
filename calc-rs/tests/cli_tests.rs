//! End-to-end tests: pipe command lines into the `calc` binary and compare
//! what it prints.  Stdin is not a terminal here, so no prompt is written.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Path to the `calc` binary built by this Cargo workspace.
fn calc_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_calc"))
}

struct Output {
    stdout: Vec<String>,
    stderr: Vec<String>,
    success: bool,
}

fn lines(raw: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(raw)
        .lines()
        .map(|l| l.trim().to_owned())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Run the binary with `args` (user config always skipped unless `-f<file>`
/// is given) and feed `script` on stdin.
fn run_calc(args: &[&str], script: &str) -> Output {
    let mut cmd = Command::new(calc_binary());
    if !args.iter().any(|a| a.starts_with("-f")) {
        cmd.arg("-f");
    }
    cmd.args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn().expect("failed to spawn calc binary");
    {
        let stdin = child.stdin.as_mut().expect("stdin not open");
        stdin.write_all(script.as_bytes()).expect("write to stdin");
    }
    let out = child.wait_with_output().expect("wait failed");
    Output { stdout: lines(&out.stdout), stderr: lines(&out.stderr), success: out.status.success() }
}

fn check(args: &[&str], script: &str, expected: &[&str]) {
    let out = run_calc(args, script);
    assert_eq!(
        out.stdout, expected,
        "\nScript:\n{script}\nStderr:\n{:#?}",
        out.stderr
    );
}

// ── Cases ─────────────────────────────────────────────────────────────────────

#[test]
fn infix_double_by_default() {
    check(&[], "= 1 + 2 * 3\n= 2 ^ 3 ^ 2\n", &["7.0", "512.0"]);
}

#[test]
fn postfix_bigint_flags() {
    check(&["-p", "-tbigint"], "= 7 3 /\n= 2 100 ^\n", &["2", "1267650600228229401496703205376"]);
}

#[test]
fn print_symbol_goes_to_stdout() {
    check(&["-pt", "int"], "eval 4 5 p$2\n", &[": 5 4"]);
}

#[test]
fn errors_go_to_stderr_and_input_continues() {
    let out = run_calc(&[], "= 1 +\nconfig pop\n= 2\n");
    assert_eq!(out.stdout, ["2.0"]);
    assert_eq!(out.stderr.len(), 2, "{:#?}", out.stderr);
    assert!(out.stderr.iter().all(|l| l.starts_with("calc: ")));
    assert!(out.success);
}

#[test]
fn one_shot_command() {
    let out = run_calc(&["-c= 1/3 + 1/6", "-tfraction"], "= 99\n");
    assert_eq!(out.stdout, ["1/2"]);
    assert!(out.success);

    let out = run_calc(&["-cconfig load nowhere"], "");
    assert!(out.stdout.is_empty());
    assert!(!out.success);
}

#[test]
fn config_file_settings_and_startup_commands() {
    let mut rc = tempfile::NamedTempFile::new().unwrap();
    writeln!(rc, "; test config").unwrap();
    writeln!(rc, "/set calculator=bigint").unwrap();
    writeln!(rc, "/set notation postfix").unwrap();
    writeln!(rc, "/set position=10,64,-3").unwrap();
    writeln!(rc, "fun twice 1 = _1 2 *").unwrap();
    let flag = format!("-f{}", rc.path().display());

    check(&[flag.as_str()], "= $x $y $z + + twice\n", &["twice/1", "142"]);
}

#[test]
fn unknown_flag_prints_usage() {
    let out = run_calc(&["-z"], "");
    assert!(!out.success);
    assert!(out.stderr.iter().any(|l| l.starts_with("Usage: calc")));
}
