// ABOUTME: End-to-end tests spawning the compiled binary on script files

// The interactive REPL itself (line editing, history, prompts) is exercised
// manually; these tests cover the script path, which shares the parse and
// evaluate machinery with it.

use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};

static SCRATCH: AtomicUsize = AtomicUsize::new(0);

/// Write a script to a scratch file and run the interpreter on it.
fn run_script(args: &[&str], script: &str) -> (Output, PathBuf) {
    let mut path = std::env::temp_dir();
    path.push(format!(
        "rholisp-cli-{}-{}.rl",
        std::process::id(),
        SCRATCH.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::write(&path, script).expect("write script");

    let output = Command::new(env!("CARGO_BIN_EXE_rholisp"))
        .args(args)
        .arg(&path)
        .output()
        .expect("run interpreter");
    (output, path)
}

fn stdout_of(args: &[&str], script: &str) -> String {
    let (output, path) = run_script(args, script);
    let _ = std::fs::remove_file(path);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn script_prints_nothing_implicitly() {
    assert_eq!(stdout_of(&["--nostd"], "(+ 1 2 3)"), "");
}

#[test]
fn pstr_writes_to_stdout() {
    assert_eq!(
        stdout_of(&["--nostd"], r#"(pstr (repr (+ 1 2 3)))"#),
        "6"
    );
    assert_eq!(
        stdout_of(&["--nostd"], r#"(pstr "ab") (pstr 99)"#),
        "abc"
    );
}

#[test]
fn scenario_outputs_match_bit_for_bit() {
    let cases = [
        ("(pstr (repr (+ 1 2 3)))", "6"),
        (
            "(def f (() (() xs) F (cons 0 xs))) (pstr (repr (f 1 2 3)))",
            "(0 1 2 3)",
        ),
        ("(pstr (repr (if (truthy? \"\") 1 2)))", "2"),
        ("(pstr (repr '(1 \"a\\n\" T)))", "(1 \"a\\n\" T)"),
        ("(pstr (repr (parse \"42 rest\")))", "(\" rest\" 42)"),
        ("(pstr (repr (subs-with (a 10) (+ a a))))", "20"),
    ];
    for (script, expected) in cases {
        assert_eq!(stdout_of(&["--nostd"], script), expected, "for {script}");
    }
}

#[test]
fn prelude_is_loaded_by_default_and_skippable() {
    assert_eq!(stdout_of(&[], "(println (repr (range 3)))"), "(0 1 2)\n");

    // with --nostd the prelude names are gone: `range` errors to nil
    let (output, path) = run_script(&["--nostd"], "(pstr (repr (range 3)))");
    let _ = std::fs::remove_file(path);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "()");
    assert!(!output.stderr.is_empty());
}

#[test]
fn args_binding_carries_script_name_and_arguments() {
    let (output, path) = run_script(&["--nostd"], "(pstr (repr (tail args)))");
    let _ = std::fs::remove_file(path);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "()");

    let mut script_path = std::env::temp_dir();
    script_path.push(format!("rholisp-args-{}.rl", std::process::id()));
    std::fs::write(&script_path, "(pstr (repr args))").unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_rholisp"))
        .arg("--nostd")
        .arg(&script_path)
        .args(["alpha", "beta"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let shown = script_path.display().to_string();
    assert_eq!(*stdout, format!("(\"{shown}\" \"alpha\" \"beta\")"));
    let _ = std::fs::remove_file(script_path);
}

#[test]
fn exit_builtin_sets_the_process_status() {
    let (output, path) = run_script(&["--nostd"], "(pstr \"before\") (exit 3) (pstr \"after\")");
    let _ = std::fs::remove_file(path);
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "before");
}

#[test]
fn parse_errors_abort_scripts_with_status_one() {
    let (output, path) = run_script(&["--nostd"], "(+ 1 2");
    let _ = std::fs::remove_file(path);
    assert_eq!(output.status.code(), Some(1));
    assert!(!output.stderr.is_empty());
}

#[test]
fn missing_script_file_is_fatal() {
    let output = Command::new(env!("CARGO_BIN_EXE_rholisp"))
        .args(["--nostd", "/no/such/rholisp-script.rl"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn preload_runs_before_the_script() {
    let mut preload_path = std::env::temp_dir();
    preload_path.push(format!("rholisp-preload-{}.rl", std::process::id()));
    std::fs::write(&preload_path, "(def shared 41)").unwrap();

    let preload = preload_path.display().to_string();
    let (output, path) = run_script(
        &["--nostd", "--preload", &preload],
        "(pstr (repr (+ shared 1)))",
    );
    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(preload_path);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "42");
}

#[test]
fn evaluation_errors_keep_the_script_running() {
    let (output, path) = run_script(
        &["--nostd"],
        "(head nil) (no-such) (pstr \"still here\")",
    );
    let _ = std::fs::remove_file(path);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "still here");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("head"));
    assert!(stderr.contains("no-such"));
}
