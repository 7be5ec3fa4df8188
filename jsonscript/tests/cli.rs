///
/// CLI Integration Tests
///
/// Runs the `jsonscript` binary against temporary descriptor directories
/// and asserts on exit status and output.
///
/// Run all:  `cargo test --test cli`
///

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn jsonscript(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_jsonscript"))
        .args(args)
        .arg(dir)
        .output()
        .expect("failed to run jsonscript")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_init_then_run() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("project");

    let init = jsonscript(&["init"], &project);
    assert!(init.status.success(), "init failed: {}", stderr(&init));
    assert!(project.join("compilerSettings.json").is_file());

    let run = jsonscript(&["run"], &project);
    assert!(run.status.success(), "run failed: {}", stderr(&run));
    assert_eq!(stdout(&run), "Waiting half a second...\n");
    assert!(stderr(&run).contains("Found 2 methods."));

    let again = jsonscript(&["init"], &project);
    assert!(!again.status.success());
    assert!(stderr(&again).contains("already initialized"));
}

#[test]
fn test_run_prints_return_value() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    fs::write(dir.join("Namespace-Acme.json"), r#"{ "Namespace": "Acme" }"#).unwrap();
    fs::write(dir.join("Class-Calc.json"), r#"{ "Name": "Calc", "Namespace": "Acme" }"#).unwrap();
    fs::write(
        dir.join("Method-Answer.json"),
        r#"{ "Name": "Answer", "Namespace": "Acme.Calc", "AccessModifier": "public", "ReturnType": "System.Int32", "Code": "return 6 * 7" }"#,
    )
    .unwrap();

    let run = jsonscript(
        &["run", "--entry-namespace", "Acme.Calc", "--entry-method", "Answer", "--silent"],
        dir,
    );
    assert!(run.status.success(), "run failed: {}", stderr(&run));
    assert_eq!(stdout(&run), "42\n");
    assert!(!stderr(&run).contains("Found"));
}

#[test]
fn test_check_reports_diagnostics() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("project");
    assert!(jsonscript(&["init"], &project).status.success());
    fs::write(
        project.join("Method-Main.json"),
        r#"{ "Name": "Main", "Namespace": "ExampleProject.Program", "AccessModifier": "public", "Code": "Nope();" }"#,
    )
    .unwrap();

    let check = jsonscript(&["check"], &project);
    assert_eq!(check.status.code(), Some(1));
    let err = stderr(&check);
    assert!(err.contains("JS0103"), "stderr: {}", err);
    assert!(err.contains("Generated visual for debugging:"));
    assert!(err.contains("error: Compilation failed with 1 error(s)"));
}

#[test]
fn test_missing_settings() {
    let temp_dir = TempDir::new().unwrap();

    let run = jsonscript(&["run"], temp_dir.path());
    assert_eq!(run.status.code(), Some(1));
    assert!(stderr(&run).starts_with("error: No compiler settings found"));
}

#[test]
fn test_show_renders_source() {
    let temp_dir = TempDir::new().unwrap();
    let project = temp_dir.path().join("project");
    assert!(jsonscript(&["init"], &project).status.success());

    let show = jsonscript(&["show"], &project);
    assert!(show.status.success(), "show failed: {}", stderr(&show));
    let out = stdout(&show);
    assert!(out.contains("namespace ExampleProject"));
    assert!(out.contains("using System.Threading;"));
    assert!(out.contains("ExampleMethod(\"1\");"));
}
