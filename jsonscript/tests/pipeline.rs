///
/// Pipeline Integration Tests
///
/// Each test writes descriptor files into a temporary directory and drives
/// `Pipeline` end to end. Script console output is captured with
/// `CapturedOutput` so assertions can look at what the entry point printed.
///

use std::fs;
use std::path::Path;

use jsonscript::backend::{Assembly, CompileBackend, MethodHandle, RuntimeFailure, Value};
use jsonscript::diagnostic::Diagnostic;
use jsonscript::dom::{BuildError, CompileUnit};
use jsonscript::script::{CapturedOutput, ScriptBackend};
use jsonscript::{init_project, CompilerConfig, InvokeError, Pipeline, RawSettings, RunError};
use tempfile::TempDir;

fn write(dir: &Path, file: &str, text: &str) {
    fs::write(dir.join(file), text).unwrap();
}

/// Namespace `Acme` importing `System`, class `Widget`, void method `Run`.
fn acme(dir: &Path) {
    write(dir, "Namespace-Acme.json", r#"{ "Namespace": "Acme", "Implements": ["System"] }"#);
    write(dir, "Class-Widget.json", r#"{ "Name": "Widget", "Namespace": "Acme", "AccessModifier": "public" }"#);
    write(
        dir,
        "Method-Run.json",
        r#"{
            "Name": "Run",
            "Namespace": "Acme.Widget",
            "AccessModifier": "public",
            "ReturnType": "System.Void",
            "Code": "Console.WriteLine(\"widget running\");"
        }"#,
    );
}

fn run(dir: &Path, config: CompilerConfig) -> (Result<Value, RunError>, String) {
    let output = CapturedOutput::new();
    let backend = ScriptBackend::with_output(output.clone());
    let result = Pipeline::new(dir, config).run(&backend).map(|outcome| outcome.value);
    (result, output.contents())
}

#[test]
fn test_scenario_a_runs_entry_point() {
    let temp_dir = TempDir::new().unwrap();
    acme(temp_dir.path());

    let (result, output) = run(temp_dir.path(), CompilerConfig::new("Acme.Widget", "Run"));
    assert_eq!(result.unwrap(), Value::Void);
    assert_eq!(output, "widget running\n");
}

#[test]
fn test_scenario_b_orphan_excluded_when_tolerated() {
    let temp_dir = TempDir::new().unwrap();
    acme(temp_dir.path());
    write(
        temp_dir.path(),
        "Method-Orphan.json",
        r#"{ "Name": "Spin", "Namespace": "Acme.Gadget", "Code": "Missing();" }"#,
    );

    let (result, _) = run(temp_dir.path(), CompilerConfig::new("Acme.Widget", "Run"));
    assert!(matches!(result, Err(RunError::Orphans { count: 1, .. })));

    // The orphan's body would not compile; tolerated, it never reaches the backend.
    let mut config = CompilerConfig::new("Acme.Widget", "Run");
    config.tolerate_orphans = true;
    let (result, output) = run(temp_dir.path(), config);
    assert_eq!(result.unwrap(), Value::Void);
    assert_eq!(output, "widget running\n");
}

#[test]
fn test_orphaned_class_drops_its_methods() {
    let temp_dir = TempDir::new().unwrap();
    acme(temp_dir.path());
    write(temp_dir.path(), "Class-Lost.json", r#"{ "Name": "Lost", "Namespace": "Nowhere" }"#);
    write(temp_dir.path(), "Method-LostRun.json", r#"{ "Name": "Go", "Namespace": "Nowhere.Lost" }"#);

    let (result, _) = run(temp_dir.path(), CompilerConfig::new("Acme.Widget", "Run"));
    let err = result.unwrap_err();
    assert!(matches!(err, RunError::Orphans { count: 1, .. }));
    assert!(err.to_string().contains("class 'Lost' names namespace 'Nowhere'"));
    assert!(err.to_string().contains("(1 method dropped)"));
}

#[test]
fn test_scenario_c_entry_method_not_found() {
    let temp_dir = TempDir::new().unwrap();
    acme(temp_dir.path());

    let (result, output) = run(temp_dir.path(), CompilerConfig::new("Acme.Widget", "Start"));
    match result {
        Err(RunError::Invoke(InvokeError::EntryMethodNotFound { type_name, method })) => {
            assert_eq!(type_name, "Acme.Widget");
            assert_eq!(method, "Start");
        }
        other => panic!("Expected EntryMethodNotFound, got {:?}", other),
    }
    assert_eq!(output, "");
}

#[test]
fn test_entry_type_not_found() {
    let temp_dir = TempDir::new().unwrap();
    acme(temp_dir.path());

    let (result, _) = run(temp_dir.path(), CompilerConfig::new("Acme.Gadget", "Run"));
    assert!(matches!(
        result,
        Err(RunError::Invoke(InvokeError::EntryTypeNotFound { .. }))
    ));
}

#[test]
fn test_scenario_d_required_parameter_rejected() {
    let temp_dir = TempDir::new().unwrap();
    acme(temp_dir.path());
    write(
        temp_dir.path(),
        "Method-Count.json",
        r#"{
            "Name": "Count",
            "Namespace": "Acme.Widget",
            "AccessModifier": "public",
            "ParameterTypes": ["System.Int32"],
            "ParameterNames": ["n"],
            "Code": "Console.WriteLine(n);"
        }"#,
    );

    let (result, output) = run(temp_dir.path(), CompilerConfig::new("Acme.Widget", "Count"));
    assert!(matches!(
        result,
        Err(RunError::Invoke(InvokeError::EntryMethodHasRequiredParameters { required: 1, .. }))
    ));
    assert_eq!(output, "");
}

#[test]
fn test_defaulted_parameters_do_not_block_entry() {
    let temp_dir = TempDir::new().unwrap();
    acme(temp_dir.path());
    write(
        temp_dir.path(),
        "Method-Twice.json",
        r#"{
            "Name": "Twice",
            "Namespace": "Acme.Widget",
            "AccessModifier": "public",
            "ReturnType": "System.Int32",
            "ParameterTypes": ["System.Int32"],
            "ParameterNames": ["n"],
            "ParameterDefaultValues": ["21"],
            "Code": "return n * 2;"
        }"#,
    );

    let (result, _) = run(temp_dir.path(), CompilerConfig::new("Acme.Widget", "Twice"));
    assert_eq!(result.unwrap(), Value::Int(42));
}

#[test]
fn test_private_entry_method_is_not_discoverable() {
    let temp_dir = TempDir::new().unwrap();
    acme(temp_dir.path());
    write(
        temp_dir.path(),
        "Method-Hidden.json",
        r#"{ "Name": "Hidden", "Namespace": "Acme.Widget", "Code": "return;" }"#,
    );

    let (result, _) = run(temp_dir.path(), CompilerConfig::new("Acme.Widget", "Hidden"));
    assert!(matches!(
        result,
        Err(RunError::Invoke(InvokeError::EntryMethodNotFound { .. }))
    ));
}

#[test]
fn test_missing_access_modifier_is_callable_but_not_an_entry_point() {
    let temp_dir = TempDir::new().unwrap();
    acme(temp_dir.path());
    write(
        temp_dir.path(),
        "Method-Five.json",
        r#"{ "Name": "Five", "Namespace": "Acme.Widget", "ReturnType": "System.Int32", "Code": "return 5" }"#,
    );
    write(
        temp_dir.path(),
        "Method-CallFive.json",
        r#"{
            "Name": "CallFive",
            "Namespace": "Acme.Widget",
            "AccessModifier": "public",
            "ReturnType": "System.Int32",
            "Code": "return Five() + 1"
        }"#,
    );

    let (result, _) = run(temp_dir.path(), CompilerConfig::new("Acme.Widget", "CallFive"));
    assert_eq!(result.unwrap(), Value::Int(6));

    let (result, _) = run(temp_dir.path(), CompilerConfig::new("Acme.Widget", "Five"));
    match result {
        Err(RunError::Invoke(InvokeError::EntryMethodNotFound { method, .. })) => assert_eq!(method, "Five"),
        other => panic!("Expected EntryMethodNotFound, got {:?}", other),
    }
}

#[test]
fn test_signature_conflict_aborts_before_compile() {
    let temp_dir = TempDir::new().unwrap();
    acme(temp_dir.path());
    write(
        temp_dir.path(),
        "Method-Bad.json",
        r#"{
            "Name": "Bad",
            "Namespace": "Acme.Widget",
            "ParameterTypes": ["System.Int32", "System.Int32"],
            "ParameterNames": ["a", "b"],
            "ParameterDefaultValues": ["1", null]
        }"#,
    );

    let (result, _) = run(temp_dir.path(), CompilerConfig::new("Acme.Widget", "Run"));
    let Err(RunError::Build(BuildError::SignatureConflicts(conflicts))) = result else {
        panic!("Expected a signature conflict");
    };
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].method, "Acme.Widget.Bad");
}

#[test]
fn test_compile_errors_reported_together() {
    let temp_dir = TempDir::new().unwrap();
    acme(temp_dir.path());
    write(
        temp_dir.path(),
        "Method-Broken.json",
        r#"{
            "Name": "Broken",
            "Namespace": "Acme.Widget",
            "ReturnType": "System.Int32",
            "Code": "Missing();\nConsole.Shout(\"x\");\nreturn 1"
        }"#,
    );

    let mut config = CompilerConfig::new("Acme.Widget", "Run");
    config.visualize_on_error = true;
    let (result, output) = run(temp_dir.path(), config);
    let Err(RunError::Compile(failure)) = result else {
        panic!("Expected a compile failure");
    };
    let codes: Vec<&str> = failure.diagnostics.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, vec!["JS0103", "JS0117"]);
    assert_eq!(failure.error_count(), 2);
    let rendering = failure.rendering.unwrap();
    assert!(rendering.contains("namespace Acme"));
    assert!(rendering.contains("Missing();"));
    assert_eq!(output, "");
}

#[test]
fn test_runtime_failure_names_method() {
    let temp_dir = TempDir::new().unwrap();
    acme(temp_dir.path());
    write(
        temp_dir.path(),
        "Method-Explode.json",
        r#"{
            "Name": "Explode",
            "Namespace": "Acme.Widget",
            "AccessModifier": "public",
            "Code": "Console.WriteLine(\"before\");\nthrow \"kaboom\";"
        }"#,
    );

    let (result, output) = run(temp_dir.path(), CompilerConfig::new("Acme.Widget", "Explode"));
    let Err(RunError::Invoke(InvokeError::UncaughtRuntimeFailure(failure))) = result else {
        panic!("Expected a runtime failure");
    };
    assert_eq!(failure.method, "Acme.Widget.Explode");
    assert_eq!(failure.message, "kaboom");
    assert_eq!(output, "before\n");
}

#[test]
fn test_initialized_project_runs() {
    let temp_dir = TempDir::new().unwrap();
    init_project(temp_dir.path()).unwrap();

    let config = CompilerConfig::load(temp_dir.path(), RawSettings::default()).unwrap();
    assert_eq!(config.assembly_name, "ExampleAssembly");
    let (result, output) = run(temp_dir.path(), config);
    assert_eq!(result.unwrap(), Value::Void);
    assert_eq!(output, "Waiting half a second...\n");
}

#[test]
fn test_settings_override_from_flags() {
    let temp_dir = TempDir::new().unwrap();
    init_project(temp_dir.path()).unwrap();
    acme(temp_dir.path());

    let overrides = RawSettings {
        entry_namespace: Some("Acme.Widget".to_string()),
        entry_method: Some("Run".to_string()),
        ..RawSettings::default()
    };
    let config = CompilerConfig::load(temp_dir.path(), overrides).unwrap();
    assert_eq!(config.assembly_name, "ExampleAssembly");
    let (result, output) = run(temp_dir.path(), config);
    assert_eq!(result.unwrap(), Value::Void);
    assert_eq!(output, "widget running\n");
}

/// Backend double that fails with a fixed list of diagnostics.
struct FailingBackend(Vec<Diagnostic>);

struct NoAssembly;

struct NoMethod;

impl MethodHandle for NoMethod {
    fn name(&self) -> &str {
        ""
    }

    fn required_parameters(&self) -> usize {
        0
    }
}

impl Assembly for NoAssembly {
    type Instance = ();
    type Method = NoMethod;

    fn name(&self) -> &str {
        "NoAssembly"
    }

    fn create_instance(&self, _: &str) -> Option<()> {
        None
    }

    fn get_method(&self, _: &(), _: &str) -> Option<NoMethod> {
        None
    }

    fn invoke(&self, _: &(), _: &NoMethod) -> Result<Value, RuntimeFailure> {
        unreachable!("nothing to invoke")
    }
}

impl CompileBackend for FailingBackend {
    type Assembly = NoAssembly;

    fn compile(&self, _: &CompileUnit, _: &[String], _: &str) -> Result<NoAssembly, Vec<Diagnostic>> {
        Err(self.0.clone())
    }
}

#[test]
fn test_every_backend_diagnostic_reaches_the_failure() {
    let temp_dir = TempDir::new().unwrap();
    acme(temp_dir.path());

    let diagnostics: Vec<Diagnostic> = (0..5)
        .map(|i| Diagnostic::error(format!("JS900{}", i), format!("problem {}", i)))
        .collect();
    let backend = FailingBackend(diagnostics.clone());
    let pipeline = Pipeline::new(temp_dir.path(), CompilerConfig::new("Acme.Widget", "Run"));

    match pipeline.run(&backend) {
        Err(RunError::Compile(failure)) => {
            assert_eq!(failure.diagnostics, diagnostics);
            assert!(failure.rendering.is_none());
            assert_eq!(failure.to_string(), "Compilation failed with 5 error(s)");
        }
        other => panic!("Expected a compile failure, got {:?}", other.map(|o| o.value)),
    }
}
