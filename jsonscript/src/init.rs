///
/// # Project Initialization
///
/// Scaffolds a descriptor directory that runs out of the box:
///
/// - `compilerSettings.json` - entry `ExampleProject.Program` / `Main`
/// - `Namespace-ExampleProject.json` - imports `System` and `System.Threading`
/// - `Class-Program.json` - the entry class
/// - `Method-Main.json` - public entry method calling the helper
/// - `Method-Example.json` - private static helper with a defaulted parameter
/// - `Compiler/` - scratch directory
///
/// Refuses to touch a directory that already has a `compilerSettings.json`.
///

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::{RawSettings, SETTINGS_JSON};
use crate::descriptor::{AccessModifier, ClassDescriptor, MethodDescriptor, NamespaceDescriptor};

pub const SCRATCH_DIR: &str = "Compiler";

const MAIN_BODY: &str = "ExampleMethod(\"1\");";

const EXAMPLE_BODY: &str = "Console.WriteLine(\"Waiting half a second...\");\nThread.Sleep(500);\nreturn 3";

#[derive(Debug, Error)]
pub enum InitError {
    #[error("Project already initialized at {}", .path.display())]
    AlreadyInitialized { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize {file}: {source}")]
    Serialize {
        file: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub fn init_project(dir: &Path) -> Result<(), InitError> {
    let settings_path = dir.join(SETTINGS_JSON);
    if settings_path.exists() {
        return Err(InitError::AlreadyInitialized { path: settings_path });
    }

    fs::create_dir_all(dir.join(SCRATCH_DIR))?;

    let settings = RawSettings {
        entry_method: Some("Main".to_string()),
        entry_namespace: Some("ExampleProject.Program".to_string()),
        assembly_name: Some("ExampleAssembly".to_string()),
        silent_compilation: Some(false),
        visualize_on_error: Some(true),
        tolerate_orphans: None,
    };
    write_json(dir, SETTINGS_JSON, &settings)?;

    let namespace = NamespaceDescriptor::new("ExampleProject").implements(["System", "System.Threading"]);
    write_json(dir, "Namespace-ExampleProject.json", &namespace)?;

    let class = ClassDescriptor::new("Program", "ExampleProject").implements(["System", "System.Threading"]);
    write_json(dir, "Class-Program.json", &class)?;

    let main = MethodDescriptor::new("Main", "ExampleProject.Program")
        .access(AccessModifier::Public)
        .code(MAIN_BODY);
    write_json(dir, "Method-Main.json", &main)?;

    let example = MethodDescriptor::new("ExampleMethod", "ExampleProject.Program")
        .access(AccessModifier::Private)
        .as_static()
        .returns("System.Int32")
        .param_with_default("System.String", "exParam", "\"test\"")
        .code(EXAMPLE_BODY);
    write_json(dir, "Method-Example.json", &example)?;

    info!("initialized project in {}", dir.display());
    Ok(())
}

fn write_json<T: Serialize>(dir: &Path, file: &'static str, value: &T) -> Result<(), InitError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| InitError::Serialize { file, source })?;
    fs::write(dir.join(file), text)?;
    Ok(())
}
