///
/// jsonscript - Programs Assembled from JSON Descriptors
///
/// A directory of small descriptor files (namespaces, classes, methods with
/// their body text) is assembled into a compile unit, compiled through a
/// backend and its configured entry point invoked. It includes:
///
/// - descriptor: Descriptor records and the directory loader
/// - config: `compilerSettings.json` and CLI overrides
/// - resolver: Containment of methods in classes in namespaces
/// - dom: The backend-neutral compile unit and its source rendering
/// - backend: Compile and invocation capabilities
/// - script: The production backend (parser, binder, interpreter)
/// - driver: Compile once, then invoke the entry point
/// - pipeline: Load -> resolve -> build -> compile -> invoke
///
/// Entry points:
/// - `Pipeline::run`: Execute a descriptor directory
/// - `init_project`: Scaffold a runnable descriptor directory
///

pub mod backend;
pub mod config;
pub mod descriptor;
pub mod diagnostic;
pub mod dom;
pub mod driver;
pub mod init;
pub mod pipeline;
pub mod resolver;
pub mod script;
pub mod source;

pub use backend::{Assembly, CompileBackend, MethodHandle, RuntimeFailure, Value};
pub use config::{CompilerConfig, ConfigError, RawSettings};
pub use descriptor::{DescriptorError, DescriptorStore};
pub use diagnostic::{Diagnostic, DiagnosticReporter};
pub use dom::{render, CompileUnit};
pub use driver::{CompileFailure, InvokeError};
pub use init::{init_project, InitError};
pub use pipeline::{Pipeline, RunError, RunOutcome};
pub use script::ScriptBackend;
