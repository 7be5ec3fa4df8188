///
/// Compile Driver
///
/// Submits the compile unit to a backend in one attempt. On failure the
/// result carries every diagnostic the backend produced, in order, and the
/// rendered source of the unit when `VisualizeOnError` is set.
///

use thiserror::Error;
use tracing::info;

use crate::backend::CompileBackend;
use crate::config::CompilerConfig;
use crate::diagnostic::Diagnostic;
use crate::dom::{render, CompileUnit};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Compilation failed with {} error(s)", count_errors(.diagnostics))]
pub struct CompileFailure {
    pub diagnostics: Vec<Diagnostic>,
    /// Rendered compile unit, present when visualize-on-error is enabled.
    pub rendering: Option<String>,
}

impl CompileFailure {
    pub fn error_count(&self) -> usize {
        count_errors(&self.diagnostics)
    }
}

fn count_errors(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|d| d.is_error()).count()
}

pub fn compile<B: CompileBackend>(
    backend: &B,
    unit: &CompileUnit,
    config: &CompilerConfig,
) -> Result<B::Assembly, CompileFailure> {
    let references = unit.references();
    info!(
        assembly = %config.assembly_name,
        references = references.len(),
        "compiling {} methods",
        unit.method_count()
    );

    backend
        .compile(unit, &references, &config.assembly_name)
        .map_err(|diagnostics| CompileFailure {
            diagnostics,
            rendering: config.visualize_on_error.then(|| render(unit)),
        })
}
