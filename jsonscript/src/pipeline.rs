//!
//! Pipeline - Load, Resolve, Build, Compile, Invoke
//!
//! One run over a descriptor directory:
//!
//! 1. Load every descriptor file into a `DescriptorStore`
//! 2. Resolve containment into a program tree; orphans abort the run
//!    unless `TolerateOrphans` is set
//! 3. Build the compile unit; signature conflicts abort the run
//! 4. Compile once through the backend
//! 5. Invoke the entry point
//!
//! `check` stops after step 4. Each run reloads the directory; nothing is
//! cached between runs.
//!

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{Assembly, CompileBackend, Value};
use crate::config::{CompilerConfig, ConfigError};
use crate::descriptor::{DescriptorError, DescriptorStore};
use crate::dom::{build, BuildError, CompileUnit};
use crate::driver::{compile, invoke, CompileFailure, InvokeError};
use crate::resolver::{resolve, ResolveError};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Found {count} orphaned descriptor(s): {details}. Set TolerateOrphans to run anyway")]
    Orphans { count: usize, details: String },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Compile(#[from] CompileFailure),

    #[error(transparent)]
    Invoke(#[from] InvokeError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    /// What the entry method returned; `Value::Void` for void methods.
    pub value: Value,
}

/// Loads, resolves and builds the compile unit for the directory at `root`.
pub fn assemble(root: &Path, tolerate_orphans: bool) -> Result<CompileUnit, RunError> {
    let store = DescriptorStore::load_dir(root)?;
    if store.is_empty() {
        warn!("no descriptor files found in {}", root.display());
    }
    for line in store.summary() {
        info!("{}", line);
    }

    let resolution = resolve(&store)?;
    for orphan in &resolution.orphans {
        warn!("orphaned {}", orphan);
    }
    if !resolution.orphans.is_empty() {
        warn!(
            methods = resolution.orphaned_methods(),
            classes = resolution.orphaned_classes(),
            tolerated = tolerate_orphans,
            "orphaned descriptors found"
        );
    }
    if !resolution.orphans.is_empty() && !tolerate_orphans {
        return Err(RunError::Orphans {
            count: resolution.orphans.len(),
            details: resolution
                .orphans
                .iter()
                .map(|o| o.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        });
    }

    let unit = build(&resolution.tree)?;
    info!(
        namespaces = unit.namespaces.len(),
        classes = resolution.tree.class_count(),
        methods = unit.method_count(),
        "assembled compile unit"
    );
    Ok(unit)
}

pub struct Pipeline {
    root: PathBuf,
    config: CompilerConfig,
}

impl Pipeline {
    pub fn new(root: impl Into<PathBuf>, config: CompilerConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn assemble(&self) -> Result<CompileUnit, RunError> {
        info!("starting compiler service for {}", self.root.display());
        assemble(&self.root, self.config.tolerate_orphans)
    }

    /// Compiles an already assembled unit. Callers that report diagnostics
    /// keep the unit around to quote method bodies.
    pub fn compile<B: CompileBackend>(&self, backend: &B, unit: &CompileUnit) -> Result<B::Assembly, RunError> {
        let assembly = compile(backend, unit, &self.config)?;
        info!("compilation succeeded");
        Ok(assembly)
    }

    pub fn invoke<A: Assembly>(&self, assembly: &A) -> Result<RunOutcome, RunError> {
        let value = invoke(assembly, &self.config)?;
        Ok(RunOutcome { value })
    }

    /// Assembles and compiles without invoking anything.
    pub fn check<B: CompileBackend>(&self, backend: &B) -> Result<B::Assembly, RunError> {
        let unit = self.assemble()?;
        self.compile(backend, &unit)
    }

    pub fn run<B: CompileBackend>(&self, backend: &B) -> Result<RunOutcome, RunError> {
        let assembly = self.check(backend)?;
        self.invoke(&assembly)
    }
}
