//!
//! Script Backend
//!
//! The production `CompileBackend`. Method bodies are written in a small
//! C#-flavoured statement language; "compiling" a unit parses and binds
//! every body, and the resulting `ScriptAssembly` runs them with a
//! tree-walking interpreter.
//!
//! Pipeline inside the backend:
//! - lexer: body text to tokens, names interned with lasso
//! - parser: nom combinators over the token stream
//! - binder: names to slots, methods and builtins; all diagnostics collected
//! - interp: executes the bound program
//!
//! Console output from scripts goes to stdout unless the backend is built
//! with a `CapturedOutput`.
//!

pub mod ast;
pub mod binder;
pub mod builtins;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod types;

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use smallvec::SmallVec;
use tracing::debug;

use crate::backend::{Assembly, CompileBackend, MethodHandle, RuntimeFailure, Value};
use crate::diagnostic::Diagnostic;
use crate::dom::CompileUnit;

use binder::BoundProgram;
use interp::Interpreter;

/// A shared in-memory sink for script console output.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput(Rc<RefCell<Vec<u8>>>);

impl CapturedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ScriptBackend {
    captured: Option<CapturedOutput>,
}

impl ScriptBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(output: CapturedOutput) -> Self {
        Self {
            captured: Some(output),
        }
    }

    fn output(&self) -> Box<dyn Write> {
        match &self.captured {
            Some(captured) => Box::new(captured.clone()),
            None => Box::new(io::stdout()),
        }
    }
}

impl CompileBackend for ScriptBackend {
    type Assembly = ScriptAssembly;

    fn compile(
        &self,
        unit: &CompileUnit,
        references: &[String],
        assembly_name: &str,
    ) -> Result<ScriptAssembly, Vec<Diagnostic>> {
        let program = binder::bind(unit, references)?;
        debug!(
            assembly = assembly_name,
            types = program.types.len(),
            "bound script program"
        );

        Ok(ScriptAssembly {
            name: assembly_name.to_string(),
            program,
            output: RefCell::new(self.output()),
        })
    }
}

pub struct ScriptAssembly {
    name: String,
    program: BoundProgram,
    output: RefCell<Box<dyn Write>>,
}

#[derive(Debug, Clone)]
pub struct ScriptInstance {
    type_idx: usize,
    receiver: Value,
}

#[derive(Debug, Clone)]
pub struct ScriptMethod {
    type_idx: usize,
    method_idx: usize,
    name: String,
    required: usize,
}

impl MethodHandle for ScriptMethod {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_parameters(&self) -> usize {
        self.required
    }
}

impl Assembly for ScriptAssembly {
    type Instance = ScriptInstance;
    type Method = ScriptMethod;

    fn name(&self) -> &str {
        &self.name
    }

    /// Static types can be instantiated too; the instance carries no state.
    fn create_instance(&self, type_name: &str) -> Option<ScriptInstance> {
        let type_idx = self.program.find_type(type_name)?;
        Some(ScriptInstance {
            type_idx,
            receiver: Value::Object(self.program.types[type_idx].full_name.clone()),
        })
    }

    fn get_method(&self, instance: &ScriptInstance, name: &str) -> Option<ScriptMethod> {
        let ty = &self.program.types[instance.type_idx];
        let method_idx = ty.find_method(name)?;
        let method = &ty.methods[method_idx];
        if !method.is_public() {
            return None;
        }

        Some(ScriptMethod {
            type_idx: instance.type_idx,
            method_idx,
            name: method.name.clone(),
            required: method.required_params(),
        })
    }

    fn invoke(&self, instance: &ScriptInstance, method: &ScriptMethod) -> Result<Value, RuntimeFailure> {
        let mut output = self.output.borrow_mut();
        let result = Interpreter::new(&self.program, &mut **output).call(
            method.type_idx,
            method.method_idx,
            instance.receiver.clone(),
            SmallVec::new(),
        );
        if let Err(e) = output.flush() {
            debug!(error = %e, "failed to flush script output");
        }
        result
    }
}
