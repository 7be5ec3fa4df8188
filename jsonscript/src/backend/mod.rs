///
/// # Backend Capabilities
///
/// The pipeline never compiles or executes code itself. It talks to a
/// backend through two traits:
///
/// - **CompileBackend**: compile unit + ordered references + output name ->
///   an `Assembly`, or every diagnostic the backend produced
/// - **Assembly**: locate a type and a method by name, create an instance and
///   invoke a method with no arguments
///
/// The production implementation is the script backend in `crate::script`.
/// Tests substitute doubles that return canned results.
///

use std::fmt;

use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::dom::CompileUnit;

/// A value produced by invoking a method.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Void,
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// An instance, identified by its fully qualified type name.
    Object(String),
}

impl Value {
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Float(_) => "double",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void | Value::Null => Ok(()),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Str(s) => f.write_str(s),
            Value::Object(type_name) => f.write_str(type_name),
        }
    }
}

/// A failure raised while executing a method body.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (in {method})")]
pub struct RuntimeFailure {
    /// Qualified name of the method that raised the failure.
    pub method: String,
    pub message: String,
}

impl RuntimeFailure {
    pub fn new(method: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            message: message.into(),
        }
    }
}

pub trait MethodHandle {
    fn name(&self) -> &str;

    /// Parameters without a default value.
    fn required_parameters(&self) -> usize;
}

pub trait Assembly {
    type Instance;
    type Method: MethodHandle;

    fn name(&self) -> &str;

    /// Creates an instance of the type with the given fully qualified name.
    fn create_instance(&self, type_name: &str) -> Option<Self::Instance>;

    /// Finds a public method by exact name on the instance's type.
    fn get_method(&self, instance: &Self::Instance, name: &str) -> Option<Self::Method>;

    /// Invokes `method` with no arguments. Parameters with defaults take
    /// their default values.
    fn invoke(&self, instance: &Self::Instance, method: &Self::Method) -> Result<Value, RuntimeFailure>;
}

pub trait CompileBackend {
    type Assembly: Assembly;

    /// Compiles `unit` in one attempt. On failure every diagnostic is
    /// returned in the order the backend produced them.
    fn compile(
        &self,
        unit: &CompileUnit,
        references: &[String],
        assembly_name: &str,
    ) -> Result<Self::Assembly, Vec<Diagnostic>>;
}
