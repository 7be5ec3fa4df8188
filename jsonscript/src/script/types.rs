//!
//! Script Types
//!
//! The small set of types the script backend understands. Signatures name
//! them with framework spellings (`System.Int32`) or keyword aliases
//! (`int`); both resolve to the same `ScriptType`.
//!
//! Values are coerced when they cross a typed boundary: arguments, return
//! values and typed locals. Ints widen to floats and `null` fits any
//! reference type. Every other mismatch is a failure.
//!

use std::fmt;

use crate::backend::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptType {
    Void,
    Int,
    Float,
    Bool,
    Str,
    Object,
}

impl ScriptType {
    pub fn resolve(name: &str) -> Option<ScriptType> {
        let ty = match name.trim() {
            "System.Void" | "Void" | "void" => ScriptType::Void,
            "System.Int32" | "Int32" | "int" | "System.Int64" | "Int64" | "long" => ScriptType::Int,
            "System.Double" | "Double" | "double" | "System.Single" | "Single" | "float" => {
                ScriptType::Float
            }
            "System.Boolean" | "Boolean" | "bool" => ScriptType::Bool,
            "System.String" | "String" | "string" => ScriptType::Str,
            "System.Object" | "Object" | "object" => ScriptType::Object,
            _ => return None,
        };
        Some(ty)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, ScriptType::Void)
    }

    /// Converts `value` for storage in a slot of this type.
    pub fn coerce(&self, value: Value) -> Result<Value, String> {
        match (self, value) {
            (ScriptType::Object, Value::Void) => Err("Cannot use a void result as a value".to_string()),
            (ScriptType::Object, v) => Ok(v),
            (ScriptType::Int, v @ Value::Int(_)) => Ok(v),
            (ScriptType::Float, v @ Value::Float(_)) => Ok(v),
            (ScriptType::Float, Value::Int(n)) => Ok(Value::Float(n as f64)),
            (ScriptType::Bool, v @ Value::Bool(_)) => Ok(v),
            (ScriptType::Str, v @ (Value::Str(_) | Value::Null)) => Ok(v),
            (ScriptType::Void, Value::Void) => Ok(Value::Void),
            (ty, v) => Err(format!(
                "Cannot implicitly convert type '{}' to '{}'",
                v.type_name(),
                ty
            )),
        }
    }

    /// The value a typed local holds before its first assignment.
    pub fn default_value(&self) -> Value {
        match self {
            ScriptType::Void => Value::Void,
            ScriptType::Int => Value::Int(0),
            ScriptType::Float => Value::Float(0.0),
            ScriptType::Bool => Value::Bool(false),
            ScriptType::Str | ScriptType::Object => Value::Null,
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScriptType::Void => "void",
            ScriptType::Int => "int",
            ScriptType::Float => "double",
            ScriptType::Bool => "bool",
            ScriptType::Str => "string",
            ScriptType::Object => "object",
        };
        f.write_str(name)
    }
}
