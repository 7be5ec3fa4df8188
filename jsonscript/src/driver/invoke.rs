///
/// Invocation Driver
///
/// Runs the configured entry point of a compiled assembly. Each step is
/// terminal on failure:
///
/// 1. Create an instance of the entry type
/// 2. Find the entry method among the type's public methods
/// 3. Require that every parameter has a default
/// 4. Invoke with no arguments
///
/// A failure raised by the method body is passed through untouched.
///

use thiserror::Error;
use tracing::info;

use crate::backend::{Assembly, MethodHandle, RuntimeFailure, Value};
use crate::config::CompilerConfig;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvokeError {
    #[error("The entry namespace '{type_name}' was not found in assembly '{assembly}'")]
    EntryTypeNotFound { type_name: String, assembly: String },

    #[error("The entry method '{method}' was not found in '{type_name}' (it must exist and be public)")]
    EntryMethodNotFound { type_name: String, method: String },

    #[error(
        "The entry method '{type_name}.{method}' must not contain any required arguments ({required} required)"
    )]
    EntryMethodHasRequiredParameters {
        type_name: String,
        method: String,
        required: usize,
    },

    #[error("Uncaught runtime failure: {0}")]
    UncaughtRuntimeFailure(#[source] RuntimeFailure),
}

pub fn invoke<A: Assembly>(assembly: &A, config: &CompilerConfig) -> Result<Value, InvokeError> {
    let instance = assembly
        .create_instance(&config.entry_type)
        .ok_or_else(|| InvokeError::EntryTypeNotFound {
            type_name: config.entry_type.clone(),
            assembly: assembly.name().to_string(),
        })?;

    let method = assembly
        .get_method(&instance, &config.entry_method)
        .ok_or_else(|| InvokeError::EntryMethodNotFound {
            type_name: config.entry_type.clone(),
            method: config.entry_method.clone(),
        })?;

    let required = method.required_parameters();
    if required > 0 {
        return Err(InvokeError::EntryMethodHasRequiredParameters {
            type_name: config.entry_type.clone(),
            method: method.name().to_string(),
            required,
        });
    }

    info!("invoking {}.{}", config.entry_type, method.name());
    assembly
        .invoke(&instance, &method)
        .map_err(InvokeError::UncaughtRuntimeFailure)
}
