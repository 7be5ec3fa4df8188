//!
//! Drivers
//!
//! The two steps that talk to a backend:
//!
//! - compile: submit a compile unit once and collect the outcome
//! - invoke: locate and run the entry point of a compiled assembly
//!

pub mod compile;
pub mod invoke;

pub use compile::{compile, CompileFailure};
pub use invoke::{invoke, InvokeError};
