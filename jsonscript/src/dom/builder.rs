///
/// Compile Unit Builder
///
/// Converts a resolved ProgramTree into a CompileUnit:
///
/// - Each namespace's own references, followed by the references of each of
///   its classes, become the namespace's import directives (de-duplicated,
///   first-seen order)
/// - Access and static modifiers map one-to-one
/// - Parameters are emitted positionally, zipping types, names and defaults
/// - Bodies are copied verbatim and never inspected
///
/// Signatures are validated while building. Every method with a malformed
/// parameter list is collected so one run reports all of them.
///

use std::fmt;

use indexmap::IndexSet;
use thiserror::Error;

use crate::descriptor::MethodDescriptor;
use crate::resolver::ProgramTree;

use super::{CompileUnit, MethodDecl, NamespaceDecl, ParamDecl, TypeDecl, Visibility};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureProblem {
    LengthMismatch {
        types: usize,
        names: usize,
        defaults: usize,
    },
    RequiredAfterDefault {
        param: String,
        defaulted: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureConflict {
    /// Qualified method name, `Namespace.Class.Method`.
    pub method: String,
    pub problem: SignatureProblem,
}

impl fmt::Display for SignatureConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            SignatureProblem::LengthMismatch { types, names, defaults } => write!(
                f,
                "{}: parameter lists differ in length ({} types, {} names, {} defaults)",
                self.method, types, names, defaults
            ),
            SignatureProblem::RequiredAfterDefault { param, defaulted } => write!(
                f,
                "{}: parameter '{}' has no default but follows defaulted parameter '{}'",
                self.method, param, defaulted
            ),
        }
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Signature conflict: {}", format_conflicts(.0))]
    SignatureConflicts(Vec<SignatureConflict>),
}

fn format_conflicts(conflicts: &[SignatureConflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub fn build(tree: &ProgramTree<'_>) -> Result<CompileUnit, BuildError> {
    let mut conflicts = Vec::new();
    let mut namespaces = Vec::with_capacity(tree.namespaces.len());

    for ns in tree.namespaces.values() {
        let mut imports: IndexSet<String> = ns.descriptor.implements.iter().cloned().collect();
        let mut types = Vec::with_capacity(ns.classes.len());

        for class in ns.classes.values() {
            imports.extend(class.descriptor.implements.iter().cloned());

            let mut methods = Vec::with_capacity(class.methods.len());
            for method in &class.methods {
                match build_method(method) {
                    Ok(decl) => methods.push(decl),
                    Err(problem) => conflicts.push(SignatureConflict {
                        method: method.qualified_name(),
                        problem,
                    }),
                }
            }

            types.push(TypeDecl {
                name: class.descriptor.name.clone(),
                visibility: Visibility::from(class.descriptor.access_modifier),
                is_static: class.descriptor.is_static,
                methods,
            });
        }

        namespaces.push(NamespaceDecl {
            name: ns.descriptor.name().to_string(),
            imports: imports.into_iter().collect(),
            types,
        });
    }

    if !conflicts.is_empty() {
        return Err(BuildError::SignatureConflicts(conflicts));
    }

    Ok(CompileUnit { namespaces })
}

fn build_method(method: &MethodDescriptor) -> Result<MethodDecl, SignatureProblem> {
    Ok(MethodDecl {
        name: method.name.clone(),
        visibility: Visibility::from(method.access_modifier),
        is_static: method.is_static,
        return_type: method.return_type.clone(),
        params: build_params(method)?,
        body: method.code.clone(),
    })
}

fn build_params(method: &MethodDescriptor) -> Result<Vec<ParamDecl>, SignatureProblem> {
    let types = &method.parameter_types;
    let names = &method.parameter_names;
    let defaults = &method.parameter_default_values;

    // An absent default list means no parameter has a default.
    if types.len() != names.len() || (!defaults.is_empty() && defaults.len() != names.len()) {
        return Err(SignatureProblem::LengthMismatch {
            types: types.len(),
            names: names.len(),
            defaults: defaults.len(),
        });
    }

    let mut params = Vec::with_capacity(names.len());
    let mut last_defaulted: Option<&str> = None;
    for (i, (ty, name)) in types.iter().zip(names).enumerate() {
        let default = defaults.get(i).cloned().flatten();
        match (&default, last_defaulted) {
            (None, Some(defaulted)) => {
                return Err(SignatureProblem::RequiredAfterDefault {
                    param: name.clone(),
                    defaulted: defaulted.to_string(),
                });
            }
            (Some(_), _) => last_defaulted = Some(name.as_str()),
            (None, None) => {}
        }
        params.push(ParamDecl {
            ty: ty.clone(),
            name: name.clone(),
            default,
        });
    }

    Ok(params)
}
