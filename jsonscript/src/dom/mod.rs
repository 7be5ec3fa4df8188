///
/// Compile Unit Module
///
/// The backend-facing representation of an assembled program. A compile
/// unit is a plain tree of owned declarations:
///
/// - CompileUnit: every namespace in the program
/// - NamespaceDecl: import directives plus the types declared in it
/// - TypeDecl: one class with its modifiers and methods
/// - MethodDecl: signature plus a verbatim body snippet
///
/// Nothing in this tree has been checked by a backend. Method bodies are
/// carried as the exact text found in the descriptor files.
///

pub mod builder;
pub mod render;

pub use builder::{build, BuildError, SignatureConflict, SignatureProblem};
pub use render::render;

use indexmap::IndexSet;

use crate::descriptor::AccessModifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
    Protected,
    Internal,
    /// No modifier was given; the backend applies its own default.
    Default,
}

impl Visibility {
    pub fn keyword(&self) -> Option<&'static str> {
        match self {
            Visibility::Public => Some("public"),
            Visibility::Private => Some("private"),
            Visibility::Protected => Some("protected"),
            Visibility::Internal => Some("internal"),
            Visibility::Default => None,
        }
    }
}

impl From<AccessModifier> for Visibility {
    fn from(access: AccessModifier) -> Self {
        match access {
            AccessModifier::Public => Visibility::Public,
            AccessModifier::Private => Visibility::Private,
            AccessModifier::Protected => Visibility::Protected,
            AccessModifier::Internal => Visibility::Internal,
            AccessModifier::None => Visibility::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub ty: String,
    pub name: String,
    /// Default value as literal source text.
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub return_type: String,
    pub params: Vec<ParamDecl>,
    pub body: String,
}

impl MethodDecl {
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| p.default.is_none()).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDecl {
    pub name: String,
    pub imports: Vec<String>,
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompileUnit {
    pub namespaces: Vec<NamespaceDecl>,
}

impl CompileUnit {
    /// Finds a type by its fully qualified name, `Namespace.Type`. Namespace
    /// names may themselves contain dots, so every split point is tried.
    pub fn find_type(&self, full_name: &str) -> Option<(&NamespaceDecl, &TypeDecl)> {
        full_name.match_indices('.').find_map(|(dot, _)| {
            let (ns_name, type_name) = (&full_name[..dot], &full_name[dot + 1..]);
            let ns = self.namespaces.iter().find(|ns| ns.name == ns_name)?;
            let ty = ns.types.iter().find(|t| t.name == type_name)?;
            Some((ns, ty))
        })
    }

    pub fn method_count(&self) -> usize {
        self.namespaces
            .iter()
            .flat_map(|ns| &ns.types)
            .map(|t| t.methods.len())
            .sum()
    }

    /// Every imported module across the unit, de-duplicated in first-seen
    /// order. This is the reference list handed to the backend.
    pub fn references(&self) -> Vec<String> {
        let set: IndexSet<&str> = self
            .namespaces
            .iter()
            .flat_map(|ns| ns.imports.iter().map(String::as_str))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }
}
