///
/// # Descriptor Records
///
/// A program is described by three kinds of flat records, one per file:
///
/// - **MethodDescriptor**: one method, owned by `Namespace.Class`
/// - **ClassDescriptor**: one class, owned by a namespace
/// - **NamespaceDescriptor**: one namespace
///
/// Records reference their owner purely by name. Nothing here checks that an
/// owner exists; that is the resolver's job.
///
/// ## Example method file
///
/// ```json
/// {
///   "Name": "ExampleMethod",
///   "Namespace": "ExampleProject.Program",
///   "AccessModifier": "private",
///   "IsStatic": true,
///   "ReturnType": "System.Int32",
///   "ParameterTypes": ["System.String"],
///   "ParameterNames": ["exParam"],
///   "ParameterDefaultValues": ["\"test\""],
///   "Code": "Console.WriteLine(exParam);\nreturn 3"
/// }
/// ```
///

pub mod store;

pub use store::{DescriptorError, DescriptorStore};

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum AccessModifier {
    Public,
    Private,
    Protected,
    Internal,
    #[default]
    None,
}

impl AccessModifier {
    pub const ALL: [AccessModifier; 5] = [
        AccessModifier::Public,
        AccessModifier::Private,
        AccessModifier::Protected,
        AccessModifier::Internal,
        AccessModifier::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessModifier::Public => "public",
            AccessModifier::Private => "private",
            AccessModifier::Protected => "protected",
            AccessModifier::Internal => "internal",
            AccessModifier::None => "none",
        }
    }
}

impl TryFrom<String> for AccessModifier {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let lowered = value.to_ascii_lowercase();
        AccessModifier::ALL
            .into_iter()
            .find(|m| m.as_str() == lowered)
            .ok_or_else(|| {
                format!(
                    "invalid access modifier '{}', expected one of public, private, protected, internal, none",
                    value
                )
            })
    }
}

impl From<AccessModifier> for String {
    fn from(value: AccessModifier) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for AccessModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_return_type() -> String {
    "System.Void".to_string()
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MethodDescriptor {
    pub name: String,
    /// Owner key in the form `Namespace.Class`.
    pub namespace: String,
    #[serde(default)]
    pub access_modifier: AccessModifier,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default = "default_return_type")]
    pub return_type: String,
    #[serde(default)]
    pub parameter_types: Vec<String>,
    #[serde(default)]
    pub parameter_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_default_values: Vec<Option<String>>,
    #[serde(default)]
    pub code: String,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: owner.into(),
            access_modifier: AccessModifier::None,
            is_static: false,
            return_type: default_return_type(),
            parameter_types: Vec::new(),
            parameter_names: Vec::new(),
            parameter_default_values: Vec::new(),
            code: String::new(),
        }
    }

    pub fn returns(mut self, ty: impl Into<String>) -> Self {
        self.return_type = ty.into();
        self
    }

    pub fn access(mut self, access: AccessModifier) -> Self {
        self.access_modifier = access;
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn param(mut self, ty: impl Into<String>, name: impl Into<String>) -> Self {
        self.parameter_types.push(ty.into());
        self.parameter_names.push(name.into());
        if !self.parameter_default_values.is_empty() {
            self.parameter_default_values.push(None);
        }
        self
    }

    pub fn param_with_default(
        mut self,
        ty: impl Into<String>,
        name: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        if self.parameter_default_values.is_empty() {
            self.parameter_default_values = vec![None; self.parameter_names.len()];
        }
        self.parameter_types.push(ty.into());
        self.parameter_names.push(name.into());
        self.parameter_default_values.push(Some(default.into()));
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn owner_key(&self) -> &str {
        &self.namespace
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClassDescriptor {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub access_modifier: AccessModifier,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub implements: Vec<String>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            access_modifier: AccessModifier::None,
            is_static: false,
            implements: Vec::new(),
        }
    }

    pub fn access(mut self, access: AccessModifier) -> Self {
        self.access_modifier = access;
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn implements<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.implements.extend(modules.into_iter().map(Into::into));
        self
    }

    /// Lookup key methods use to name this class: `Namespace.Class`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NamespaceDescriptor {
    pub namespace: String,
    #[serde(default)]
    pub implements: Vec<String>,
}

impl NamespaceDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: name.into(),
            implements: Vec::new(),
        }
    }

    pub fn implements<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.implements.extend(modules.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.namespace
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    Method,
    Class,
    Namespace,
}

impl DescriptorKind {
    /// Classifies a descriptor file by a case-insensitive substring of its
    /// name. "method" is checked before "class", then "namespace".
    pub fn classify(file_name: &str) -> Option<Self> {
        let lowered = file_name.to_lowercase();
        if lowered.contains("method") {
            Some(DescriptorKind::Method)
        } else if lowered.contains("class") {
            Some(DescriptorKind::Class)
        } else if lowered.contains("namespace") {
            Some(DescriptorKind::Namespace)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptorKind::Method => "method",
            DescriptorKind::Class => "class",
            DescriptorKind::Namespace => "namespace",
        }
    }
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
