///
/// # Descriptor Resolution
///
/// Reconstructs the nested program from flat descriptor records:
///
/// - **Methods -> classes**: a method's `Namespace` field is an owner key
///   `Namespace.Class`, matched exactly against each class's full name
/// - **Classes -> namespaces**: a class's `Namespace` field is matched exactly
///   against each namespace record's name
///
/// ## Algorithm
///
/// 1. Index namespace records by name and class records by full name. A key
///    seen twice is a configuration conflict; all conflicts are reported
///    together and nothing is resolved
/// 2. Attach each method to the class its owner key names, or record it as an
///    orphan
/// 3. Attach each class (with its methods) to its namespace, or record it as an
///    orphan
///
/// Encounter order is preserved at every level, so identical input always
/// yields an identical tree. Orphans never abort resolution; the caller
/// decides what to do with them.
///

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use crate::descriptor::{ClassDescriptor, DescriptorStore, MethodDescriptor, NamespaceDescriptor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    DuplicateNamespace { name: String, count: usize },
    DuplicateClass { full_name: String, count: usize },
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conflict::DuplicateNamespace { name, count } => {
                write!(f, "namespace '{}' is declared {} times", name, count)
            }
            Conflict::DuplicateClass { full_name, count } => {
                write!(f, "class '{}' is declared {} times", full_name, count)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Configuration conflict: {}", format_conflicts(.0))]
    Conflicts(Vec<Conflict>),
}

fn format_conflicts(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Orphan<'d> {
    /// The owner key names no loaded class.
    Method(&'d MethodDescriptor),
    /// The namespace names no loaded namespace. `methods` counts the methods
    /// that resolved to this class and are dropped along with it.
    Class {
        class: &'d ClassDescriptor,
        methods: usize,
    },
}

impl fmt::Display for Orphan<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orphan::Method(m) => write!(
                f,
                "method '{}' names class '{}', which does not exist",
                m.name,
                m.owner_key()
            ),
            Orphan::Class { class, methods } => {
                write!(
                    f,
                    "class '{}' names namespace '{}', which does not exist",
                    class.name, class.namespace
                )?;
                if *methods > 0 {
                    write!(f, " ({} method{} dropped)", methods, if *methods == 1 { "" } else { "s" })?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassNode<'d> {
    pub descriptor: &'d ClassDescriptor,
    pub methods: Vec<&'d MethodDescriptor>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceNode<'d> {
    pub descriptor: &'d NamespaceDescriptor,
    pub classes: IndexMap<&'d str, ClassNode<'d>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgramTree<'d> {
    pub namespaces: IndexMap<&'d str, NamespaceNode<'d>>,
}

impl<'d> ProgramTree<'d> {
    pub fn class_count(&self) -> usize {
        self.namespaces.values().map(|ns| ns.classes.len()).sum()
    }

    pub fn method_count(&self) -> usize {
        self.classes().map(|c| c.methods.len()).sum()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassNode<'d>> {
        self.namespaces.values().flat_map(|ns| ns.classes.values())
    }

    pub fn find_class(&self, namespace: &str, class: &str) -> Option<&ClassNode<'d>> {
        self.namespaces.get(namespace)?.classes.get(class)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<'d> {
    pub tree: ProgramTree<'d>,
    pub orphans: Vec<Orphan<'d>>,
}

impl Resolution<'_> {
    pub fn orphaned_methods(&self) -> usize {
        self.orphans.iter().filter(|o| matches!(o, Orphan::Method(_))).count()
    }

    pub fn orphaned_classes(&self) -> usize {
        self.orphans.iter().filter(|o| matches!(o, Orphan::Class { .. })).count()
    }
}

pub fn resolve(store: &DescriptorStore) -> Result<Resolution<'_>, ResolveError> {
    let mut conflicts = Vec::new();

    let mut namespace_counts: IndexMap<&str, usize> = IndexMap::new();
    for ns in &store.namespaces {
        *namespace_counts.entry(ns.name()).or_default() += 1;
    }
    conflicts.extend(
        namespace_counts
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(name, count)| Conflict::DuplicateNamespace {
                name: name.to_string(),
                count: *count,
            }),
    );

    let mut class_index: IndexMap<String, Vec<usize>> = IndexMap::new();
    for (i, class) in store.classes.iter().enumerate() {
        class_index.entry(class.full_name()).or_default().push(i);
    }
    conflicts.extend(
        class_index
            .iter()
            .filter(|(_, indices)| indices.len() > 1)
            .map(|(full_name, indices)| Conflict::DuplicateClass {
                full_name: full_name.clone(),
                count: indices.len(),
            }),
    );

    if !conflicts.is_empty() {
        return Err(ResolveError::Conflicts(conflicts));
    }

    let mut orphans = Vec::new();

    let mut methods_by_class: Vec<Vec<&MethodDescriptor>> = vec![Vec::new(); store.classes.len()];
    for method in &store.methods {
        match class_index.get(method.owner_key()) {
            Some(indices) => methods_by_class[indices[0]].push(method),
            None => orphans.push(Orphan::Method(method)),
        }
    }

    let mut tree = ProgramTree::default();
    for ns in &store.namespaces {
        tree.namespaces.insert(
            ns.name(),
            NamespaceNode {
                descriptor: ns,
                classes: IndexMap::new(),
            },
        );
    }

    for (class, methods) in store.classes.iter().zip(methods_by_class) {
        match tree.namespaces.get_mut(class.namespace.as_str()) {
            Some(ns) => {
                ns.classes.insert(
                    class.name.as_str(),
                    ClassNode {
                        descriptor: class,
                        methods,
                    },
                );
            }
            None => orphans.push(Orphan::Class {
                class,
                methods: methods.len(),
            }),
        }
    }

    Ok(Resolution { tree, orphans })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme_store() -> DescriptorStore {
        DescriptorStore::new()
            .with_namespace(NamespaceDescriptor::new("Acme"))
            .with_class(ClassDescriptor::new("Widget", "Acme"))
            .with_method(MethodDescriptor::new("Run", "Acme.Widget"))
    }

    fn method_names<'a>(tree: &'a ProgramTree<'_>, ns: &str, class: &str) -> Vec<&'a str> {
        tree.find_class(ns, class)
            .unwrap()
            .methods
            .iter()
            .map(|m| m.name.as_str())
            .collect()
    }

    #[test]
    fn test_resolve_single_chain() {
        let store = acme_store();
        let resolution = resolve(&store).unwrap();

        assert!(resolution.orphans.is_empty());
        assert_eq!(resolution.tree.namespaces.len(), 1);
        assert_eq!(resolution.tree.class_count(), 1);
        assert_eq!(method_names(&resolution.tree, "Acme", "Widget"), vec!["Run"]);
    }

    #[test]
    fn test_method_with_unknown_owner_is_orphaned() {
        let store = acme_store().with_method(MethodDescriptor::new("Spin", "Acme.Gadget"));
        let resolution = resolve(&store).unwrap();

        assert_eq!(resolution.orphans.len(), 1);
        assert_eq!(resolution.orphaned_methods(), 1);
        match &resolution.orphans[0] {
            Orphan::Method(m) => assert_eq!(m.name, "Spin"),
            other => panic!("Expected method orphan, got {:?}", other),
        }
        assert_eq!(resolution.tree.method_count(), 1);
        assert!(resolution.orphans[0].to_string().contains("Acme.Gadget"));
    }

    #[test]
    fn test_class_with_unknown_namespace_is_orphaned() {
        let store = acme_store()
            .with_class(ClassDescriptor::new("Lost", "Nowhere"))
            .with_method(MethodDescriptor::new("A", "Nowhere.Lost"))
            .with_method(MethodDescriptor::new("B", "Nowhere.Lost"));
        let resolution = resolve(&store).unwrap();

        assert_eq!(resolution.orphaned_classes(), 1);
        assert_eq!(resolution.orphaned_methods(), 0);
        assert_eq!(
            resolution.orphans[0].to_string(),
            "class 'Lost' names namespace 'Nowhere', which does not exist (2 methods dropped)"
        );
        assert_eq!(resolution.tree.class_count(), 1);
    }

    #[test]
    fn test_owner_key_match_is_exact() {
        let store = acme_store().with_method(MethodDescriptor::new("Case", "acme.widget"));
        let resolution = resolve(&store).unwrap();
        assert_eq!(resolution.orphaned_methods(), 1);
    }

    #[test]
    fn test_method_order_is_preserved() {
        let store = DescriptorStore::new()
            .with_namespace(NamespaceDescriptor::new("Acme"))
            .with_class(ClassDescriptor::new("Widget", "Acme"))
            .with_class(ClassDescriptor::new("Other", "Acme"))
            .with_method(MethodDescriptor::new("M2", "Acme.Widget"))
            .with_method(MethodDescriptor::new("X", "Acme.Other"))
            .with_method(MethodDescriptor::new("M1", "Acme.Widget"))
            .with_method(MethodDescriptor::new("M3", "Acme.Widget"));
        let resolution = resolve(&store).unwrap();

        assert_eq!(method_names(&resolution.tree, "Acme", "Widget"), vec!["M2", "M1", "M3"]);
        let classes: Vec<_> = resolution.tree.namespaces["Acme"].classes.keys().copied().collect();
        assert_eq!(classes, vec!["Widget", "Other"]);
    }

    #[test]
    fn test_each_method_appears_in_exactly_one_class() {
        let store = DescriptorStore::new()
            .with_namespace(NamespaceDescriptor::new("A"))
            .with_namespace(NamespaceDescriptor::new("B"))
            .with_class(ClassDescriptor::new("C", "A"))
            .with_class(ClassDescriptor::new("C", "B"))
            .with_method(MethodDescriptor::new("Run", "A.C"))
            .with_method(MethodDescriptor::new("Run", "B.C"));
        let resolution = resolve(&store).unwrap();

        let total: usize = resolution
            .tree
            .classes()
            .map(|c| c.methods.iter().filter(|m| m.name == "Run").count())
            .sum();
        assert_eq!(total, 2);
        assert_eq!(resolution.tree.find_class("A", "C").unwrap().methods[0].owner_key(), "A.C");
        assert_eq!(resolution.tree.find_class("B", "C").unwrap().methods[0].owner_key(), "B.C");
    }

    #[test]
    fn test_empty_containers_are_valid() {
        let store = DescriptorStore::new()
            .with_namespace(NamespaceDescriptor::new("Empty"))
            .with_namespace(NamespaceDescriptor::new("Acme"))
            .with_class(ClassDescriptor::new("Bare", "Acme"));
        let resolution = resolve(&store).unwrap();

        assert!(resolution.orphans.is_empty());
        assert!(resolution.tree.namespaces["Empty"].classes.is_empty());
        assert!(resolution.tree.find_class("Acme", "Bare").unwrap().methods.is_empty());
    }

    #[test]
    fn test_duplicate_keys_are_conflicts() {
        let store = acme_store()
            .with_namespace(NamespaceDescriptor::new("Acme"))
            .with_class(ClassDescriptor::new("Widget", "Acme"));

        let err = resolve(&store).unwrap_err();
        let ResolveError::Conflicts(conflicts) = &err;
        assert_eq!(
            conflicts,
            &vec![
                Conflict::DuplicateNamespace {
                    name: "Acme".to_string(),
                    count: 2
                },
                Conflict::DuplicateClass {
                    full_name: "Acme.Widget".to_string(),
                    count: 2
                },
            ]
        );
        assert!(err.to_string().contains("namespace 'Acme' is declared 2 times"));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let store = acme_store()
            .with_class(ClassDescriptor::new("Gear", "Acme"))
            .with_method(MethodDescriptor::new("Turn", "Acme.Gear"))
            .with_method(MethodDescriptor::new("Orphan", "Acme.Missing"));

        let first = resolve(&store).unwrap();
        let second = resolve(&store).unwrap();
        assert_eq!(first, second);
    }
}
