///
/// # Descriptor Store
///
/// Loads every descriptor file in a directory into three flat collections.
/// Only the immediate children of the directory are scanned, in file name
/// order, so the same directory always yields the same store.
///
/// Files are classified by name (see `DescriptorKind::classify`) and parsed
/// by extension: `.toml` files with `toml`, everything else as JSON.
/// Unclassified files such as `compilerSettings.json` are skipped.
///

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use super::{ClassDescriptor, DescriptorKind, MethodDescriptor, NamespaceDescriptor};

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Descriptor directory not found at {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to scan {path}: {reason}")]
    Scan { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {kind} descriptor {path}: {reason}")]
    Parse {
        path: PathBuf,
        kind: DescriptorKind,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Toml,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => FileFormat::Toml,
            _ => FileFormat::Json,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorStore {
    pub methods: Vec<MethodDescriptor>,
    pub classes: Vec<ClassDescriptor>,
    pub namespaces: Vec<NamespaceDescriptor>,
}

impl DescriptorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_dir(root: &Path) -> Result<Self, DescriptorError> {
        if !root.is_dir() {
            return Err(DescriptorError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut store = Self::new();
        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| DescriptorError::Scan {
                path: root.to_path_buf(),
                reason: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            store.load_file(entry.path())?;
        }

        Ok(store)
    }

    /// Loads one file into the store. Returns the kind it was classified as,
    /// or `None` when the file name matches no descriptor kind.
    pub fn load_file(&mut self, path: &Path) -> Result<Option<DescriptorKind>, DescriptorError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let Some(kind) = DescriptorKind::classify(&file_name) else {
            debug!(file = %path.display(), "skipping unclassified file");
            return Ok(None);
        };

        let text = std::fs::read_to_string(path).map_err(|source| DescriptorError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        self.insert_text(kind, FileFormat::from_path(path), &text)
            .map_err(|reason| DescriptorError::Parse {
                path: path.to_path_buf(),
                kind,
                reason,
            })?;

        debug!(file = %path.display(), %kind, "loaded descriptor");
        Ok(Some(kind))
    }

    pub fn insert_text(&mut self, kind: DescriptorKind, format: FileFormat, text: &str) -> Result<(), String> {
        match kind {
            DescriptorKind::Method => self.methods.push(decode(format, text)?),
            DescriptorKind::Class => self.classes.push(decode(format, text)?),
            DescriptorKind::Namespace => self.namespaces.push(decode(format, text)?),
        }
        Ok(())
    }

    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_class(mut self, class: ClassDescriptor) -> Self {
        self.classes.push(class);
        self
    }

    pub fn with_namespace(mut self, namespace: NamespaceDescriptor) -> Self {
        self.namespaces.push(namespace);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.classes.is_empty() && self.namespaces.is_empty()
    }

    /// Progress lines in the form "Found 2 methods."
    pub fn summary(&self) -> [String; 3] {
        [
            found_line(self.classes.len(), "class", "classes"),
            found_line(self.methods.len(), "method", "methods"),
            found_line(self.namespaces.len(), "namespace", "namespaces"),
        ]
    }
}

fn decode<T: serde::de::DeserializeOwned>(format: FileFormat, text: &str) -> Result<T, String> {
    match format {
        FileFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        FileFormat::Toml => toml::from_str(text).map_err(|e| e.to_string()),
    }
}

fn found_line(count: usize, singular: &str, plural: &str) -> String {
    format!("Found {} {}.", count, if count == 1 { singular } else { plural })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_load_dir_classifies_and_orders_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        write(dir, "Method-B.json", r#"{ "Name": "B", "Namespace": "Acme.Widget" }"#);
        write(dir, "Method-A.json", r#"{ "Name": "A", "Namespace": "Acme.Widget" }"#);
        write(dir, "Class-Widget.json", r#"{ "Name": "Widget", "Namespace": "Acme" }"#);
        write(dir, "Namespace-Acme.json", r#"{ "Namespace": "Acme", "Implements": ["System"] }"#);
        write(dir, "compilerSettings.json", r#"{ "EntryMethod": "Run" }"#);
        write(dir, "README.txt", "not a descriptor");

        let store = DescriptorStore::load_dir(dir).unwrap();

        let names: Vec<_> = store.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(store.classes.len(), 1);
        assert_eq!(store.namespaces.len(), 1);
        assert_eq!(store.namespaces[0].implements, vec!["System"]);
    }

    #[test]
    fn test_load_dir_skips_subdirectories() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("Compiler");
        fs::create_dir_all(&nested).unwrap();
        write(&nested, "Method-Hidden.json", r#"{ "Name": "Hidden", "Namespace": "A.B" }"#);

        let store = DescriptorStore::load_dir(temp.path()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_toml_descriptor() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "class-widget.toml",
            "Name = \"Widget\"\nNamespace = \"Acme\"\nIsStatic = true\nImplements = [\"System\"]\n",
        );

        let store = DescriptorStore::load_dir(temp.path()).unwrap();
        assert_eq!(store.classes[0].full_name(), "Acme.Widget");
        assert!(store.classes[0].is_static);
    }

    #[test]
    fn test_malformed_file_names_the_path() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Method-Broken.json", "{ not json");

        let err = DescriptorStore::load_dir(temp.path()).unwrap_err();
        match &err {
            DescriptorError::Parse { path, kind, .. } => {
                assert!(path.ends_with("Method-Broken.json"));
                assert_eq!(*kind, DescriptorKind::Method);
            }
            other => panic!("Expected Parse error, got {:?}", other),
        }
        assert!(err.to_string().contains("method descriptor"));
    }

    #[test]
    fn test_invalid_access_modifier_is_a_parse_error() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "Class-Bad.json",
            r#"{ "Name": "Bad", "Namespace": "Acme", "AccessModifier": "friend" }"#,
        );

        let err = DescriptorStore::load_dir(temp.path()).unwrap_err();
        assert!(err.to_string().contains("invalid access modifier"));
    }

    #[test]
    fn test_missing_directory() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let err = DescriptorStore::load_dir(&missing).unwrap_err();
        assert!(matches!(err, DescriptorError::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_summary_pluralization() {
        let store = DescriptorStore::new()
            .with_class(ClassDescriptor::new("Widget", "Acme"))
            .with_method(MethodDescriptor::new("A", "Acme.Widget"))
            .with_method(MethodDescriptor::new("B", "Acme.Widget"));

        let [classes, methods, namespaces] = store.summary();
        assert_eq!(classes, "Found 1 class.");
        assert_eq!(methods, "Found 2 methods.");
        assert_eq!(namespaces, "Found 0 namespaces.");
    }
}
