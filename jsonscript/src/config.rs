///
/// # Compiler Settings
///
/// Each descriptor directory carries a `compilerSettings.json` (or
/// `compilerSettings.toml`) next to the descriptor files:
///
/// ```json
/// {
///   "EntryMethod": "Main",
///   "EntryNamespace": "ExampleProject.Program",
///   "AssemblyName": "ExampleAssembly",
///   "SilentCompilation": false,
///   "VisualizeOnError": true,
///   "TolerateOrphans": false
/// }
/// ```
///
/// Settings are read into `RawSettings`, where every field is optional, then
/// merged with command-line overrides and validated into `CompilerConfig`.
/// A `CompilerConfig` is immutable for the rest of the run.
///

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SETTINGS_JSON: &str = "compilerSettings.json";
pub const SETTINGS_TOML: &str = "compilerSettings.toml";
pub const DEFAULT_ASSEMBLY_NAME: &str = "JsonScriptAssembly";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No compiler settings found in {dir}; expected compilerSettings.json or compilerSettings.toml")]
    Missing { dir: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("A valid entry namespace must be specified (EntryNamespace)")]
    MissingEntryNamespace,

    #[error("A valid entry method must be specified (EntryMethod)")]
    MissingEntryMethod,

    #[error("Invalid entry namespace '{value}': {reason}")]
    InvalidEntryNamespace { value: String, reason: String },

    #[error("Invalid entry method '{value}': must be a bare method name")]
    InvalidEntryMethod { value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub silent_compilation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualize_on_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerate_orphans: Option<bool>,
}

impl RawSettings {
    /// Fields set in `overrides` win over fields set in `self`.
    pub fn merge(self, overrides: RawSettings) -> RawSettings {
        RawSettings {
            entry_method: overrides.entry_method.or(self.entry_method),
            entry_namespace: overrides.entry_namespace.or(self.entry_namespace),
            assembly_name: overrides.assembly_name.or(self.assembly_name),
            silent_compilation: overrides.silent_compilation.or(self.silent_compilation),
            visualize_on_error: overrides.visualize_on_error.or(self.visualize_on_error),
            tolerate_orphans: overrides.tolerate_orphans.or(self.tolerate_orphans),
        }
    }

    pub fn validate(self) -> Result<CompilerConfig, ConfigError> {
        let entry_type = self
            .entry_namespace
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingEntryNamespace)?;
        let entry_method = self
            .entry_method
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingEntryMethod)?;

        let segments: Vec<&str> = entry_type.split('.').collect();
        if segments.len() < 2 {
            return Err(ConfigError::InvalidEntryNamespace {
                value: entry_type,
                reason: "expected the form Namespace.Type".to_string(),
            });
        }
        if let Some(bad) = segments.iter().find(|s| !is_identifier(s)) {
            let reason = if bad.is_empty() {
                "empty name segment".to_string()
            } else {
                format!("'{}' is not a valid name", bad)
            };
            return Err(ConfigError::InvalidEntryNamespace {
                value: entry_type,
                reason,
            });
        }

        if !is_identifier(&entry_method) {
            return Err(ConfigError::InvalidEntryMethod { value: entry_method });
        }

        Ok(CompilerConfig {
            entry_type,
            entry_method,
            assembly_name: self
                .assembly_name
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ASSEMBLY_NAME.to_string()),
            silent: self.silent_compilation.unwrap_or(false),
            visualize_on_error: self.visualize_on_error.unwrap_or(false),
            tolerate_orphans: self.tolerate_orphans.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Fully qualified entry type, `Namespace.Type`.
    pub entry_type: String,
    pub entry_method: String,
    pub assembly_name: String,
    pub silent: bool,
    pub visualize_on_error: bool,
    pub tolerate_orphans: bool,
}

impl CompilerConfig {
    pub fn new(entry_type: impl Into<String>, entry_method: impl Into<String>) -> Self {
        Self {
            entry_type: entry_type.into(),
            entry_method: entry_method.into(),
            assembly_name: DEFAULT_ASSEMBLY_NAME.to_string(),
            silent: false,
            visualize_on_error: false,
            tolerate_orphans: false,
        }
    }

    /// Loads the settings file in `dir` (if any), applies `overrides` and
    /// validates the result.
    pub fn load(dir: &Path, overrides: RawSettings) -> Result<Self, ConfigError> {
        let settings = match read_settings(dir)? {
            Some(file) => file.merge(overrides),
            None if overrides.entry_namespace.is_some() || overrides.entry_method.is_some() => overrides,
            None => {
                return Err(ConfigError::Missing {
                    dir: dir.to_path_buf(),
                })
            }
        };
        settings.validate()
    }
}

/// Reads `compilerSettings.json`, falling back to `compilerSettings.toml`.
pub fn read_settings(dir: &Path) -> Result<Option<RawSettings>, ConfigError> {
    let json_path = dir.join(SETTINGS_JSON);
    if json_path.is_file() {
        let text = read(&json_path)?;
        let settings = serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: json_path,
            reason: e.to_string(),
        })?;
        return Ok(Some(settings));
    }

    let toml_path = dir.join(SETTINGS_TOML);
    if toml_path.is_file() {
        let text = read(&toml_path)?;
        let settings = toml::from_str(&text).map_err(|e| ConfigError::Parse {
            path: toml_path,
            reason: e.to_string(),
        })?;
        return Ok(Some(settings));
    }

    Ok(None)
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}

pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}
