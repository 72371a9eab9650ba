//! Package definitions as they appear in image files and installations

use crate::core::path::sanitize_component;
use crate::core::{ImageError, ImageResult};
use crate::core::Version;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Architecture used when a package definition does not name one
pub const DEFAULT_ARCHITECTURE: &str = "AnyCPU";

/// File extension of package files in the cache and in directory repositories
pub const PACKAGE_EXTENSION: &str = "pkg";

/// Identity of a package variant: (name, version, architecture, OS)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentity {
    pub name: String,
    pub version: Version,
    pub architecture: String,
    pub os: String,
}

impl PackageIdentity {
    /// File name of this package in directory repositories
    ///
    /// Format: `<name>.<version>[.<architecture>][.<os>].pkg`
    pub fn file_name(&self) -> String {
        let mut parts = vec![
            sanitize_component(&self.name),
            sanitize_component(&self.version.to_string()),
        ];
        if !self.architecture.is_empty() {
            parts.push(sanitize_component(&self.architecture));
        }
        if !self.os.is_empty() {
            parts.push(sanitize_component(&self.os));
        }
        format!("{}.{}", parts.join("."), PACKAGE_EXTENSION)
    }

    /// Hex SHA-256 over the length-prefixed identity components.
    ///
    /// Distinct identities always get distinct keys, unlike `file_name`,
    /// which sanitizes components and drops empty ones.
    pub fn key(&self) -> String {
        let version = self.version.to_string();
        let mut hasher = Sha256::new();
        for component in [
            self.name.as_str(),
            version.as_str(),
            self.architecture.as_str(),
            self.os.as_str(),
        ] {
            hasher.update((component.len() as u64).to_le_bytes());
            hasher.update(component.as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// File stem used for this package in the cache and in installations:
    /// `<name>.<version>.<key>`, readable and unique per identity
    pub fn storage_stem(&self) -> String {
        format!(
            "{}.{}.{}",
            sanitize_component(&self.name),
            sanitize_component(&self.version.to_string()),
            self.key()
        )
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} version {}", self.name, self.version)?;
        match (self.architecture.is_empty(), self.os.is_empty()) {
            (true, true) => Ok(()),
            (false, true) => write!(f, " ({})", self.architecture),
            (true, false) => write!(f, " ({})", self.os),
            (false, false) => write!(f, " ({}-{})", self.architecture, self.os),
        }
    }
}

/// Package class. System-wide packages are never removed during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PackageClass {
    #[default]
    Package,
    SystemWide,
    Other(String),
}

impl PackageClass {
    pub fn is_system_wide(&self) -> bool {
        matches!(self, PackageClass::SystemWide)
    }
}

impl From<String> for PackageClass {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "" | "package" => PackageClass::Package,
            "system-wide" => PackageClass::SystemWide,
            _ => PackageClass::Other(value),
        }
    }
}

impl From<PackageClass> for String {
    fn from(class: PackageClass) -> Self {
        match class {
            PackageClass::Package => "package".to_string(),
            PackageClass::SystemWide => "system-wide".to_string(),
            PackageClass::Other(value) => value,
        }
    }
}

impl Serialize for PackageClass {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&String::from(self.clone()))
    }
}

impl<'de> Deserialize<'de> for PackageClass {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(PackageClass::from(String::deserialize(deserializer)?))
    }
}

/// Where a package file can be obtained from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PackageSource {
    /// A package file on the local filesystem
    File { path: PathBuf },
    /// A package published in a remote (or directory) repository
    Repository { url: String },
    /// A package already installed; `definition_path` is its installed definition file
    Installed { definition_path: PathBuf },
}

/// A payload file listed in a package definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageFile {
    pub path: String,
    /// Stored content digest of the file, if the package recorded one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// Definition of one package: identity, dependencies and source location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageDef {
    pub name: String,
    pub version: Version,
    #[serde(default = "default_architecture")]
    pub architecture: String,
    #[serde(default)]
    pub os: String,
    /// Precomputed content hash of the package
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    /// Names of the packages this package depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PackageSource>,
    #[serde(default)]
    pub class: PackageClass,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<PackageFile>,
}

fn default_architecture() -> String {
    DEFAULT_ARCHITECTURE.to_string()
}

impl PackageDef {
    /// Create a package with no dependencies, no source and the default platform
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            architecture: default_architecture(),
            os: String::new(),
            hash: None,
            dependencies: Vec::new(),
            source: None,
            class: PackageClass::default(),
            files: Vec::new(),
        }
    }

    pub fn with_platform(mut self, architecture: impl Into<String>, os: impl Into<String>) -> Self {
        self.architecture = architecture.into();
        self.os = os.into();
        self
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    /// Add a dependency by name. Dependencies form an ordered set.
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.dependencies.contains(&name) {
            self.dependencies.push(name);
        }
        self
    }

    pub fn with_source(mut self, source: PackageSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_class(mut self, class: PackageClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_file(mut self, path: impl Into<String>, hash: Option<String>) -> Self {
        self.files.push(PackageFile {
            path: path.into(),
            hash,
        });
        self
    }

    pub fn identity(&self) -> PackageIdentity {
        PackageIdentity {
            name: self.name.clone(),
            version: self.version.clone(),
            architecture: self.architecture.clone(),
            os: self.os.clone(),
        }
    }

    /// Check whether this package declares a dependency on `name`
    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|d| d == name)
    }

    /// Path of the installed definition file, for packages reported by an installation
    pub fn installed_definition_path(&self) -> Option<&Path> {
        match &self.source {
            Some(PackageSource::Installed { definition_path }) => Some(definition_path),
            _ => None,
        }
    }

    /// Load a package definition from a YAML file
    pub fn load(path: &Path) -> ImageResult<Self> {
        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| {
            ImageError::Config(format!(
                "Invalid package definition {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Save the package definition as YAML
    pub fn save(&self, path: &Path) -> ImageResult<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
