//! Editable image description, loaded from and saved to YAML image files

use crate::core::{ImageError, ImageResult};
use crate::image::ImageIdentifier;
use crate::package::PackageDef;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Mutable counterpart of [`ImageIdentifier`]
///
/// Image file format:
///
/// ```yaml
/// repositories:
///   - https://packages.example.com
/// packages:
///   - name: Core
///     version: "1.0.0"
///     source:
///       type: repository
///       url: https://packages.example.com
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSpecifier {
    #[serde(default)]
    pub packages: Vec<PackageDef>,
    #[serde(default)]
    pub repositories: Vec<String>,
}

impl ImageSpecifier {
    pub fn new(packages: Vec<PackageDef>, repositories: Vec<String>) -> Self {
        Self {
            packages,
            repositories,
        }
    }

    /// Parse an image from YAML text
    pub fn from_yaml(content: &str) -> ImageResult<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| ImageError::Config(format!("Invalid image file: {}", e)))
    }

    /// Load an image file
    ///
    /// Relative file sources are resolved against the image file's directory.
    pub fn load(path: &Path) -> ImageResult<Self> {
        let content = fs::read_to_string(path)?;
        let mut image: Self = serde_yaml::from_str(&content).map_err(|e| {
            ImageError::Config(format!("Invalid image file {}: {}", path.display(), e))
        })?;
        if let Some(base) = path.parent() {
            image.resolve_relative_sources(base);
        }
        Ok(image)
    }

    /// Save as an image file
    pub fn save(&self, path: &Path) -> ImageResult<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Add a package, replacing any package with the same name
    pub fn add_package(&mut self, package: PackageDef) {
        match self.packages.iter_mut().find(|p| p.name == package.name) {
            Some(existing) => *existing = package,
            None => self.packages.push(package),
        }
    }

    /// Remove a package by name. Returns the removed package, if present.
    pub fn remove_package(&mut self, name: &str) -> Option<PackageDef> {
        let index = self.packages.iter().position(|p| p.name == name)?;
        Some(self.packages.remove(index))
    }

    pub fn add_repository(&mut self, url: impl Into<String>) {
        let url = url.into();
        if !self.repositories.contains(&url) {
            self.repositories.push(url);
        }
    }

    /// Build the immutable identifier, recomputing the image id
    pub fn into_identifier(self) -> ImageResult<ImageIdentifier> {
        ImageIdentifier::new(self.packages, self.repositories)
    }

    fn resolve_relative_sources(&mut self, base: &Path) {
        use crate::package::PackageSource;

        for package in &mut self.packages {
            if let Some(PackageSource::File { path }) = &mut package.source {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
    }
}
