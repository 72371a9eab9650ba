//! Repository backed by a local or mounted directory of package files

use crate::core::path::sanitize_component;
use crate::core::{ImageError, ImageResult};
use crate::di::traits::RepositoryClient;
use crate::package::definition::PACKAGE_EXTENSION;
use crate::package::PackageDef;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Client for a directory holding `<name>.<version>[.<arch>][.<os>].pkg` files
pub struct DirectoryRepository {
    url: String,
    root: PathBuf,
}

impl DirectoryRepository {
    /// Create a client for a `file://` URL or a plain directory path
    pub fn new(url: &str) -> Self {
        let root = url
            .strip_prefix("file://")
            .or_else(|| url.strip_prefix("FILE://"))
            .unwrap_or(url);
        Self {
            url: url.to_string(),
            root: PathBuf::from(root),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the package file, preferring the platform-qualified name
    pub fn locate(&self, package: &PackageDef) -> Option<PathBuf> {
        let candidates = [
            package.identity().file_name(),
            format!(
                "{}.{}.{}",
                sanitize_component(&package.name),
                sanitize_component(&package.version.to_string()),
                PACKAGE_EXTENSION
            ),
        ];
        candidates
            .iter()
            .map(|name| self.root.join(name))
            .find(|path| path.is_file())
    }
}

#[async_trait]
impl RepositoryClient for DirectoryRepository {
    fn url(&self) -> &str {
        &self.url
    }

    async fn download(
        &self,
        package: &PackageDef,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> ImageResult<()> {
        let source = self.locate(package).ok_or_else(|| {
            ImageError::Repository(format!(
                "{} not found in {}",
                package.identity(),
                self.root.display()
            ))
        })?;

        info!("Copying {} from {}", package.identity(), self.url);
        tokio::select! {
            copied = tokio::fs::copy(&source, destination) => {
                copied?;
                Ok(())
            }
            _ = cancel.cancelled() => Err(ImageError::cancelled()),
        }
    }
}
