//! Trait definitions for dependency injection

use crate::core::ImageResult;
use crate::installer::InstallerReport;
use crate::package::PackageDef;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Trait for configuration access
///
/// Provides read-only access to application configuration.
/// Implementations should be thread-safe (Send + Sync).
pub trait ConfigProvider: Send + Sync {
    /// Get the package cache directory path
    fn cache_dir(&self) -> ImageResult<PathBuf>;

    /// Get the installer executable (name on PATH or path)
    fn installer_command(&self) -> &str;

    /// Get extra arguments passed to every installer invocation
    fn installer_args(&self) -> &[String];

    /// Get the maximum number of package downloads in flight
    fn max_concurrent_downloads(&self) -> usize;

    /// Get repositories tried after the image's own repositories
    fn fallback_repositories(&self) -> &[String];

    /// Get the timeout for a single repository request
    fn request_timeout(&self) -> Duration;
}

/// Trait for reading the packages installed in a target directory
pub trait InstallationQuery: Send + Sync {
    /// List installed packages. Every package carries an `Installed` source
    /// pointing at its definition file.
    fn installed_packages(&self, target: &Path) -> ImageResult<Vec<PackageDef>>;
}

/// Trait for the external package installer
///
/// Both operations receive their paths in execution order and report every
/// error they encounter instead of stopping at the first.
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Install package files into `target`
    async fn install(
        &self,
        target: &Path,
        package_paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> InstallerReport;

    /// Uninstall packages from `target`, given their installed definition files
    async fn uninstall(
        &self,
        target: &Path,
        definition_paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> InstallerReport;
}

/// Trait for a package repository client
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Location of the repository
    fn url(&self) -> &str;

    /// Download a package to `destination`.
    ///
    /// Must stop promptly and return `Cancelled` once `cancel` fires. The
    /// destination may be left partially written; callers own its cleanup.
    async fn download(
        &self,
        package: &PackageDef,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> ImageResult<()>;
}

/// Trait for selecting a repository client by URL
pub trait RepositoryProvider: Send + Sync {
    fn client_for(&self, url: &str) -> ImageResult<Arc<dyn RepositoryClient>>;
}
