//! Mock implementations of service traits for testing

use super::traits::{
    ConfigProvider, InstallationQuery, PackageInstaller, RepositoryClient, RepositoryProvider,
};
use crate::core::path::installed_packages_dir;
use crate::core::{ImageError, ImageResult};
use crate::image::observer::{DeployObserver, DeployState};
use crate::installer::InstallerReport;
use crate::package::{PackageDef, PackageIdentity, PackageSource};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock configuration provider for testing
///
/// # Example
///
/// ```
/// use pkgimage::di::mocks::MockConfigProvider;
/// use pkgimage::di::ConfigProvider;
///
/// let config = MockConfigProvider {
///     max_concurrent_downloads: 1,
///     ..Default::default()
/// };
///
/// assert_eq!(config.max_concurrent_downloads(), 1);
/// ```
#[derive(Clone)]
pub struct MockConfigProvider {
    pub cache_dir: PathBuf,
    pub installer_command: String,
    pub installer_args: Vec<String>,
    pub max_concurrent_downloads: usize,
    pub fallback_repositories: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for MockConfigProvider {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("/tmp/pkgimage-test-cache"),
            installer_command: "pkg-installer".to_string(),
            installer_args: Vec::new(),
            max_concurrent_downloads: 4,
            fallback_repositories: Vec::new(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ConfigProvider for MockConfigProvider {
    fn cache_dir(&self) -> ImageResult<PathBuf> {
        Ok(self.cache_dir.clone())
    }

    fn installer_command(&self) -> &str {
        &self.installer_command
    }

    fn installer_args(&self) -> &[String] {
        &self.installer_args
    }

    fn max_concurrent_downloads(&self) -> usize {
        self.max_concurrent_downloads
    }

    fn fallback_repositories(&self) -> &[String] {
        &self.fallback_repositories
    }

    fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

/// In-memory installation
///
/// Packages added with [`MockInstallationQuery::add_installed`] get an
/// `Installed` source pointing into the queried target, as a real
/// installation would report them.
#[derive(Clone, Default)]
pub struct MockInstallationQuery {
    packages: Arc<Mutex<Vec<PackageDef>>>,
    fail: Arc<Mutex<Option<String>>>,
}

impl MockInstallationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an installed package
    pub fn add_installed(&self, package: PackageDef) {
        lock(&self.packages).push(package);
    }

    /// Make every query fail with `message`
    pub fn fail_with(&self, message: impl Into<String>) {
        *lock(&self.fail) = Some(message.into());
    }
}

impl InstallationQuery for MockInstallationQuery {
    fn installed_packages(&self, target: &Path) -> ImageResult<Vec<PackageDef>> {
        if let Some(message) = lock(&self.fail).clone() {
            return Err(ImageError::Config(message));
        }
        let dir = installed_packages_dir(target);
        Ok(lock(&self.packages)
            .iter()
            .map(|package| {
                let mut package = package.clone();
                if package.source.is_none() {
                    package.source = Some(PackageSource::Installed {
                        definition_path: dir.join(format!("{}.yaml", package.name)),
                    });
                }
                package
            })
            .collect())
    }
}

/// Installer operation recorded by [`MockInstaller`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallerAction {
    Install,
    Uninstall,
}

/// One recorded installer invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerCall {
    pub action: InstallerAction,
    pub target: PathBuf,
    pub paths: Vec<PathBuf>,
}

/// Recording installer
///
/// Succeeds unless a report is configured for the action.
#[derive(Clone, Default)]
pub struct MockInstaller {
    calls: Arc<Mutex<Vec<InstallerCall>>>,
    reports: Arc<Mutex<HashMap<&'static str, InstallerReport>>>,
}

impl MockInstaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `errors` and `exit_code` from every install call
    pub fn fail_install(&self, errors: &[&str], exit_code: i32) {
        self.set_report("install", errors, exit_code);
    }

    /// Report `errors` and `exit_code` from every uninstall call
    pub fn fail_uninstall(&self, errors: &[&str], exit_code: i32) {
        self.set_report("uninstall", errors, exit_code);
    }

    fn set_report(&self, action: &'static str, errors: &[&str], exit_code: i32) {
        lock(&self.reports).insert(
            action,
            InstallerReport {
                exit_code,
                errors: errors.iter().map(|e| e.to_string()).collect(),
                invocation_error: None,
            },
        );
    }

    pub fn calls(&self) -> Vec<InstallerCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Paths passed to every call of `action`, in call order
    pub fn paths_for(&self, action: InstallerAction) -> Vec<PathBuf> {
        lock(&self.calls)
            .iter()
            .filter(|call| call.action == action)
            .flat_map(|call| call.paths.clone())
            .collect()
    }

    fn record(&self, action: InstallerAction, target: &Path, paths: &[PathBuf]) -> InstallerReport {
        lock(&self.calls).push(InstallerCall {
            action,
            target: target.to_path_buf(),
            paths: paths.to_vec(),
        });
        let key = match action {
            InstallerAction::Install => "install",
            InstallerAction::Uninstall => "uninstall",
        };
        lock(&self.reports).get(key).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl PackageInstaller for MockInstaller {
    async fn install(
        &self,
        target: &Path,
        package_paths: &[PathBuf],
        _cancel: &CancellationToken,
    ) -> InstallerReport {
        self.record(InstallerAction::Install, target, package_paths)
    }

    async fn uninstall(
        &self,
        target: &Path,
        definition_paths: &[PathBuf],
        _cancel: &CancellationToken,
    ) -> InstallerReport {
        self.record(InstallerAction::Uninstall, target, definition_paths)
    }
}

#[derive(Default)]
struct RepositoryState {
    packages: Mutex<HashMap<(String, String), Vec<u8>>>,
    failing_urls: Mutex<HashSet<String>>,
    requests: Mutex<Vec<String>>,
    downloads: Mutex<usize>,
}

/// Counting in-memory repository provider
///
/// Every URL serves the same package set, except URLs marked with
/// [`MockRepositoryProvider::fail_url`]. Packages are keyed by name and
/// version string.
#[derive(Clone, Default)]
pub struct MockRepositoryProvider {
    state: Arc<RepositoryState>,
    delay: Option<Duration>,
}

impl MockRepositoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every download, honoring cancellation while waiting
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn add_package(&self, name: &str, version: &str, content: Vec<u8>) {
        lock(&self.state.packages).insert((name.to_string(), version.to_string()), content);
    }

    pub fn fail_url(&self, url: &str) {
        lock(&self.state.failing_urls).insert(url.to_string());
    }

    /// Number of completed downloads
    pub fn download_count(&self) -> usize {
        *lock(&self.state.downloads)
    }

    /// URLs of every download attempt, in order
    pub fn requested_urls(&self) -> Vec<String> {
        lock(&self.state.requests).clone()
    }
}

impl RepositoryProvider for MockRepositoryProvider {
    fn client_for(&self, url: &str) -> ImageResult<Arc<dyn RepositoryClient>> {
        Ok(Arc::new(MockRepositoryClient {
            url: url.to_string(),
            state: Arc::clone(&self.state),
            delay: self.delay,
        }))
    }
}

/// Client handed out by [`MockRepositoryProvider`]
pub struct MockRepositoryClient {
    url: String,
    state: Arc<RepositoryState>,
    delay: Option<Duration>,
}

#[async_trait]
impl RepositoryClient for MockRepositoryClient {
    fn url(&self) -> &str {
        &self.url
    }

    async fn download(
        &self,
        package: &PackageDef,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> ImageResult<()> {
        lock(&self.state.requests).push(self.url.clone());

        if let Some(delay) = self.delay {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = cancel.cancelled() => return Err(ImageError::cancelled()),
            }
        }

        if lock(&self.state.failing_urls).contains(&self.url) {
            return Err(ImageError::Repository(format!("{} is unavailable", self.url)));
        }
        let content = lock(&self.state.packages)
            .get(&(package.name.clone(), package.version.to_string()))
            .cloned()
            .ok_or_else(|| {
                ImageError::Repository(format!("{} not found in {}", package.name, self.url))
            })?;

        tokio::fs::write(destination, content).await?;
        *lock(&self.state.downloads) += 1;
        Ok(())
    }
}

/// Observer recording every notification
#[derive(Default)]
pub struct RecordingObserver {
    states: Mutex<Vec<DeployState>>,
    messages: Mutex<Vec<String>>,
    resolved: Mutex<Vec<PackageIdentity>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn states(&self) -> Vec<DeployState> {
        lock(&self.states).clone()
    }

    pub fn messages(&self) -> Vec<String> {
        lock(&self.messages).clone()
    }

    pub fn resolved(&self) -> Vec<PackageIdentity> {
        lock(&self.resolved).clone()
    }
}

impl DeployObserver for RecordingObserver {
    fn state_changed(&self, state: DeployState) {
        lock(&self.states).push(state);
    }

    fn info(&self, message: &str) {
        lock(&self.messages).push(message.to_string());
    }

    fn package_resolved(&self, package: &PackageIdentity, _path: &Path) {
        lock(&self.resolved).push(package.clone());
    }
}
