//! Service container for dependency injection

use super::traits::{ConfigProvider, InstallationQuery, PackageInstaller, RepositoryProvider};
use crate::cache::{PackageCache, ParallelFetcher};
use crate::config::Config;
use crate::core::ImageResult;
use crate::image::observer::{DeployObserver, TracingObserver};
use crate::installation::DirectoryInstallation;
use crate::installer::ProcessInstaller;
use crate::repository::DefaultRepositoryProvider;
use std::sync::Arc;

/// Service container for dependency injection
///
/// Holds every collaborator of an image operation as a trait object. The
/// package cache is concrete: its locking and atomic writes are part of the
/// deployment contract rather than a swappable policy.
#[derive(Clone)]
pub struct ServiceContainer {
    pub config: Arc<dyn ConfigProvider>,
    pub cache: Arc<PackageCache>,
    pub installation: Arc<dyn InstallationQuery>,
    pub installer: Arc<dyn PackageInstaller>,
    pub repositories: Arc<dyn RepositoryProvider>,
    pub observer: Arc<dyn DeployObserver>,
}

impl ServiceContainer {
    /// Create a new service container with production implementations
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Config file cannot be loaded or created
    /// - Cache directory cannot be created
    pub fn new() -> ImageResult<Self> {
        Self::from_config(Config::load()?)
    }

    /// Create production services from an already loaded configuration
    pub fn from_config(config: Config) -> ImageResult<Self> {
        let cache = PackageCache::new(config.cache_dir()?)?;
        cache.init()?;

        Ok(Self {
            installer: Arc::new(ProcessInstaller::from_config(&config)),
            repositories: Arc::new(DefaultRepositoryProvider::from_config(&config)),
            installation: Arc::new(DirectoryInstallation::new()),
            cache: Arc::new(cache),
            config: Arc::new(config),
            observer: Arc::new(TracingObserver),
        })
    }

    /// Create a service container with custom provider implementations
    ///
    /// Progress goes to a [`TracingObserver`] until replaced with
    /// [`ServiceContainer::with_observer`].
    pub fn with_providers(
        config: Arc<dyn ConfigProvider>,
        cache: Arc<PackageCache>,
        installation: Arc<dyn InstallationQuery>,
        installer: Arc<dyn PackageInstaller>,
        repositories: Arc<dyn RepositoryProvider>,
    ) -> Self {
        Self {
            config,
            cache,
            installation,
            installer,
            repositories,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replace the deployment observer
    pub fn with_observer(mut self, observer: Arc<dyn DeployObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &dyn ConfigProvider {
        self.config.as_ref()
    }

    pub fn cache(&self) -> &PackageCache {
        self.cache.as_ref()
    }

    pub fn installation(&self) -> &dyn InstallationQuery {
        self.installation.as_ref()
    }

    pub fn installer(&self) -> &dyn PackageInstaller {
        self.installer.as_ref()
    }

    pub fn repositories(&self) -> &dyn RepositoryProvider {
        self.repositories.as_ref()
    }

    pub fn observer(&self) -> &dyn DeployObserver {
        self.observer.as_ref()
    }

    /// Fetcher over this container's cache, bounded by the configured concurrency
    pub fn fetcher(&self) -> ParallelFetcher {
        ParallelFetcher::new(
            Arc::clone(&self.cache),
            Arc::clone(&self.repositories),
            Some(self.config.max_concurrent_downloads()),
        )
    }

    /// Image repositories followed by the configured fallback repositories
    pub fn repository_list(&self, image_repositories: &[String]) -> Vec<String> {
        let mut list = image_repositories.to_vec();
        for url in self.config.fallback_repositories() {
            if !list.contains(url) {
                list.push(url.clone());
            }
        }
        list
    }
}
