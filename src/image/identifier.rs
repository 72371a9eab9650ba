use crate::core::{FetchFailure, FetchFailures, ImageError, ImageResult};
use crate::di::ServiceContainer;
use crate::image::deployer::{DeployOutcome, ImageDeployer};
use crate::image::ImageSpecifier;
use crate::package::{image_id, PackageDef, PackageIdentity};
use dashmap::DashMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Immutable, content-addressed package set plus its repositories
///
/// Packages are kept sorted by name. Two identifiers are equal when their ids
/// and repository lists are equal; the cache lookup does not take part.
#[derive(Debug, Clone)]
pub struct ImageIdentifier {
    id: String,
    packages: Vec<PackageDef>,
    repositories: Vec<String>,
    cache_lookup: DashMap<PackageIdentity, PathBuf>,
}

impl ImageIdentifier {
    /// Create an identifier, computing its id.
    ///
    /// Fails with `InvalidArgument` on an empty package name or a package
    /// name listed twice.
    pub fn new(mut packages: Vec<PackageDef>, repositories: Vec<String>) -> ImageResult<Self> {
        let mut seen = HashSet::new();
        for package in &packages {
            if package.name.trim().is_empty() {
                return Err(ImageError::InvalidArgument(
                    "Image packages must have a name".to_string(),
                ));
            }
            if !seen.insert(package.name.as_str()) {
                return Err(ImageError::InvalidArgument(format!(
                    "Package '{}' is listed more than once",
                    package.name
                )));
            }
        }

        packages.sort_by(|a, b| a.name.cmp(&b.name));
        let id = image_id(&packages);
        debug!("Image id {} for {} package(s)", id, packages.len());

        Ok(Self {
            id,
            packages,
            repositories,
            cache_lookup: DashMap::new(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Packages sorted by name
    pub fn packages(&self) -> &[PackageDef] {
        &self.packages
    }

    /// Repositories in precedence order
    pub fn repositories(&self) -> &[String] {
        &self.repositories
    }

    /// True once every package has a recorded local file
    pub fn is_cached(&self) -> bool {
        self.cache_lookup.len() == self.packages.len()
    }

    pub fn cached_path(&self, identity: &PackageIdentity) -> Option<PathBuf> {
        self.cache_lookup.get(identity).map(|entry| entry.value().clone())
    }

    pub fn to_specifier(&self) -> ImageSpecifier {
        ImageSpecifier::new(self.packages.clone(), self.repositories.clone())
    }

    /// Bring every package of the image into the cache.
    ///
    /// Does nothing when the image is already fully cached. Otherwise every
    /// unresolved package is fetched, concurrently; successes are recorded
    /// even when others fail.
    pub async fn cache(
        &self,
        services: &ServiceContainer,
        cancel: &CancellationToken,
    ) -> ImageResult<()> {
        if self.is_cached() {
            debug!("Image {} is fully cached", self.id);
            return Ok(());
        }
        self.resolve_packages(services, &self.packages, cancel).await?;
        Ok(())
    }

    /// Deploy the image onto `target`
    pub async fn deploy(
        &self,
        services: &ServiceContainer,
        target: &Path,
        cancel: &CancellationToken,
    ) -> ImageResult<DeployOutcome> {
        ImageDeployer::new(services).deploy(self, target, cancel).await
    }

    /// Resolve `packages` to local files, in the given order.
    ///
    /// Paths already in the cache lookup are reused while their file exists.
    /// Fails with `Cancelled` when cancellation was observed, otherwise with
    /// `Fetch` listing every package that could not be resolved.
    pub(crate) async fn resolve_packages(
        &self,
        services: &ServiceContainer,
        packages: &[PackageDef],
        cancel: &CancellationToken,
    ) -> ImageResult<Vec<PathBuf>> {
        if cancel.is_cancelled() {
            return Err(ImageError::cancelled());
        }

        let missing: Vec<PackageDef> = packages
            .iter()
            .filter(|p| !self.cached_path(&p.identity()).is_some_and(|path| path.is_file()))
            .cloned()
            .collect();

        if !missing.is_empty() {
            services.observer().fetch_started(missing.len());
            let repositories = services.repository_list(&self.repositories);
            let outcomes = services
                .fetcher()
                .fetch_all(missing, &repositories, cancel)
                .await;

            let mut failures = Vec::new();
            let mut cancelled = false;
            for outcome in outcomes {
                let identity = outcome.package.identity();
                match outcome.result {
                    Ok(path) => {
                        services.observer().package_resolved(&identity, &path);
                        self.cache_lookup.insert(identity, path);
                    }
                    Err(e) => {
                        cancelled |= e.is_cancelled();
                        failures.push(FetchFailure {
                            package: format!("{} {}", identity.name, identity.version),
                            reason: e.to_string(),
                        });
                    }
                }
            }

            if cancelled || cancel.is_cancelled() {
                return Err(ImageError::cancelled());
            }
            if !failures.is_empty() {
                return Err(ImageError::Fetch(FetchFailures(failures)));
            }
        }

        packages
            .iter()
            .map(|p| {
                self.cached_path(&p.identity()).ok_or_else(|| {
                    ImageError::Repository(format!("{} was not resolved", p.name))
                })
            })
            .collect()
    }
}

impl PartialEq for ImageIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.repositories == other.repositories
    }
}

impl Eq for ImageIdentifier {}
