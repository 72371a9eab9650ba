use crate::cache::PackageCache;
use crate::core::{ImageError, ImageResult};
use crate::di::traits::RepositoryProvider;
use crate::package::PackageDef;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default number of packages fetched at once
pub const DEFAULT_MAX_CONCURRENT: usize = 4;

/// Result of resolving one package
#[derive(Debug)]
pub struct FetchOutcome {
    pub package: PackageDef,
    pub result: ImageResult<PathBuf>,
}

/// Resolves many packages through the cache with bounded concurrency
pub struct ParallelFetcher {
    cache: Arc<PackageCache>,
    provider: Arc<dyn RepositoryProvider>,
    max_concurrent: usize,
}

impl ParallelFetcher {
    pub fn new(
        cache: Arc<PackageCache>,
        provider: Arc<dyn RepositoryProvider>,
        max_concurrent: Option<usize>,
    ) -> Self {
        Self {
            cache,
            provider,
            max_concurrent: max_concurrent.unwrap_or(DEFAULT_MAX_CONCURRENT).max(1),
        }
    }

    /// Resolve every package. Outcomes come back in input order, one per
    /// package; a failure never stops the remaining fetches.
    pub async fn fetch_all(
        &self,
        packages: Vec<PackageDef>,
        repositories: &[String],
        cancel: &CancellationToken,
    ) -> Vec<FetchOutcome> {
        let repositories: Arc<[String]> = repositories.into();
        let mut slots: Vec<Option<ImageResult<PathBuf>>> =
            packages.iter().map(|_| None).collect();
        let mut join_set = JoinSet::new();

        for (index, package) in packages.iter().enumerate() {
            if join_set.len() >= self.max_concurrent {
                match join_set.join_next().await {
                    Some(Ok((done, result))) => slots[done] = Some(result),
                    Some(Err(e)) => warn!("Fetch task failed: {}", e),
                    None => {}
                }
            }

            let cache = Arc::clone(&self.cache);
            let provider = Arc::clone(&self.provider);
            let repositories = Arc::clone(&repositories);
            let cancel = cancel.clone();
            let package = package.clone();
            join_set.spawn(async move {
                let result = cache
                    .resolve(&package, &repositories, provider.as_ref(), &cancel)
                    .await;
                (index, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((done, result)) => slots[done] = Some(result),
                Err(e) => warn!("Fetch task failed: {}", e),
            }
        }

        packages
            .into_iter()
            .zip(slots)
            .map(|(package, slot)| {
                let result = slot.unwrap_or_else(|| {
                    Err(ImageError::Repository(format!(
                        "Fetch of {} did not complete",
                        package.name
                    )))
                });
                if let Err(e) = &result {
                    debug!("Could not resolve {}: {}", package.name, e);
                }
                FetchOutcome { package, result }
            })
            .collect()
    }
}
