//! Package cache: maps package identities to local files, fetching when absent

pub mod fetcher;

pub use fetcher::{FetchOutcome, ParallelFetcher};

use crate::core::path::{cache_dir, ensure_dir, same_volume};
use crate::core::{ImageError, ImageResult};
use crate::di::traits::RepositoryProvider;
use crate::package::definition::PACKAGE_EXTENSION;
use crate::package::{PackageDef, PackageIdentity, PackageSource};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempPath;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Prefix of in-progress files inside the packages directory
const PARTIAL_PREFIX: &str = ".partial-";

/// Package cache manager
///
/// Files become visible at their canonical path only once complete: every
/// write goes to a temporary file in the same directory and is renamed into
/// place. At most one fetch per canonical path runs at a time.
pub struct PackageCache {
    root: PathBuf,
    fetch_locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl PackageCache {
    /// Create a new cache instance
    pub fn new(cache_root: PathBuf) -> ImageResult<Self> {
        ensure_dir(&cache_root)?;
        Ok(Self {
            root: cache_root,
            fetch_locks: DashMap::new(),
        })
    }

    /// Get the default cache directory
    pub fn default_cache() -> ImageResult<Self> {
        Self::new(cache_dir()?)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the package files directory
    pub fn packages_dir(&self) -> PathBuf {
        self.root.join("packages")
    }

    /// Initialize cache directory structure
    pub fn init(&self) -> ImageResult<()> {
        ensure_dir(&self.packages_dir())
    }

    /// Get the canonical cache path of a package. Pure; performs no I/O.
    pub fn package_path(&self, identity: &PackageIdentity) -> PathBuf {
        self.packages_dir()
            .join(format!("{}.{}", identity.storage_stem(), PACKAGE_EXTENSION))
    }

    /// Check if a complete package file is cached
    pub fn contains(&self, identity: &PackageIdentity) -> bool {
        self.package_path(identity).is_file()
    }

    /// Resolve a package to a local file path.
    ///
    /// Order of sources:
    /// 1. an existing cache file,
    /// 2. a file source on the cache's volume, used in place,
    /// 3. a file source elsewhere, copied into the cache,
    /// 4. the package's repository, then `repositories` in order.
    pub async fn resolve(
        &self,
        package: &PackageDef,
        repositories: &[String],
        provider: &dyn RepositoryProvider,
        cancel: &CancellationToken,
    ) -> ImageResult<PathBuf> {
        let identity = package.identity();
        let path = self.package_path(&identity);

        if path.is_file() {
            debug!("Package {} exists in cache: {}", package.name, path.display());
            return Ok(path);
        }

        if cancel.is_cancelled() {
            return Err(ImageError::cancelled());
        }

        let lock = self
            .fetch_locks
            .entry(path.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = tokio::select! {
            guard = lock.lock() => {
                let result = self
                    .resolve_locked(package, repositories, provider, &path, cancel)
                    .await;
                drop(guard);
                result
            }
            _ = cancel.cancelled() => Err(ImageError::cancelled()),
        };

        // The map holds the last reference once no other fetch waits on it
        drop(lock);
        self.fetch_locks
            .remove_if(&path, |_, entry| Arc::strong_count(entry) == 1);
        result
    }

    /// Fetch a package while holding its per-path lock
    async fn resolve_locked(
        &self,
        package: &PackageDef,
        repositories: &[String],
        provider: &dyn RepositoryProvider,
        path: &Path,
        cancel: &CancellationToken,
    ) -> ImageResult<PathBuf> {
        let identity = package.identity();
        let path = path.to_path_buf();

        // Another fetch of the same package may have finished while we waited
        if path.is_file() {
            debug!("Package {} cached by a concurrent fetch", package.name);
            return Ok(path);
        }

        let mut candidates: Vec<&str> = Vec::new();
        match &package.source {
            Some(PackageSource::File { path: source }) => {
                return self.resolve_file(package, source, &path, cancel).await;
            }
            Some(PackageSource::Repository { url }) => candidates.push(url),
            Some(PackageSource::Installed { .. }) | None => {}
        }
        for url in repositories {
            if !candidates.contains(&url.as_str()) {
                candidates.push(url);
            }
        }

        if candidates.is_empty() {
            return Err(ImageError::Repository(format!(
                "No repository available for {}",
                identity
            )));
        }

        let mut attempts = Vec::new();
        for url in candidates {
            match self.fetch_from(url, package, &path, provider, cancel).await {
                Ok(()) => return Ok(path),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    warn!("Could not get {} from {}: {}", identity, url, e);
                    attempts.push(format!("{}: {}", url, e));
                }
            }
        }

        Err(ImageError::Repository(format!(
            "{} is not available from any repository ({})",
            identity,
            attempts.join("; ")
        )))
    }

    async fn resolve_file(
        &self,
        package: &PackageDef,
        source: &Path,
        cache_path: &Path,
        cancel: &CancellationToken,
    ) -> ImageResult<PathBuf> {
        if !source.is_file() {
            return Err(ImageError::Path(format!(
                "Package file for {} not found: {}",
                package.name,
                source.display()
            )));
        }

        if same_volume(source, &self.root) {
            debug!("Using {} in place: {}", package.name, source.display());
            return Ok(source.to_path_buf());
        }

        info!("Copying {} into cache", package.name);
        let temp = self.partial_file()?;
        tokio::select! {
            copied = tokio::fs::copy(source, &temp) => { copied?; }
            _ = cancel.cancelled() => return Err(ImageError::cancelled()),
        }
        self.commit(temp, cache_path)?;
        Ok(cache_path.to_path_buf())
    }

    async fn fetch_from(
        &self,
        url: &str,
        package: &PackageDef,
        cache_path: &Path,
        provider: &dyn RepositoryProvider,
        cancel: &CancellationToken,
    ) -> ImageResult<()> {
        if cancel.is_cancelled() {
            return Err(ImageError::cancelled());
        }
        let client = provider.client_for(url)?;
        let temp = self.partial_file()?;

        // On error `temp` is dropped here, which removes the partial file
        client.download(package, &temp, cancel).await?;
        if cancel.is_cancelled() {
            return Err(ImageError::cancelled());
        }
        self.commit(temp, cache_path)
    }

    /// Create an empty temporary file next to the canonical package files
    fn partial_file(&self) -> ImageResult<TempPath> {
        let dir = self.packages_dir();
        ensure_dir(&dir)?;
        let file = tempfile::Builder::new()
            .prefix(PARTIAL_PREFIX)
            .tempfile_in(&dir)?;
        Ok(file.into_temp_path())
    }

    /// Atomically move a completed temporary file to its canonical path
    fn commit(&self, temp: TempPath, cache_path: &Path) -> ImageResult<()> {
        temp.persist(cache_path).map_err(|e| ImageError::Io(e.error))?;
        debug!("Cached {}", cache_path.display());
        Ok(())
    }
}
