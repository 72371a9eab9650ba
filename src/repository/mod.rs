//! Package repositories: selection by URL and the built-in clients

pub mod directory;
pub mod http;

pub use directory::DirectoryRepository;
pub use http::HttpRepository;

use crate::core::{ImageError, ImageResult};
use crate::di::traits::{ConfigProvider, RepositoryClient, RepositoryProvider};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

/// Kind of repository a URL refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryKind {
    Http,
    Directory,
}

/// Determine the repository kind from its URL
///
/// `http://` and `https://` URLs are HTTP repositories; `file://` URLs and
/// plain paths are directory repositories.
pub fn determine_repository_kind(url: &str) -> ImageResult<RepositoryKind> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ImageError::Repository("Empty repository URL".to_string()));
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(RepositoryKind::Http)
    } else if lower.starts_with("file://") || !lower.contains("://") {
        Ok(RepositoryKind::Directory)
    } else {
        Err(ImageError::Repository(format!(
            "Unsupported repository URL: {}",
            url
        )))
    }
}

/// Repository provider creating HTTP and directory clients, reused per URL
pub struct DefaultRepositoryProvider {
    request_timeout: Duration,
    clients: DashMap<String, Arc<dyn RepositoryClient>>,
}

impl DefaultRepositoryProvider {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            clients: DashMap::new(),
        }
    }

    pub fn from_config(config: &dyn ConfigProvider) -> Self {
        Self::new(config.request_timeout())
    }
}

impl RepositoryProvider for DefaultRepositoryProvider {
    fn client_for(&self, url: &str) -> ImageResult<Arc<dyn RepositoryClient>> {
        if let Some(client) = self.clients.get(url) {
            return Ok(Arc::clone(client.value()));
        }

        let client: Arc<dyn RepositoryClient> = match determine_repository_kind(url)? {
            RepositoryKind::Http => Arc::new(HttpRepository::new(url, self.request_timeout)?),
            RepositoryKind::Directory => Arc::new(DirectoryRepository::new(url)),
        };
        self.clients.insert(url.to_string(), Arc::clone(&client));
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determine_repository_kind() {
        assert_eq!(
            determine_repository_kind("https://packages.example.com").unwrap(),
            RepositoryKind::Http
        );
        assert_eq!(
            determine_repository_kind("HTTP://packages.example.com").unwrap(),
            RepositoryKind::Http
        );
        assert_eq!(
            determine_repository_kind("file:///srv/packages").unwrap(),
            RepositoryKind::Directory
        );
        assert_eq!(
            determine_repository_kind("/srv/packages").unwrap(),
            RepositoryKind::Directory
        );
        assert!(determine_repository_kind("ftp://old.example.com").is_err());
        assert!(determine_repository_kind("  ").is_err());
    }

    #[test]
    fn test_clients_are_reused() {
        let provider = DefaultRepositoryProvider::new(Duration::from_secs(5));
        let first = provider.client_for("/srv/packages").unwrap();
        let second = provider.client_for("/srv/packages").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.url(), "/srv/packages");
    }

    #[test]
    fn test_unsupported_url() {
        let provider = DefaultRepositoryProvider::new(Duration::from_secs(5));
        assert!(provider.client_for("ftp://old.example.com").is_err());
    }
}
