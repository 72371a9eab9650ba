//! HTTP package repository

use crate::core::{ImageError, ImageResult};
use crate::di::traits::RepositoryClient;
use crate::package::PackageDef;
use async_trait::async_trait;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Client for a repository serving packages over HTTP
///
/// Packages are fetched from
/// `<url>/packages/<name>/download?version=<v>&architecture=<arch>&os=<os>`.
pub struct HttpRepository {
    url: String,
    client: Client,
}

impl HttpRepository {
    pub fn new(url: &str, timeout: Duration) -> ImageResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build the download URL of a package
    pub fn download_url(&self, package: &PackageDef) -> String {
        format!(
            "{}/packages/{}/download?version={}&architecture={}&os={}",
            self.url,
            urlencoding::encode(&package.name),
            urlencoding::encode(&package.version.to_string()),
            urlencoding::encode(&package.architecture),
            urlencoding::encode(&package.os),
        )
    }
}

#[async_trait]
impl RepositoryClient for HttpRepository {
    fn url(&self) -> &str {
        &self.url
    }

    async fn download(
        &self,
        package: &PackageDef,
        destination: &Path,
        cancel: &CancellationToken,
    ) -> ImageResult<()> {
        let url = self.download_url(package);
        info!("Downloading {} from {}", package.identity(), self.url);
        debug!("GET {}", url);

        let mut response = tokio::select! {
            response = self.client.get(&url).send() => response?,
            _ = cancel.cancelled() => return Err(ImageError::cancelled()),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Repository(format!(
                "{} responded {} for {}",
                self.url,
                status,
                package.identity()
            )));
        }

        let mut file = tokio::fs::File::create(destination).await?;
        let mut written = 0u64;
        loop {
            let chunk = tokio::select! {
                chunk = response.chunk() => chunk?,
                _ = cancel.cancelled() => return Err(ImageError::cancelled()),
            };
            match chunk {
                Some(bytes) => {
                    file.write_all(&bytes).await?;
                    written += bytes.len() as u64;
                }
                None => break,
            }
        }
        file.flush().await?;
        file.sync_all().await?;

        debug!("Downloaded {} bytes for {}", written, package.name);
        Ok(())
    }
}
