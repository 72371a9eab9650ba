use crate::core::path::{config_file, ensure_dir};
use crate::core::{ImageError, ImageResult};
use crate::di::ConfigProvider;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Package cache directory (defaults to platform-specific cache directory)
    ///
    /// Default locations:
    /// - Windows: %LOCALAPPDATA%\pkgimage
    /// - Linux: ~/.cache/pkgimage
    /// - macOS: ~/Library/Caches/pkgimage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,

    /// Installer executable, a program name on PATH or a path
    #[serde(default = "default_installer_command")]
    pub installer_command: String,

    /// Extra arguments passed to every installer invocation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub installer_args: Vec<String>,

    /// Maximum number of package downloads in flight
    #[serde(default = "default_max_concurrent_downloads")]
    pub max_concurrent_downloads: usize,

    /// Repositories tried after an image's own repositories
    #[serde(default)]
    pub repositories: Vec<String>,

    /// Timeout for a single repository request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_installer_command() -> String {
    "pkg-installer".to_string()
}

fn default_max_concurrent_downloads() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            installer_command: default_installer_command(),
            installer_args: Vec::new(),
            max_concurrent_downloads: default_max_concurrent_downloads(),
            repositories: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Load config from platform-specific config directory, creating default if it doesn't exist
    ///
    /// Config locations:
    /// - Windows: %APPDATA%\pkgimage\config.yaml
    /// - Linux: ~/.config/pkgimage/config.yaml
    /// - macOS: ~/Library/Application Support/pkgimage/config.yaml
    pub fn load() -> ImageResult<Self> {
        Self::load_from(&config_file()?)
    }

    /// Save config to platform-specific config directory
    pub fn save(&self) -> ImageResult<()> {
        self.save_to(&config_file()?)
    }

    /// Load config from `path`, writing the defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> ImageResult<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| ImageError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save_to(&self, path: &Path) -> ImageResult<()> {
        let config_dir = path
            .parent()
            .ok_or_else(|| ImageError::Path("Invalid config path".to_string()))?;
        ensure_dir(config_dir)?;

        let content = serde_yaml::to_string(self)
            .map_err(|e| ImageError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)?;
        Ok(())
    }

    /// Get the cache directory path
    pub fn get_cache_dir(&self) -> ImageResult<PathBuf> {
        if let Some(ref dir) = self.cache_dir {
            Ok(PathBuf::from(dir))
        } else {
            crate::core::path::cache_dir()
        }
    }
}

impl ConfigProvider for Config {
    fn cache_dir(&self) -> ImageResult<PathBuf> {
        self.get_cache_dir()
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
        &self.repositories
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
