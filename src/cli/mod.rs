pub mod cache;
pub mod deploy;
pub mod id;
pub mod installed;
pub mod progress;

use pkgimage::config::Config;
use pkgimage::core::ImageResult;
use pkgimage::di::ServiceContainer;
use pkgimage::image::{ImageIdentifier, ImageSpecifier};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Command-line settings that take precedence over the config file
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub cache_dir: Option<PathBuf>,
    pub installer: Option<String>,
}

impl ConfigOverrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = Some(dir.to_string_lossy().into_owned());
        }
        if let Some(installer) = &self.installer {
            config.installer_command = installer.clone();
        }
    }
}

/// Production services with the overrides applied and progress on the terminal
pub fn services(overrides: &ConfigOverrides) -> ImageResult<ServiceContainer> {
    let mut config = Config::load()?;
    overrides.apply(&mut config);
    Ok(ServiceContainer::from_config(config)?
        .with_observer(Arc::new(progress::ProgressObserver::new())))
}

pub fn load_image(path: &Path) -> ImageResult<ImageIdentifier> {
    ImageSpecifier::load(path)?.into_identifier()
}
