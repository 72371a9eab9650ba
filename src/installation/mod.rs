//! Installed state of a target directory
//!
//! An installation keeps one package definition per installed package under
//! `<target>/.pkgimage/packages/`. The installer executable maintains these
//! files; this module only reads them.

pub mod differ;

pub use differ::{diff, Diff};

use crate::core::path::{ensure_dir, installed_packages_dir};
use crate::core::ImageResult;
use crate::di::traits::InstallationQuery;
use crate::package::{PackageDef, PackageSource};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Installation query reading definition files from the target directory
#[derive(Debug, Clone, Default)]
pub struct DirectoryInstallation;

impl DirectoryInstallation {
    pub fn new() -> Self {
        Self
    }

    /// Write `package` as an installed definition file and return its path
    pub fn record(target: &Path, package: &PackageDef) -> ImageResult<PathBuf> {
        let dir = installed_packages_dir(target);
        ensure_dir(&dir)?;
        let path = dir.join(format!("{}.yaml", package.identity().storage_stem()));
        let mut stored = package.clone();
        stored.source = None;
        stored.save(&path)?;
        Ok(path)
    }
}

impl InstallationQuery for DirectoryInstallation {
    fn installed_packages(&self, target: &Path) -> ImageResult<Vec<PackageDef>> {
        let dir = installed_packages_dir(target);
        if !dir.is_dir() {
            debug!("No installed packages in {}", target.display());
            return Ok(Vec::new());
        }

        let mut packages = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || !path.extension().is_some_and(|ext| ext == "yaml") {
                continue;
            }
            let mut package = PackageDef::load(path)?;
            package.source = Some(PackageSource::Installed {
                definition_path: path.to_path_buf(),
            });
            packages.push(package);
        }

        packages.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("{} package(s) installed in {}", packages.len(), target.display());
        Ok(packages)
    }
}
