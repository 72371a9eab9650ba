//! Reconciles a target installation with an image
//!
//! A deployment runs in sequential phases: diff, uninstall, install. Each
//! phase collects every error it meets and reports them together. A failed
//! uninstall stops the deployment before anything is installed. Nothing is
//! rolled back: a failure leaves whatever the completed phases changed.

use crate::core::{ImageError, ImageResult, PhaseError, PhaseFailure};
use crate::di::ServiceContainer;
use crate::image::observer::DeployState;
use crate::image::ImageIdentifier;
use crate::installation::diff;
use crate::package::{PackageDef, PackageIdentity};
use crate::resolver::{order_for_install, order_for_uninstall};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Result of a successful deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// The target already matched the image; nothing ran
    UpToDate,
    /// Packages removed and installed, each in the order used
    Deployed {
        removed: Vec<PackageIdentity>,
        installed: Vec<PackageIdentity>,
    },
}

/// Runs deployments with the services of a container
pub struct ImageDeployer<'a> {
    services: &'a ServiceContainer,
}

impl<'a> ImageDeployer<'a> {
    pub fn new(services: &'a ServiceContainer) -> Self {
        Self { services }
    }

    /// Deploy `image` onto `target`.
    ///
    /// The observer sees every state, ending in `Done`, `Cancelled` or `Failed`.
    pub async fn deploy(
        &self,
        image: &ImageIdentifier,
        target: &Path,
        cancel: &CancellationToken,
    ) -> ImageResult<DeployOutcome> {
        let observer = self.services.observer();
        observer.state_changed(DeployState::Idle);

        let result = self.run(image, target, cancel).await;

        observer.state_changed(match &result {
            Ok(_) => DeployState::Done,
            Err(e) if e.is_cancelled() => DeployState::Cancelled,
            Err(_) => DeployState::Failed,
        });
        result
    }

    async fn run(
        &self,
        image: &ImageIdentifier,
        target: &Path,
        cancel: &CancellationToken,
    ) -> ImageResult<DeployOutcome> {
        check_cancelled(cancel)?;

        let installed = self.services.installation().installed_packages(target)?;
        let diff = diff(image.packages(), &installed);
        self.services.observer().state_changed(DeployState::DiffComputed);
        debug!(
            "{} package(s) to uninstall, {} to install",
            diff.to_uninstall.len(),
            diff.to_install.len()
        );

        if diff.is_empty() {
            self.services.observer().info(&format!(
                "Image {} is already deployed to {}",
                image.id(),
                target.display()
            ));
            return Ok(DeployOutcome::UpToDate);
        }

        check_cancelled(cancel)?;
        let removed = if diff.to_uninstall.is_empty() {
            Vec::new()
        } else {
            self.uninstall(&diff.to_uninstall, target, cancel).await?
        };

        check_cancelled(cancel)?;
        let installed = if diff.to_install.is_empty() {
            Vec::new()
        } else {
            self.install(image, &diff.to_install, target, cancel).await?
        };

        info!(
            "Deployed image {} to {} ({} removed, {} installed)",
            image.id(),
            target.display(),
            removed.len(),
            installed.len()
        );
        Ok(DeployOutcome::Deployed { removed, installed })
    }

    async fn uninstall(
        &self,
        packages: &[PackageDef],
        target: &Path,
        cancel: &CancellationToken,
    ) -> ImageResult<Vec<PackageIdentity>> {
        let ordered = order_for_uninstall(packages)?;
        self.services.observer().state_changed(DeployState::Uninstalling);
        info!("Uninstalling {} package(s)", ordered.len());

        let mut paths = Vec::with_capacity(ordered.len());
        let mut missing = Vec::new();
        for package in &ordered {
            match package.installed_definition_path() {
                Some(path) => paths.push(path.to_path_buf()),
                None => missing.push(PhaseError::Invocation(format!(
                    "{} has no installed definition file",
                    package.identity()
                ))),
            }
        }
        if !missing.is_empty() {
            return Err(ImageError::UninstallFailed(PhaseFailure::new(missing)));
        }

        let report = self.services.installer().uninstall(target, &paths, cancel).await;
        if !report.is_success() {
            check_cancelled(cancel)?;
            return Err(ImageError::UninstallFailed(PhaseFailure::new(
                report.into_phase_errors(),
            )));
        }

        Ok(ordered.iter().map(PackageDef::identity).collect())
    }

    async fn install(
        &self,
        image: &ImageIdentifier,
        packages: &[PackageDef],
        target: &Path,
        cancel: &CancellationToken,
    ) -> ImageResult<Vec<PackageIdentity>> {
        let ordered = order_for_install(packages)?;
        self.services.observer().state_changed(DeployState::Installing);
        info!("Installing {} package(s)", ordered.len());

        let paths: Vec<PathBuf> = match image.resolve_packages(self.services, &ordered, cancel).await
        {
            Ok(paths) => paths,
            Err(ImageError::Fetch(failures)) => {
                return Err(ImageError::InstallFailed(PhaseFailure::new(
                    failures.0.into_iter().map(PhaseError::Fetch).collect(),
                )))
            }
            Err(e) => return Err(e),
        };

        check_cancelled(cancel)?;
        let report = self.services.installer().install(target, &paths, cancel).await;
        if !report.is_success() {
            check_cancelled(cancel)?;
            return Err(ImageError::InstallFailed(PhaseFailure::new(
                report.into_phase_errors(),
            )));
        }

        Ok(ordered.iter().map(PackageDef::identity).collect())
    }
}

fn check_cancelled(cancel: &CancellationToken) -> ImageResult<()> {
    if cancel.is_cancelled() {
        Err(ImageError::cancelled())
    } else {
        Ok(())
    }
}
