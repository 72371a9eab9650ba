//! Progress reporting for image operations

use crate::package::PackageIdentity;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Stage of a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployState {
    Idle,
    DiffComputed,
    Uninstalling,
    Installing,
    Done,
    Cancelled,
    Failed,
}

impl fmt::Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeployState::Idle => "idle",
            DeployState::DiffComputed => "diff computed",
            DeployState::Uninstalling => "uninstalling",
            DeployState::Installing => "installing",
            DeployState::Done => "done",
            DeployState::Cancelled => "cancelled",
            DeployState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Receives progress of cache and deploy operations. All methods default to no-ops.
pub trait DeployObserver: Send + Sync {
    fn state_changed(&self, _state: DeployState) {}

    /// Informational message, such as a no-op deployment
    fn info(&self, _message: &str) {}

    /// Resolution of `count` packages through the cache is starting
    fn fetch_started(&self, _count: usize) {}

    /// A package now has a local file
    fn package_resolved(&self, _package: &PackageIdentity, _path: &Path) {}
}

/// Observer that forwards everything to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DeployObserver for TracingObserver {
    fn state_changed(&self, state: DeployState) {
        info!("Deployment {}", state);
    }

    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn fetch_started(&self, count: usize) {
        debug!("Resolving {} package(s)", count);
    }

    fn package_resolved(&self, package: &PackageIdentity, path: &Path) {
        debug!("Resolved {} to {}", package, path.display());
    }
}
