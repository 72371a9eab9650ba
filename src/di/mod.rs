//! Dependency injection infrastructure for pkgimage
//!
//! Every collaborator of a deployment (configuration, installation state,
//! installer, repositories and progress reporting) sits behind a trait so
//! tests can swap in the implementations from [`mocks`].
//!
//! # Example (Production)
//! ```no_run
//! use pkgimage::di::ServiceContainer;
//!
//! # fn example() -> pkgimage::core::ImageResult<()> {
//! let container = ServiceContainer::new()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example (Testing)
//! ```
//! use pkgimage::cache::PackageCache;
//! use pkgimage::di::{mocks::*, ServiceContainer};
//! use std::sync::Arc;
//!
//! # fn example(cache: PackageCache) {
//! let container = ServiceContainer::with_providers(
//!     Arc::new(MockConfigProvider::default()),
//!     Arc::new(cache),
//!     Arc::new(MockInstallationQuery::new()),
//!     Arc::new(MockInstaller::new()),
//!     Arc::new(MockRepositoryProvider::new()),
//! );
//! # }
//! ```

pub mod container;
pub mod mocks;
pub mod traits;

pub use container::ServiceContainer;
pub use traits::{
    ConfigProvider, InstallationQuery, PackageInstaller, RepositoryClient, RepositoryProvider,
};
