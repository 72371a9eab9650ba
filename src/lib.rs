//! pkgimage: reproducible deployment of package images
//!
//! An image is a content-addressed set of packages plus the repositories they
//! come from. This crate computes image ids, keeps a local package cache and
//! reconciles target installations with images, re-exporting the shared
//! types from `pkgimage-core`.

pub use pkgimage_core::{ImageError, ImageResult, Version};

/// Core module re-exported from pkgimage-core.
pub mod core {
    pub use pkgimage_core::core::*;
    pub use pkgimage_core::*;

    /// Path module re-exported from pkgimage-core.
    pub mod path {
        pub use pkgimage_core::core::path::*;
    }
}

/// Configuration management.
pub mod config;

/// Package cache and parallel fetching.
pub mod cache;

/// Package definitions and content hashes.
pub mod package;

/// Dependency ordering.
pub mod resolver;

/// Installed state of target directories.
pub mod installation;

/// External installer adapters.
pub mod installer;

/// Repository clients.
pub mod repository;

/// Image identity, editing and deployment.
pub mod image;

/// Dependency injection infrastructure.
pub mod di;
