//! Core types shared by the pkgimage crates: errors, filesystem locations and
//! package versions.

pub mod core;

pub use crate::core::error::{FetchFailure, FetchFailures, ImageError, ImageResult, PhaseError, PhaseFailure};
pub use crate::core::version::Version;
