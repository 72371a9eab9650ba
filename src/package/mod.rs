pub mod definition;
pub mod hash;

pub use definition::{PackageClass, PackageDef, PackageFile, PackageIdentity, PackageSource};
pub use hash::{image_id, package_hash};
