//! Package hashes and content-addressed image ids

use crate::core::{ImageError, ImageResult};
use crate::package::definition::PackageDef;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Delimiter between package hashes when computing an image id
const HASH_DELIMITER: &str = ",";

/// Get the hash identifying a package's content.
///
/// Uses the stored hash when present, then a hash computed from the package's
/// file digests. Packages without either fall back to
/// `"<name> <version> <architecture> <os>"`, which is not content-addressed.
pub fn package_hash(package: &PackageDef) -> String {
    if let Some(hash) = &package.hash {
        return hash.clone();
    }

    match compute_content_hash(package) {
        Ok(hash) => hash,
        Err(e) => {
            debug!("Using identity as hash for {}: {}", package.name, e);
            format!(
                "{} {} {} {}",
                package.name, package.version, package.architecture, package.os
            )
        }
    }
}

/// Compute a package hash from the stored digests of its payload files.
///
/// Fails when the package lists no files or any file lacks a digest.
pub fn compute_content_hash(package: &PackageDef) -> ImageResult<String> {
    if package.files.is_empty() {
        return Err(ImageError::HashUnavailable(format!(
            "{} lists no files",
            package.name
        )));
    }

    let mut hasher = Sha256::new();
    for file in &package.files {
        let digest = file.hash.as_deref().ok_or_else(|| {
            ImageError::HashUnavailable(format!(
                "{} has no digest for {}",
                package.name, file.path
            ))
        })?;
        hasher.update(file.path.as_bytes());
        hasher.update([0u8]);
        hasher.update(digest.as_bytes());
        hasher.update([b'\n']);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compute the content-addressed id of a package set.
///
/// Packages are sorted by name first, so input order never affects the id.
pub fn image_id(packages: &[PackageDef]) -> String {
    let mut sorted: Vec<&PackageDef> = packages.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let hashes: Vec<String> = sorted.into_iter().map(package_hash).collect();
    let digest = Sha256::digest(hashes.join(HASH_DELIMITER).as_bytes());
    STANDARD.encode(digest)
}
