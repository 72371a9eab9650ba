use crate::core::error::{ImageError, ImageResult};
use std::path::{Path, PathBuf};

/// Name of the metadata directory kept inside every installation.
pub const INSTALLATION_METADATA_DIR: &str = ".pkgimage";

/// Get the pkgimage home directory
///
/// Platform-specific locations:
/// - Windows: %APPDATA%\pkgimage
/// - Linux: ~/.config/pkgimage
/// - macOS: ~/Library/Application Support/pkgimage
pub fn pkgimage_home() -> ImageResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ImageError::Path("Could not determine config directory".to_string()))?;
    Ok(config_dir.join("pkgimage"))
}

/// Get the package cache directory
///
/// Platform-specific locations:
/// - Windows: %LOCALAPPDATA%\pkgimage
/// - Linux: ~/.cache/pkgimage
/// - macOS: ~/Library/Caches/pkgimage
pub fn cache_dir() -> ImageResult<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| ImageError::Path("Could not determine cache directory".to_string()))?;
    Ok(cache_dir.join("pkgimage"))
}

/// Get the config file path (`<pkgimage home>/config.yaml`)
pub fn config_file() -> ImageResult<PathBuf> {
    Ok(pkgimage_home()?.join("config.yaml"))
}

/// Get the metadata directory of an installation (`<target>/.pkgimage`)
pub fn installation_metadata_dir(target: &Path) -> PathBuf {
    target.join(INSTALLATION_METADATA_DIR)
}

/// Get the directory holding installed package definitions (`<target>/.pkgimage/packages`)
pub fn installed_packages_dir(target: &Path) -> PathBuf {
    installation_metadata_dir(target).join("packages")
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> ImageResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Replace characters that are not safe in a single file name component.
pub fn sanitize_component(value: &str) -> String {
    let sanitized: String = value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = sanitized.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Check whether two existing paths live on the same storage volume.
///
/// Returns false when either path cannot be inspected.
#[cfg(unix)]
pub fn same_volume(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (std::fs::metadata(a), std::fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev(),
        _ => false,
    }
}

/// Check whether two existing paths live on the same storage volume.
///
/// Compares the path prefixes (drive letter or UNC share).
#[cfg(not(unix))]
pub fn same_volume(a: &Path, b: &Path) -> bool {
    use std::path::Component;

    fn prefix(path: &Path) -> Option<String> {
        let absolute = std::fs::canonicalize(path).ok()?;
        match absolute.components().next() {
            Some(Component::Prefix(p)) => Some(p.as_os_str().to_string_lossy().to_lowercase()),
            _ => None,
        }
    }

    match (prefix(a), prefix(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dir() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("test_dir");

        ensure_dir(&dir).unwrap();
        assert!(dir.exists());
        assert!(dir.is_dir());
    }

    #[test]
    fn test_installed_packages_dir() {
        let dir = installed_packages_dir(Path::new("/opt/app"));
        assert_eq!(dir, Path::new("/opt/app/.pkgimage/packages"));
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("Plugin/Sub"), "Plugin_Sub");
        assert_eq!(sanitize_component("a:b*c"), "a_b_c");
        assert_eq!(sanitize_component(".."), "_");
        assert_eq!(sanitize_component("Core"), "Core");
    }

    #[test]
    fn test_same_volume_within_one_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.bin");
        fs::write(&file, b"data").unwrap();

        assert!(same_volume(&file, temp.path()));
    }

    #[test]
    fn test_same_volume_missing_path() {
        let temp = TempDir::new().unwrap();
        assert!(!same_volume(&temp.path().join("missing"), temp.path()));
    }
}
