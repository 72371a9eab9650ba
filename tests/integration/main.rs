//! Integration tests for the pkgimage CLI

use assert_cmd::Command;
use assert_fs::{prelude::*, TempDir};
use std::path::PathBuf;

pub mod cache;
pub mod deploy;
pub mod id;
pub mod installed;

/// Test context that provides isolated environment for each test
pub struct TestContext {
    pub temp: TempDir,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.child("config").path()).unwrap();
        std::fs::create_dir_all(temp.child("cache").path()).unwrap();
        Self { temp }
    }

    /// Create a Command for running pkgimage with config and cache inside the context
    pub fn pkgimage(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("pkgimage").unwrap();
        cmd.current_dir(&self.temp);

        let config_dir = self.temp.child("config").to_path_buf();
        let cache_dir = self.temp.child("cache").to_path_buf();

        if cfg!(target_os = "windows") {
            cmd.env("APPDATA", &config_dir);
            cmd.env("LOCALAPPDATA", &cache_dir);
            cmd.env("USERPROFILE", self.temp.path());
        } else if cfg!(target_os = "linux") {
            cmd.env("XDG_CONFIG_HOME", &config_dir);
            cmd.env("XDG_CACHE_HOME", &cache_dir);
            cmd.env("HOME", self.temp.path());
        } else {
            cmd.env("HOME", self.temp.path());
        }
        cmd.env_remove("RUST_LOG");

        cmd
    }

    /// Write an image file and return its path
    pub fn image(&self, name: &str, content: &str) -> PathBuf {
        let child = self.temp.child(name);
        child.write_str(content).unwrap();
        child.to_path_buf()
    }

    /// Write a package file whose content is its own definition, as the
    /// script installer expects
    pub fn package_file(&self, name: &str, version: &str, dependencies: &[&str]) -> PathBuf {
        let mut definition = format!("name: {}\nversion: \"{}\"\n", name, version);
        if !dependencies.is_empty() {
            definition.push_str(&format!("dependencies: [{}]\n", dependencies.join(", ")));
        }
        let child = self.temp.child("packages").child(format!("{}-{}.pkg", name, version));
        child.write_str(&definition).unwrap();
        child.to_path_buf()
    }

    pub fn target(&self) -> PathBuf {
        self.temp.child("target").to_path_buf()
    }

    /// Write an installer script that records installed definitions in the
    /// target, the way a real installer maintains its metadata
    #[cfg(unix)]
    pub fn script_installer(&self, extra: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let script = format!(
            r#"#!/bin/sh
action="$1"
shift
[ "$1" = "--target" ] || exit 2
target="$2"
shift 2
{extra}
mkdir -p "$target/.pkgimage/packages"
for f in "$@"; do
  case "$action" in
    install) cp "$f" "$target/.pkgimage/packages/$(basename "$f").yaml" ;;
    uninstall) rm "$f" ;;
  esac
  echo "$action $f" >> "$target/installer.log"
done
"#
        );
        let child = self.temp.child("installer.sh");
        child.write_str(&script).unwrap();
        let path = child.to_path_buf();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }
}

/// Image entry for a package with a file source
pub fn file_entry(name: &str, version: &str, path: &std::path::Path, dependencies: &[&str]) -> String {
    let mut entry = format!(
        "  - name: {}\n    version: \"{}\"\n    hash: {}-{}\n    source:\n      type: file\n      path: {}\n",
        name,
        version,
        name,
        version,
        path.display()
    );
    if !dependencies.is_empty() {
        entry.push_str(&format!("    dependencies: [{}]\n", dependencies.join(", ")));
    }
    entry
}
