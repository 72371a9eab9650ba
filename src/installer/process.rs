//! Installer backed by an external executable
//!
//! Invocation: `<program> <install|uninstall> --target <dir> [extra args] <paths...>`.
//! Lines the installer writes to stderr starting with `error:` are collected
//! as reported errors; other output is logged.

use crate::core::{ImageError, ImageResult};
use crate::di::traits::{ConfigProvider, PackageInstaller};
use crate::installer::InstallerReport;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const ERROR_PREFIX: &str = "error:";

/// Runs the configured installer executable as a child process
pub struct ProcessInstaller {
    command: String,
    extra_args: Vec<String>,
}

impl ProcessInstaller {
    /// Create an installer for `command`, a program name on PATH or a path
    pub fn new(command: impl Into<String>, extra_args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            extra_args,
        }
    }

    pub fn from_config(config: &dyn ConfigProvider) -> Self {
        Self::new(config.installer_command(), config.installer_args().to_vec())
    }

    /// Locate the installer executable. Resolved per call so a missing
    /// installer only matters to operations that need it.
    fn resolve_program(&self) -> ImageResult<PathBuf> {
        let path = Path::new(&self.command);
        if path.components().count() > 1 {
            return if path.is_file() {
                Ok(path.to_path_buf())
            } else {
                Err(ImageError::Installer(format!(
                    "Installer not found: {}",
                    path.display()
                )))
            };
        }
        which::which(&self.command).map_err(|e| {
            ImageError::Installer(format!("Installer '{}' not found on PATH: {}", self.command, e))
        })
    }

    async fn run(
        &self,
        action: &str,
        target: &Path,
        paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> InstallerReport {
        if cancel.is_cancelled() {
            return InstallerReport::not_run("cancelled before the installer started");
        }

        let program = match self.resolve_program() {
            Ok(program) => program,
            Err(e) => return InstallerReport::not_run(e.to_string()),
        };

        debug!(
            "Executing: {} {} --target {} ({} package(s))",
            program.display(),
            action,
            target.display(),
            paths.len()
        );

        let mut child = match Command::new(&program)
            .arg(action)
            .arg("--target")
            .arg(target)
            .args(&self.extra_args)
            .args(paths)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                return InstallerReport::not_run(format!(
                    "Failed to start {}: {}",
                    program.display(),
                    e
                ))
            }
        };

        let stdout_task = child.stdout.take().map(|stdout| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    info!(target: "pkgimage::installer", "{}", line);
                }
            })
        });

        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut errors = Vec::new();
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    match parse_error_line(&line) {
                        Some(error) => errors.push(error),
                        None => warn!(target: "pkgimage::installer", "{}", line),
                    }
                }
                errors
            })
        });

        let status = tokio::select! {
            status = child.wait() => status,
            _ = cancel.cancelled() => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to stop installer: {}", e);
                }
                return InstallerReport::not_run(format!("{} cancelled", action));
            }
        };

        if let Some(task) = stdout_task {
            let _ = task.await;
        }
        let errors = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };

        match status {
            Ok(status) => InstallerReport {
                exit_code: status.code().unwrap_or(-1),
                errors,
                invocation_error: None,
            },
            Err(e) => InstallerReport {
                exit_code: -1,
                errors,
                invocation_error: Some(format!("Failed to wait for installer: {}", e)),
            },
        }
    }
}

/// Extract the message of an `error:` line (prefix matched case-insensitively)
fn parse_error_line(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let head = trimmed.get(..ERROR_PREFIX.len())?;
    if head.eq_ignore_ascii_case(ERROR_PREFIX) {
        Some(trimmed[ERROR_PREFIX.len()..].trim().to_string())
    } else {
        None
    }
}

#[async_trait]
impl PackageInstaller for ProcessInstaller {
    async fn install(
        &self,
        target: &Path,
        package_paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> InstallerReport {
        self.run("install", target, package_paths, cancel).await
    }

    async fn uninstall(
        &self,
        target: &Path,
        definition_paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> InstallerReport {
        self.run("uninstall", target, definition_paths, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_error_line() {
        assert_eq!(parse_error_line("error: disk full"), Some("disk full".to_string()));
        assert_eq!(parse_error_line("  ERROR: locked"), Some("locked".to_string()));
        assert_eq!(parse_error_line("warning: slow"), None);
        assert_eq!(parse_error_line("err"), None);
    }

    #[tokio::test]
    async fn test_missing_installer() {
        let installer = ProcessInstaller::new("/nonexistent/pkg-installer", Vec::new());
        let report = installer
            .install(Path::new("/tmp"), &[], &CancellationToken::new())
            .await;
        assert!(!report.is_success());
        assert!(report
            .invocation_error
            .unwrap()
            .contains("Installer not found"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let installer = ProcessInstaller::new("sh", Vec::new());
        let report = installer.uninstall(Path::new("/tmp"), &[], &cancel).await;
        assert_eq!(report.exit_code, -1);
    }

    #[cfg(unix)]
    fn write_script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("installer.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_collects_reported_errors_and_exit_code() {
        let temp = TempDir::new().unwrap();
        let script = write_script(
            temp.path(),
            "echo \"installing $#\"\necho 'error: A failed' >&2\necho 'note' >&2\necho 'error: B failed' >&2\nexit 3",
        );
        let installer = ProcessInstaller::new(script.to_string_lossy(), Vec::new());

        let report = installer
            .install(
                temp.path(),
                &[PathBuf::from("a.pkg"), PathBuf::from("b.pkg")],
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(report.exit_code, 3);
        assert_eq!(report.errors, vec!["A failed".to_string(), "B failed".to_string()]);
        assert!(report.invocation_error.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_passes_action_target_and_paths() {
        let temp = TempDir::new().unwrap();
        let log = temp.path().join("args.log");
        let script = write_script(
            temp.path(),
            &format!("echo \"$@\" > '{}'", log.display()),
        );
        let installer = ProcessInstaller::new(script.to_string_lossy(), vec!["--quiet".to_string()]);

        let report = installer
            .uninstall(
                Path::new("/opt/app"),
                &[PathBuf::from("/opt/app/.pkgimage/packages/A.yaml")],
                &CancellationToken::new(),
            )
            .await;

        assert!(report.is_success());
        let args = std::fs::read_to_string(&log).unwrap();
        assert_eq!(
            args.trim(),
            "uninstall --target /opt/app --quiet /opt/app/.pkgimage/packages/A.yaml"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_stops_running_installer() {
        let temp = TempDir::new().unwrap();
        let script = write_script(temp.path(), "sleep 30");
        let installer = ProcessInstaller::new(script.to_string_lossy(), Vec::new());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let report = installer.install(temp.path(), &[], &cancel).await;
        assert!(!report.is_success());
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }
}
