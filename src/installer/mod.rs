//! External installer boundary

pub mod process;

pub use process::ProcessInstaller;

use crate::core::PhaseError;

/// Outcome of one installer invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallerReport {
    /// Process-style exit code, 0 on success
    pub exit_code: i32,
    /// Every error the installer reported while it ran
    pub errors: Vec<String>,
    /// Set when the installer could not be started or was torn down
    pub invocation_error: Option<String>,
}

impl InstallerReport {
    pub fn success() -> Self {
        Self::default()
    }

    /// Report for an installer that never ran to completion
    pub fn not_run(reason: impl Into<String>) -> Self {
        Self {
            exit_code: -1,
            errors: Vec::new(),
            invocation_error: Some(reason.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0 && self.errors.is_empty() && self.invocation_error.is_none()
    }

    /// Flatten the report into phase errors, one per cause
    pub fn into_phase_errors(self) -> Vec<PhaseError> {
        let mut errors: Vec<PhaseError> = self.errors.into_iter().map(PhaseError::Reported).collect();
        if let Some(reason) = self.invocation_error {
            errors.push(PhaseError::Invocation(reason));
        } else if self.exit_code != 0 {
            errors.push(PhaseError::ExitCode(self.exit_code));
        }
        errors
    }
}
