use std::fmt;
use thiserror::Error;

pub type ImageResult<T> = Result<T, ImageError>;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WalkDir error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version error: {0}")]
    Version(String),

    /// An image was constructed from an unusable package or repository list.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Cancellation was observed before or during a deployment phase.
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Ordering could not make progress. `packages` is one concrete cycle,
    /// starting and ending with the same name.
    #[error("Cyclic dependency detected: {}", .packages.join(" -> "))]
    CyclicDependency { packages: Vec<String> },

    /// A package carries no stored hash and its content digests are incomplete.
    #[error("Hash unavailable for package {0}")]
    HashUnavailable(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Installer error: {0}")]
    Installer(String),

    #[error("{0}")]
    Fetch(FetchFailures),

    /// Blocks the install phase.
    #[error("Image deployment failed due to failure in uninstalling existing packages:\n{0}")]
    UninstallFailed(PhaseFailure),

    #[error("Image deployment failed due to failure in installing packages:\n{0}")]
    InstallFailed(PhaseFailure),
}

impl ImageError {
    /// Cancellation error raised by the deployment pipeline.
    pub fn cancelled() -> Self {
        ImageError::Cancelled("Deployment operation cancelled by user".to_string())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ImageError::Cancelled(_))
    }
}

/// One package that could not be brought into the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// `name version` of the package
    pub package: String,
    pub reason: String,
}

/// Every fetch failure of one bulk resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchFailures(pub Vec<FetchFailure>);

impl FetchFailures {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FetchFailure> {
        self.0.iter()
    }
}

impl fmt::Display for FetchFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to fetch {} package(s):", self.0.len())?;
        for failure in &self.0 {
            write!(f, "\n  - {}: {}", failure.package, failure.reason)?;
        }
        Ok(())
    }
}

/// A single cause inside an aggregated phase failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseError {
    /// Error reported by the installer while it ran
    Reported(String),
    /// Installer finished with a non-zero exit code
    ExitCode(i32),
    /// A package could not be resolved to a local file
    Fetch(FetchFailure),
    /// The installer could not be started or crashed
    Invocation(String),
}

impl fmt::Display for PhaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseError::Reported(message) => write!(f, "{}", message),
            PhaseError::ExitCode(code) => write!(f, "installer exited with code {}", code),
            PhaseError::Fetch(failure) => {
                write!(f, "could not fetch {}: {}", failure.package, failure.reason)
            }
            PhaseError::Invocation(message) => write!(f, "installer invocation failed: {}", message),
        }
    }
}

/// All errors collected from one deployment phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseFailure {
    pub errors: Vec<PhaseError>,
}

impl PhaseFailure {
    pub fn new(errors: Vec<PhaseError>) -> Self {
        Self { errors }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for PhaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {}", error)?;
        }
        Ok(())
    }
}
