use crate::core::error::{ImageError, ImageResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Package version (`major.minor.patch[-prerelease][+build]`).
///
/// Serialized as its display string. Build metadata is kept for display but
/// ignored by equality, hashing and ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Pre-release version (e.g., "alpha.1", "beta.2", "rc.1")
    pub prerelease: Option<String>,
    /// Build metadata (e.g., "build.123")
    pub build_metadata: Option<String>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
            build_metadata: None,
        }
    }

    /// Parse a version string (e.g., "1.2.3", "1.2.3-alpha.1", "1.2.3+build.123", "3.0-1", "1.2")
    pub fn parse(s: &str) -> ImageResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ImageError::Version("Empty version string".to_string()));
        }

        let (version_prerelease, build_metadata) = match s.split_once('+') {
            Some((head, build)) => (head, Some(build.to_string())),
            None => (s, None),
        };

        let (version_part, prerelease) = if let Some(pos) = version_prerelease.rfind('-') {
            let potential_prerelease = &version_prerelease[pos + 1..];
            let version_before_dash = &version_prerelease[..pos];

            if potential_prerelease.contains('.')
                || potential_prerelease.chars().any(|c| !c.is_ascii_digit())
            {
                (version_before_dash, Some(potential_prerelease.to_string()))
            } else if version_before_dash.split('.').count() >= 3 {
                // "1.2.3-1" already has a patch, so the suffix is a prerelease
                (version_before_dash, Some(potential_prerelease.to_string()))
            } else {
                // "3.0-1" is read as "3.0.1"
                (version_prerelease, None)
            }
        } else {
            (version_prerelease, None)
        };

        let normalized = if prerelease.is_none() {
            version_part.replace('-', ".")
        } else {
            version_part.to_string()
        };

        let mut parts = normalized.split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| ImageError::Version(format!("Invalid major version: {}", s)))?;
        let minor = match parts.next() {
            Some(p) => p
                .parse()
                .map_err(|_| ImageError::Version(format!("Invalid minor version: {}", s)))?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(p) => p
                .parse()
                .map_err(|_| ImageError::Version(format!("Invalid patch version: {}", s)))?,
            None => 0,
        };

        Ok(Self {
            major,
            minor,
            patch,
            prerelease,
            build_metadata,
        })
    }
}

impl FromStr for Version {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = ImageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Version::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.major == other.major
            && self.minor == other.minor
            && self.patch == other.patch
            && self.prerelease == other.prerelease
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.major.hash(state);
        self.minor.hash(state);
        self.patch.hash(state);
        self.prerelease.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch)) {
            Ordering::Equal => match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => compare_prerelease_identifiers(a, b),
            },
            other => other,
        }
    }
}

/// Compare pre-release identifiers according to SemVer precedence
fn compare_prerelease_identifiers(a: &str, b: &str) -> Ordering {
    let a_parts: Vec<&str> = a.split('.').collect();
    let b_parts: Vec<&str> = b.split('.').collect();

    for (a_part, b_part) in a_parts.iter().zip(b_parts.iter()) {
        let ordering = match (a_part.parse::<u64>(), b_part.parse::<u64>()) {
            (Ok(a_num), Ok(b_num)) => a_num.cmp(&b_num),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => a_part.cmp(b_part),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    a_parts.len().cmp(&b_parts.len())
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(ref pre) = self.prerelease {
            write!(f, "-{}", pre)?;
        }
        if let Some(ref build) = self.build_metadata {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}
