use crate::package::PackageDef;

/// Changes that bring an installation to a desired package set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    /// Installed packages absent from the desired set, in installed order
    pub to_uninstall: Vec<PackageDef>,
    /// Desired packages not installed at the desired version, in desired order
    pub to_install: Vec<PackageDef>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.to_uninstall.is_empty() && self.to_install.is_empty()
    }
}

/// Compare a desired package set with the packages installed in a target.
///
/// System-wide packages are never scheduled for removal. A desired package
/// counts as installed only when name and version string both match, so a
/// version change appears in `to_install` without a removal.
pub fn diff(desired: &[PackageDef], existing: &[PackageDef]) -> Diff {
    let to_uninstall = existing
        .iter()
        .filter(|installed| !installed.class.is_system_wide())
        .filter(|installed| !desired.iter().any(|d| d.name == installed.name))
        .cloned()
        .collect();

    let to_install = desired
        .iter()
        .filter(|wanted| {
            !existing.iter().any(|installed| {
                installed.name == wanted.name
                    && installed.version.to_string() == wanted.version.to_string()
            })
        })
        .cloned()
        .collect();

    Diff {
        to_uninstall,
        to_install,
    }
}
