//! Install and uninstall ordering of package sets

use crate::core::{ImageError, ImageResult};
use crate::package::PackageDef;
use crate::resolver::dependency_graph::DependencyGraph;
use std::collections::HashSet;

/// Order packages so every package comes after the packages it depends on.
///
/// Works in layers: each pass places every remaining package whose
/// dependencies are no longer among the remaining packages, keeping input
/// order within the pass. Dependencies on names outside the set count as
/// satisfied. A pass that places nothing means the remaining packages form
/// a cycle, reported as `CyclicDependency`.
pub fn order_for_install(packages: &[PackageDef]) -> ImageResult<Vec<PackageDef>> {
    let mut remaining: Vec<&PackageDef> = packages.iter().collect();
    let mut ordered = Vec::with_capacity(packages.len());

    while !remaining.is_empty() {
        let remaining_names: HashSet<&str> = remaining.iter().map(|&p| p.name.as_str()).collect();

        let (ready, blocked): (Vec<&PackageDef>, Vec<&PackageDef>) =
            remaining.into_iter().partition(|pkg| {
                pkg.dependencies
                    .iter()
                    .all(|dep| !remaining_names.contains(dep.as_str()))
            });

        if ready.is_empty() {
            return Err(cycle_error(&blocked));
        }

        ordered.extend(ready.into_iter().cloned());
        remaining = blocked;
    }

    Ok(ordered)
}

/// Order packages for removal: the exact reverse of the install order, so
/// dependents are removed before their dependencies.
pub fn order_for_uninstall(packages: &[PackageDef]) -> ImageResult<Vec<PackageDef>> {
    let mut ordered = order_for_install(packages)?;
    ordered.reverse();
    Ok(ordered)
}

fn cycle_error(blocked: &[&PackageDef]) -> ImageError {
    let graph = DependencyGraph::from_packages(blocked.iter().copied());
    let packages = graph.find_cycle().unwrap_or_else(|| graph.node_names());
    ImageError::CyclicDependency { packages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Version;

    fn pkg(name: &str, deps: &[&str]) -> PackageDef {
        deps.iter().fold(
            PackageDef::new(name, Version::new(1, 0, 0)),
            |p, d| p.with_dependency(*d),
        )
    }

    fn names(packages: &[PackageDef]) -> Vec<&str> {
        packages.iter().map(|p| p.name.as_str()).collect()
    }

    fn position(packages: &[PackageDef], name: &str) -> usize {
        packages.iter().position(|p| p.name == name).unwrap()
    }

    #[test]
    fn test_dependency_installed_first() {
        let ordered = order_for_install(&[pkg("B", &["A"]), pkg("A", &[])]).unwrap();
        assert_eq!(names(&ordered), vec!["A", "B"]);
    }

    #[test]
    fn test_layers_keep_input_order() {
        let packages = vec![
            pkg("App", &["Lib", "Core"]),
            pkg("Core", &[]),
            pkg("Lib", &["Core"]),
            pkg("Docs", &[]),
        ];
        let ordered = order_for_install(&packages).unwrap();
        assert_eq!(names(&ordered), vec!["Core", "Docs", "Lib", "App"]);
    }

    #[test]
    fn test_every_package_after_its_dependencies() {
        let packages = vec![
            pkg("E", &["D", "B"]),
            pkg("D", &["C"]),
            pkg("C", &["A", "B"]),
            pkg("B", &["A"]),
            pkg("A", &[]),
        ];
        let ordered = order_for_install(&packages).unwrap();
        assert_eq!(ordered.len(), packages.len());
        for package in &ordered {
            for dep in &package.dependencies {
                assert!(position(&ordered, dep) < position(&ordered, &package.name));
            }
        }
    }

    #[test]
    fn test_missing_dependency_is_satisfied() {
        let ordered = order_for_install(&[pkg("Plugin", &["AlreadyInstalled"])]).unwrap();
        assert_eq!(names(&ordered), vec!["Plugin"]);
    }

    #[test]
    fn test_uninstall_is_reverse_of_install() {
        let packages = vec![pkg("C", &["B"]), pkg("A", &[]), pkg("B", &["A"]), pkg("X", &[])];
        let mut install = order_for_install(&packages).unwrap();
        let uninstall = order_for_uninstall(&packages).unwrap();
        install.reverse();
        assert_eq!(install, uninstall);
        assert_eq!(names(&uninstall), vec!["C", "B", "X", "A"]);
    }

    #[test]
    fn test_cycle_is_an_error() {
        let result = order_for_install(&[pkg("A", &["B"]), pkg("B", &["A"]), pkg("C", &[])]);
        match result {
            Err(ImageError::CyclicDependency { packages }) => {
                assert_eq!(packages, vec!["A", "B", "A"]);
            }
            other => panic!("expected cyclic dependency error, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_behind_acyclic_prefix() {
        let result = order_for_uninstall(&[
            pkg("Base", &[]),
            pkg("X", &["Base", "Z"]),
            pkg("Y", &["X"]),
            pkg("Z", &["Y"]),
        ]);
        assert!(matches!(result, Err(ImageError::CyclicDependency { .. })));
    }

    #[test]
    fn test_empty_set() {
        assert!(order_for_install(&[]).unwrap().is_empty());
    }
}
