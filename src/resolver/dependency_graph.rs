//! Dependency graph over a package set, used for cycle reporting

use crate::package::PackageDef;
use std::collections::{HashMap, HashSet};

/// Node in the dependency graph
#[derive(Debug, Clone)]
pub struct DependencyNode {
    pub name: String,
    pub dependencies: Vec<String>,
}

/// Dependency graph for tracking package relationships
///
/// Edges to names that are not nodes of the graph are kept but never
/// followed; such dependencies are satisfied outside the set.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: HashMap<String, DependencyNode>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph with one node per package and one edge per declared dependency
    pub fn from_packages<'a>(packages: impl IntoIterator<Item = &'a PackageDef>) -> Self {
        let mut graph = Self::new();
        for package in packages {
            graph.add_node(package.name.clone());
            for dependency in &package.dependencies {
                graph.add_dependency(&package.name, dependency.clone());
            }
        }
        graph
    }

    /// Add a node to the graph. Existing nodes keep their edges.
    pub fn add_node(&mut self, name: String) {
        self.nodes
            .entry(name.clone())
            .or_insert_with(|| DependencyNode {
                name,
                dependencies: Vec::new(),
            });
    }

    /// Add a dependency edge, adding the `from` node if it is missing
    pub fn add_dependency(&mut self, from: &str, to: String) {
        self.add_node(from.to_string());
        if let Some(node) = self.nodes.get_mut(from) {
            if !node.dependencies.contains(&to) {
                node.dependencies.push(to);
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get all node names, sorted
    pub fn node_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Find one dependency cycle, if any.
    ///
    /// The returned path starts and ends with the same package name.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        // Sorted start order keeps the reported cycle stable between runs
        for name in self.node_names() {
            if !visited.contains(&name) {
                if let Some(cycle) = self.find_cycle_dfs(&name, &mut visited, &mut stack) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    /// DFS helper for cycle detection; `stack` is the current path
    fn find_cycle_dfs(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) -> Option<Vec<String>> {
        visited.insert(node.to_string());
        stack.push(node.to_string());

        if let Some(node_data) = self.nodes.get(node) {
            for dep in &node_data.dependencies {
                if !self.nodes.contains_key(dep) {
                    continue;
                }
                if let Some(start) = stack.iter().position(|n| n == dep) {
                    let mut cycle = stack[start..].to_vec();
                    cycle.push(dep.clone());
                    return Some(cycle);
                }
                if !visited.contains(dep) {
                    if let Some(cycle) = self.find_cycle_dfs(dep, visited, stack) {
                        return Some(cycle);
                    }
                }
            }
        }

        stack.pop();
        None
    }
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

    #[test]
    fn test_new_graph() {
        let graph = DependencyGraph::new();
        assert!(graph.is_empty());
    }

    #[test]
    fn test_from_packages() {
        let graph = DependencyGraph::from_packages(&[pkg("A", &[]), pkg("B", &["A", "External"])]);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.node_names(), vec!["A".to_string(), "B".to_string()]);
        assert!(!graph.contains("External"));
        assert_eq!(graph.find_cycle(), None);
    }

    #[test]
    fn test_add_dependency_adds_missing_node() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("A", "B".to_string());
        assert!(graph.contains("A"));
        assert!(!graph.contains("B"));
    }

    #[test]
    fn test_find_cycle_simple() {
        let graph = DependencyGraph::from_packages(&[pkg("A", &["B"]), pkg("B", &["A"])]);
        assert_eq!(
            graph.find_cycle(),
            Some(vec!["A".to_string(), "B".to_string(), "A".to_string()])
        );
    }

    #[test]
    fn test_find_cycle_complex() {
        let graph = DependencyGraph::from_packages(&[
            pkg("Root", &["A"]),
            pkg("A", &["B"]),
            pkg("B", &["C"]),
            pkg("C", &["A"]),
        ]);

        let cycle = graph.find_cycle().unwrap();
        assert_eq!(cycle.first(), cycle.last());
        assert!(!cycle.contains(&"Root".to_string()));
        assert_eq!(cycle.len(), 4);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let graph = DependencyGraph::from_packages(&[pkg("A", &["A"])]);
        assert_eq!(graph.find_cycle(), Some(vec!["A".to_string(), "A".to_string()]));
    }

    #[test]
    fn test_no_circular_dependencies() {
        let graph = DependencyGraph::from_packages(&[
            pkg("A", &["B"]),
            pkg("B", &["C"]),
            pkg("C", &[]),
            pkg("D", &["A", "C", "Missing"]),
        ]);

        assert_eq!(graph.find_cycle(), None);
    }
}
