//! Dependency ordering for install and uninstall passes

pub mod dependency_graph;
pub mod install_order;

pub use dependency_graph::{DependencyGraph, DependencyNode};
pub use install_order::{order_for_install, order_for_uninstall};
