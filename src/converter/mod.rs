//! Element-level processing: path trees, expansion, constraint chains,
//! dependency ordering and compilation to the emission model.

pub mod compiler;
pub mod constraint_chain;
pub mod dependency;
pub mod element_tree;
pub mod expansion;

pub use compiler::{choice_field_name, compile_definition, compile_tree};
pub use constraint_chain::{
    merge_differential, normalize_differential, overlay_differential, resolve_definition,
    resolve_elements,
};
pub use dependency::{DependencyMap, build_dependency_map, definition_dependencies, topological_sort};
pub use element_tree::{ElementNode, ElementTree};
pub use expansion::{DifferentialIndex, expand_tree};
