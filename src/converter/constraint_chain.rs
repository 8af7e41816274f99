//! Constraint chain resolution: turn a profile into a full element list by
//! folding every differential on its baseDefinition chain onto the root
//! specialization's snapshot.

use crate::converter::element_tree::ElementTree;
use crate::converter::expansion::{DifferentialIndex, expand_tree};
use crate::error::{Result, SchemaGenError};
use crate::types::{DefinitionIndex, ElementDefinition, ElementList, StructureDefinition, TypeRegistry};
use std::collections::HashSet;

/// Rewrite differential paths into the form the tree uses and drop what
/// cannot be expressed there.
///
/// A type slice on a choice (`Observation.value[x]:valueQuantity`) becomes
/// the concrete path `Observation.valueQuantity`. Any other slice-scoped
/// element is dropped because the tree holds one node per path. An element
/// is slice-scoped when its id names a slice or when it carries a
/// `sliceName` of its own.
pub fn normalize_differential(differential: &[ElementDefinition]) -> Vec<ElementDefinition> {
    let mut normalized = Vec::with_capacity(differential.len());
    for element in differential {
        let Some(slice_id) = slice_id(element) else {
            normalized.push(element.clone());
            continue;
        };
        match concrete_choice_path(&slice_id) {
            Some(path) => normalized.push(element.relocated(path)),
            None => tracing::trace!("Dropping slice-scoped differential element {}", slice_id),
        }
    }
    normalized
}

/// `Some` for slice-scoped elements: the id when it names the slice,
/// otherwise `path:sliceName`.
fn slice_id(element: &ElementDefinition) -> Option<String> {
    if let Some(id) = element.id.as_deref().filter(|id| id.contains(':')) {
        return Some(id.to_string());
    }
    element
        .slice_name
        .as_deref()
        .map(|slice| format!("{}:{}", element.path, slice))
}

fn concrete_choice_path(id: &str) -> Option<String> {
    let mut segments = Vec::new();
    for segment in id.split('.') {
        match segment.split_once(':') {
            None => segments.push(segment.to_string()),
            Some((name, slice)) => {
                let base = name.strip_suffix("[x]")?;
                if slice.len() <= base.len() || !slice.starts_with(base) {
                    return None;
                }
                segments.push(slice.to_string());
            }
        }
    }
    Some(segments.join("."))
}

/// Overlay differential elements onto an expanded tree.
///
/// Elements at existing paths are merged field by field. Elements whose
/// path is missing are appended under their parent, or under the closest
/// existing ancestor when the parent is missing too.
pub fn overlay_differential(tree: &ElementTree, differential: &[ElementDefinition]) -> Result<ElementTree> {
    let mut merged = tree.clone();
    for diff in differential {
        if let Some(node) = merged.get(&diff.path) {
            let element = node.element.overlay(diff);
            merged.replace_element(&diff.path, element)?;
            continue;
        }

        let ancestor = merged
            .nearest_existing_ancestor(&diff.path)
            .ok_or_else(|| SchemaGenError::element_not_found(diff.path.as_str()))?
            .to_string();
        if diff.parent_path() != Some(ancestor.as_str()) {
            tracing::warn!(
                "Parent of {} not found, appending under {}",
                diff.path,
                ancestor
            );
        }
        merged.insert_child(&ancestor, diff.clone())?;
    }
    Ok(merged)
}

/// One fold step: build, expand, overlay, flatten.
pub fn merge_differential(
    base: &[ElementDefinition],
    differential: &[ElementDefinition],
    definitions: &DefinitionIndex,
) -> Result<Vec<ElementDefinition>> {
    let differential = normalize_differential(differential);
    let tree = ElementTree::build(base)?;
    let index = DifferentialIndex::new(&differential);
    let expanded = expand_tree(&tree, &index, definitions)?;
    let merged = overlay_differential(&expanded, &differential)?;
    Ok(merged.to_elements())
}

/// Resolve the full element list for `definition`.
///
/// Non-constraint definitions return their snapshot unchanged. Constraints
/// walk baseDefinition links to the nearest specialization and fold every
/// differential on the way, base first.
pub fn resolve_elements(
    definition: &StructureDefinition,
    definitions: &DefinitionIndex,
    registry: &TypeRegistry,
) -> Result<Vec<ElementDefinition>> {
    if !definition.is_constraint() {
        return definition
            .snapshot_elements()
            .map(<[ElementDefinition]>::to_vec)
            .ok_or_else(|| SchemaGenError::missing_snapshot(definition.id.as_str()));
    }

    let mut chain: Vec<&StructureDefinition> = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut current = definition;
    while current.is_constraint() {
        if !visited.insert(current.id.as_str()) {
            return Err(SchemaGenError::circular_base_definition(current.id.as_str()));
        }
        chain.push(current);

        let base_url = current
            .base_definition
            .as_deref()
            .ok_or_else(|| SchemaGenError::missing_base_definition(current.id.as_str()))?;
        let base_id = registry
            .url_to_id(base_url)
            .ok_or_else(|| SchemaGenError::unresolved_base_url(current.id.as_str(), base_url))?;
        current = definitions.get(base_id).ok_or_else(|| {
            SchemaGenError::base_definition_not_found(current.id.as_str(), base_id)
        })?;
    }

    let mut elements = current
        .snapshot_elements()
        .map(<[ElementDefinition]>::to_vec)
        .ok_or_else(|| SchemaGenError::missing_snapshot(current.id.as_str()))?;

    tracing::debug!(
        "Resolving {} over {} with {} constraint level(s)",
        definition.id,
        current.id,
        chain.len()
    );

    for level in chain.iter().rev() {
        match level.differential_elements() {
            Some(differential) => {
                elements = merge_differential(&elements, differential, definitions)?;
            }
            None => {
                tracing::warn!("Constraint {} has no differential, treating as empty", level.id);
            }
        }
    }

    Ok(elements)
}

/// Copy of `definition` whose snapshot is the resolved element list.
pub fn resolve_definition(
    definition: &StructureDefinition,
    definitions: &DefinitionIndex,
    registry: &TypeRegistry,
) -> Result<StructureDefinition> {
    let elements = resolve_elements(definition, definitions, registry)?;
    let mut resolved = definition.clone();
    resolved.snapshot = Some(ElementList { element: elements });
    Ok(resolved)
}
