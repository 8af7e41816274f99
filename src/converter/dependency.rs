//! Type dependency map and generation order.

use crate::diagnostics::Diagnostics;
use crate::types::{StructureDefinition, StructureDefinitionKind, TypeRegistry};
use indexmap::{IndexMap, IndexSet};

/// Definition id to the ids it depends on (base type and element types).
pub type DependencyMap = IndexMap<String, Vec<String>>;

/// Ids a single definition depends on, excluding itself.
///
/// A constraint depends on its base. Every definition depends on the
/// distinct type codes of its elements, taken from the differential when
/// there is no snapshot.
pub fn definition_dependencies(definition: &StructureDefinition, registry: &TypeRegistry) -> Vec<String> {
    let mut dependencies: IndexSet<String> = IndexSet::new();

    if definition.is_constraint() {
        if let Some(url) = definition.base_definition.as_deref() {
            let base = registry
                .url_to_id(url)
                .map(str::to_string)
                .or_else(|| TypeRegistry::id_from_canonical(url))
                .unwrap_or_else(|| url.to_string());
            dependencies.insert(base);
        }
    }

    let elements = definition
        .snapshot_elements()
        .or_else(|| definition.differential_elements())
        .unwrap_or(&[]);
    for element in elements {
        for ty in element.type_list() {
            dependencies.insert(ty.resolved_code().to_string());
        }
    }

    dependencies.shift_remove(&definition.id);
    dependencies.into_iter().collect()
}

/// Build the dependency map for a definition set.
///
/// Primitive types get an empty entry. Definitions with neither a snapshot
/// nor a differential are left out and reported.
pub fn build_dependency_map<'a, I>(
    definitions: I,
    registry: &TypeRegistry,
    diagnostics: &mut Diagnostics,
) -> DependencyMap
where
    I: IntoIterator<Item = &'a StructureDefinition>,
{
    let mut map = DependencyMap::new();
    for definition in definitions {
        if definition.kind == StructureDefinitionKind::PrimitiveType {
            map.insert(definition.id.clone(), Vec::new());
            continue;
        }
        if definition.snapshot.is_none() && definition.differential.is_none() {
            diagnostics.warning(
                Some(definition.id.as_str()),
                format!(
                    "StructureDefinition {} has neither snapshot nor differential, skipping",
                    definition.id
                ),
            );
            continue;
        }
        map.insert(
            definition.id.clone(),
            definition_dependencies(definition, registry),
        );
    }
    map
}

/// Dependency-first order over the keys of `map`.
///
/// Depth-first with a visiting set: an edge back into the current path is
/// cut, so cycles terminate and every key appears exactly once. Dependencies
/// that are not keys are ignored.
pub fn topological_sort(map: &DependencyMap) -> Vec<String> {
    let mut order: IndexSet<String> = IndexSet::with_capacity(map.len());
    let mut visiting: IndexSet<&str> = IndexSet::new();

    for key in map.keys() {
        visit(key, map, &mut visiting, &mut order);
    }

    order.into_iter().collect()
}

fn visit<'a>(
    id: &'a str,
    map: &'a DependencyMap,
    visiting: &mut IndexSet<&'a str>,
    order: &mut IndexSet<String>,
) {
    if order.contains(id) {
        return;
    }
    if !visiting.insert(id) {
        tracing::debug!("Dependency cycle through {}", id);
        return;
    }

    if let Some(dependencies) = map.get(id) {
        for dependency in dependencies {
            if map.contains_key(dependency) {
                visit(dependency, map, visiting, order);
            }
        }
    }

    visiting.shift_remove(id);
    order.insert(id.to_string());
}
