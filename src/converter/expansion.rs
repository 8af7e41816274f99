//! Tree expansion: before a differential can be overlaid, every leaf it
//! constrains below must be grown from the leaf's type definition.

use crate::converter::element_tree::{ElementTree, is_ancestor_path, parent_path};
use crate::error::{Result, SchemaGenError};
use crate::types::{DefinitionIndex, ElementDefinition, ElementType};
use indexmap::IndexMap;

/// Differential elements by path, plus which paths have descendants
/// constrained in the differential.
#[derive(Debug, Clone, Default)]
pub struct DifferentialIndex {
    elements: IndexMap<String, ElementDefinition>,
    children: IndexMap<String, Vec<String>>,
}

impl DifferentialIndex {
    pub fn new(differential: &[ElementDefinition]) -> Self {
        let mut index = Self::default();
        for element in differential {
            index
                .elements
                .insert(element.path.clone(), element.clone());

            // Register every proper prefix so intermediate paths that the
            // differential skips still report their constrained descendants.
            let mut child = element.path.as_str();
            while let Some(parent) = parent_path(child) {
                let entry = index.children.entry(parent.to_string()).or_default();
                if !entry.iter().any(|c| c == child) {
                    entry.push(child.to_string());
                }
                child = parent;
            }
        }
        index
    }

    pub fn has_children(&self, path: &str) -> bool {
        self.children
            .get(path)
            .is_some_and(|children| !children.is_empty())
    }

    pub fn children_of(&self, path: &str) -> &[String] {
        self.children
            .get(path)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn element(&self, path: &str) -> Option<&ElementDefinition> {
        self.elements.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.elements.keys().map(String::as_str)
    }
}

/// Grow `base` so that every path `index` constrains exists in the result.
///
/// Leaves with constrained descendants are expanded from their type's
/// snapshot (or from the element their contentReference points at). Choice
/// leaves are narrowed to one type, or get concrete siblings such as
/// `valueQuantity` when the differential names them.
pub fn expand_tree(
    base: &ElementTree,
    index: &DifferentialIndex,
    definitions: &DefinitionIndex,
) -> Result<ElementTree> {
    let mut tree = base.clone();
    let mut stack: Vec<String> = vec![tree.root_path().to_string()];

    while let Some(path) = stack.pop() {
        let Some(node) = tree.get(&path) else {
            continue;
        };

        if !node.is_leaf() {
            push_children(&tree, &path, &mut stack);
            continue;
        }

        if index.has_children(&path) {
            let element = node.element.clone();
            if element.is_choice() {
                narrow_choice(&mut tree, &path, &element, index, definitions)?;
            } else if let Some(reference) = element.content_reference.as_deref() {
                splice_content_reference(&mut tree, &path, reference)?;
            } else {
                let codes = element.resolved_type_codes();
                if codes.len() != 1 {
                    return Err(SchemaGenError::ambiguous_type(path.as_str(), codes.len()));
                }
                splice_type(&mut tree, &path, codes[0], definitions)?;
            }
            push_children(&tree, &path, &mut stack);
            continue;
        }

        if node.element.is_choice() {
            let element = node.element.clone();
            for sibling in add_choice_siblings(&mut tree, &path, &element, index)? {
                stack.push(sibling);
            }
        }
    }

    Ok(tree)
}

fn push_children(tree: &ElementTree, path: &str, stack: &mut Vec<String>) {
    for child in tree.children(path).iter().rev() {
        stack.push(child.clone());
    }
}

/// Copy `type_code`'s snapshot elements below `path`, renaming the type's
/// root segment to `path`.
fn splice_type(
    tree: &mut ElementTree,
    path: &str,
    type_code: &str,
    definitions: &DefinitionIndex,
) -> Result<()> {
    let definition = definitions
        .get(type_code)
        .ok_or_else(|| SchemaGenError::type_not_found(path, type_code))?;
    let elements = definition
        .snapshot_elements()
        .ok_or_else(|| SchemaGenError::missing_snapshot(type_code))?;

    tracing::trace!("Expanding {} from {} snapshot", path, type_code);

    let renamed = elements
        .iter()
        .skip(1)
        .filter_map(|element| {
            let (_, rest) = element.path.split_once('.')?;
            Some(element.relocated(format!("{path}.{rest}")))
        })
        .collect();
    tree.graft(renamed)
}

/// Strip `#` and any canonical URL before it from a contentReference.
pub fn content_reference_target(reference: &str) -> &str {
    reference
        .rsplit_once('#')
        .map(|(_, target)| target)
        .unwrap_or(reference)
}

fn splice_content_reference(tree: &mut ElementTree, path: &str, reference: &str) -> Result<()> {
    let target = content_reference_target(reference);
    if !is_ancestor_path(tree.root_path(), target) {
        return Err(SchemaGenError::invalid_content_reference(
            path,
            reference,
            tree.root_path(),
        ));
    }
    if !tree.contains(target) {
        return Err(SchemaGenError::unresolved_content_reference(path, reference));
    }
    if target == path {
        return Err(SchemaGenError::malformed_element(
            path,
            "contentReference points at its own element",
        ));
    }

    // A recursive target contains `path` itself. Copying it as it stands
    // turns the copy of `path` into a new contentReference leaf one level
    // down, so each expansion grows the tree by exactly one level.
    if is_ancestor_path(target, path) {
        tracing::debug!(
            "Expanding recursive contentReference {} at {} by one level",
            reference,
            path
        );
    }

    let renamed = tree
        .subtree_elements(target)
        .into_iter()
        .skip(1)
        .map(|element| {
            let rest = &element.path[target.len()..];
            element.relocated(format!("{path}{rest}"))
        })
        .collect();
    tree.graft(renamed)?;

    // Once grafted the node is an inline object, not a reference.
    let expanded = tree
        .get(path)
        .filter(|node| !node.is_leaf())
        .map(|node| ElementDefinition {
            content_reference: None,
            ..node.element.clone()
        });
    if let Some(expanded) = expanded {
        tree.replace_element(path, expanded)?;
    }
    Ok(())
}

/// A choice leaf with constrained descendants must collapse to one type.
fn narrow_choice(
    tree: &mut ElementTree,
    path: &str,
    element: &ElementDefinition,
    index: &DifferentialIndex,
    definitions: &DefinitionIndex,
) -> Result<()> {
    let declared = match index.element(path) {
        Some(diff) if !diff.type_list().is_empty() => diff.type_list().to_vec(),
        Some(_) | None => element.type_list().to_vec(),
    };
    if declared.len() != 1 {
        return Err(SchemaGenError::ambiguous_type(path, declared.len()));
    }

    let wanted = declared[0].resolved_code();
    let narrowed = find_choice_type(element.type_list(), wanted)
        .cloned()
        .ok_or_else(|| SchemaGenError::unknown_choice_type(path, wanted))?;
    let code = narrowed.resolved_code().to_string();

    let mut updated = element.clone();
    updated.types = Some(vec![narrowed]);
    tree.replace_element(path, updated)?;
    splice_type(tree, path, &code, definitions)
}

fn find_choice_type<'a>(types: &'a [ElementType], suffix: &str) -> Option<&'a ElementType> {
    types
        .iter()
        .find(|ty| ty.resolved_code().eq_ignore_ascii_case(suffix))
}

/// For a leaf `value[x]`, create one concrete sibling (`valueQuantity`) per
/// differential path under the same parent that starts with `value`.
/// Returns the new sibling paths.
fn add_choice_siblings(
    tree: &mut ElementTree,
    path: &str,
    element: &ElementDefinition,
    index: &DifferentialIndex,
) -> Result<Vec<String>> {
    let Some(parent) = parent_path(path) else {
        return Ok(Vec::new());
    };
    let base_path = path.trim_end_matches("[x]");
    let base_name = element.name().trim_end_matches("[x]");

    let candidates: Vec<String> = index
        .children_of(parent)
        .iter()
        .filter(|child| child.as_str() != path && child.starts_with(base_path))
        .filter(|child| !tree.contains(child))
        .cloned()
        .collect();

    let mut previous = path.to_string();
    let mut created = Vec::new();
    for candidate in candidates {
        let name = candidate.rsplit('.').next().unwrap_or(&candidate);
        let suffix = &name[base_name.len()..];
        if suffix == "[x]" {
            continue;
        }
        let choice = find_choice_type(element.type_list(), suffix)
            .cloned()
            .ok_or_else(|| SchemaGenError::unknown_choice_type(candidate.as_str(), suffix))?;

        let mut sibling = element.relocated(candidate.as_str());
        sibling.types = Some(vec![choice]);
        tree.insert_after(&previous, sibling)?;

        tracing::trace!("Added concrete choice element {}", candidate);
        previous = candidate.clone();
        created.push(candidate);
    }
    Ok(created)
}
