//! Hierarchical view of a flat, pre-ordered element list.
//!
//! Nodes live in an arena keyed by path; parents hold the ordered list of
//! their children's paths. Cloning a tree is a deep copy, so transformations
//! take `&ElementTree` and return a new tree without touching their input.

use crate::error::{Result, SchemaGenError};
use crate::types::ElementDefinition;
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub path: String,
    pub element: ElementDefinition,
    pub parent: Option<String>,
    pub children: Vec<String>,
}

impl ElementNode {
    fn new(element: ElementDefinition, parent: Option<String>) -> Self {
        Self {
            path: element.path.clone(),
            element,
            parent,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementTree {
    root: String,
    nodes: IndexMap<String, ElementNode>,
}

/// `ancestor` is a strict dot-boundary prefix of `path`.
pub fn is_ancestor_path(ancestor: &str, path: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'.'
}

pub fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(parent, _)| parent)
}

impl ElementTree {
    /// Build a tree from a pre-ordered element list. The first element is
    /// the root; every other element must follow its direct parent.
    ///
    /// Repeated paths (slice entries in a snapshot) are skipped, so the
    /// tree holds exactly one node per path.
    pub fn build(elements: &[ElementDefinition]) -> Result<Self> {
        let (first, rest) = elements
            .split_first()
            .ok_or_else(|| SchemaGenError::empty_element_list("cannot build element tree"))?;

        let mut tree = Self {
            root: first.path.clone(),
            nodes: IndexMap::new(),
        };
        tree.nodes
            .insert(first.path.clone(), ElementNode::new(first.clone(), None));

        let mut stack: Vec<String> = vec![first.path.clone()];
        for element in rest {
            if tree.nodes.contains_key(&element.path) {
                tracing::trace!("Skipping repeated element path {}", element.path);
                continue;
            }

            while let Some(top) = stack.last() {
                if is_ancestor_path(top, &element.path) {
                    break;
                }
                stack.pop();
            }

            let expected_parent = parent_path(&element.path).unwrap_or_default();
            match stack.last() {
                Some(top) if top == expected_parent => {}
                _ => {
                    return Err(SchemaGenError::element_order(
                        element.path.as_str(),
                        expected_parent,
                    ));
                }
            }

            tree.attach(expected_parent.to_string(), element.clone(), None);
            stack.push(element.path.clone());
        }

        Ok(tree)
    }

    fn attach(&mut self, parent: String, element: ElementDefinition, position: Option<usize>) {
        let path = element.path.clone();
        if let Some(parent_node) = self.nodes.get_mut(&parent) {
            match position {
                Some(index) if index <= parent_node.children.len() => {
                    parent_node.children.insert(index, path.clone())
                }
                _ => parent_node.children.push(path.clone()),
            }
        }
        self.nodes
            .insert(path, ElementNode::new(element, Some(parent)));
    }

    pub fn root_path(&self) -> &str {
        &self.root
    }

    pub fn root(&self) -> &ElementNode {
        // The root is inserted at construction and never removed.
        &self.nodes[0]
    }

    pub fn get(&self, path: &str) -> Option<&ElementNode> {
        self.nodes.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, path: &str) -> &[String] {
        self.nodes
            .get(path)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn child_nodes<'a>(&'a self, path: &str) -> impl Iterator<Item = &'a ElementNode> + 'a {
        self.children(path)
            .iter()
            .filter_map(move |child| self.nodes.get(child))
    }

    /// Closest ancestor of `path` (not `path` itself) present in the tree.
    pub fn nearest_existing_ancestor(&self, path: &str) -> Option<&str> {
        let mut current = parent_path(path);
        while let Some(candidate) = current {
            if let Some((key, _)) = self.nodes.get_key_value(candidate) {
                return Some(key.as_str());
            }
            current = parent_path(candidate);
        }
        None
    }

    /// Replace the element stored at `path`, keeping its position and
    /// children.
    pub fn replace_element(&mut self, path: &str, element: ElementDefinition) -> Result<()> {
        let node = self
            .nodes
            .get_mut(path)
            .ok_or_else(|| SchemaGenError::element_not_found(path))?;
        node.element = ElementDefinition {
            path: path.to_string(),
            ..element
        };
        Ok(())
    }

    /// Append `element` as the last child of `parent`.
    pub fn insert_child(&mut self, parent: &str, element: ElementDefinition) -> Result<()> {
        self.check_insertable(parent, &element)?;
        self.attach(parent.to_string(), element, None);
        Ok(())
    }

    /// Insert `element` directly after `sibling`, under the same parent.
    pub fn insert_after(&mut self, sibling: &str, element: ElementDefinition) -> Result<()> {
        let parent = self
            .nodes
            .get(sibling)
            .and_then(|node| node.parent.clone())
            .ok_or_else(|| SchemaGenError::element_not_found(sibling))?;
        self.check_insertable(&parent, &element)?;

        let position = self
            .children(&parent)
            .iter()
            .position(|child| child == sibling)
            .map(|index| index + 1);
        self.attach(parent, element, position);
        Ok(())
    }

    fn check_insertable(&self, parent: &str, element: &ElementDefinition) -> Result<()> {
        if !self.nodes.contains_key(parent) {
            return Err(SchemaGenError::element_not_found(parent));
        }
        if self.nodes.contains_key(&element.path) {
            return Err(SchemaGenError::malformed_element(
                element.path.as_str(),
                "element path already present in tree",
            ));
        }
        Ok(())
    }

    /// Graft pre-ordered elements below existing nodes. Each element is
    /// attached to its direct parent, which must already exist (either in
    /// the tree or earlier in `elements`).
    pub fn graft(&mut self, elements: Vec<ElementDefinition>) -> Result<()> {
        for element in elements {
            if self.nodes.contains_key(&element.path) {
                continue;
            }
            let parent = parent_path(&element.path)
                .ok_or_else(|| SchemaGenError::element_order(element.path.as_str(), ""))?
                .to_string();
            if !self.nodes.contains_key(&parent) {
                return Err(SchemaGenError::element_order(element.path, parent));
            }
            self.attach(parent, element, None);
        }
        Ok(())
    }

    /// Pre-order paths of the subtree rooted at `path`, `path` first.
    pub fn subtree_paths(&self, path: &str) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack: Vec<&str> = Vec::new();
        if let Some((key, _)) = self.nodes.get_key_value(path) {
            stack.push(key.as_str());
        }
        while let Some(current) = stack.pop() {
            out.push(current);
            for child in self.children(current).iter().rev() {
                stack.push(child.as_str());
            }
        }
        out
    }

    /// Copies of the elements in the subtree at `path`, pre-ordered.
    pub fn subtree_elements(&self, path: &str) -> Vec<ElementDefinition> {
        self.subtree_paths(path)
            .into_iter()
            .filter_map(|p| self.nodes.get(p))
            .map(|node| node.element.clone())
            .collect()
    }

    pub fn paths(&self) -> Vec<&str> {
        self.subtree_paths(&self.root)
    }

    /// Flatten back to a pre-ordered element list.
    pub fn to_elements(&self) -> Vec<ElementDefinition> {
        self.subtree_elements(&self.root)
    }
}
