//! Compile a resolved element tree into a [`SchemaModel`].

use crate::converter::constraint_chain::resolve_elements;
use crate::converter::element_tree::{ElementNode, ElementTree, is_ancestor_path};
use crate::converter::expansion::content_reference_target;
use crate::error::{Result, SchemaGenError};
use crate::types::{
    Cardinality, DefinitionIndex, FieldDescriptor, FieldShape, ObjectEntry, ObjectShape,
    PrimitiveType, SchemaHeader, SchemaModel, StructureDefinition, TypeRegistry,
};

/// Resolve `definition` (folding its constraint chain if it is a profile)
/// and compile the result.
pub fn compile_definition(
    definition: &StructureDefinition,
    definitions: &DefinitionIndex,
    registry: &TypeRegistry,
) -> Result<SchemaModel> {
    let elements = resolve_elements(definition, definitions, registry)?;
    let tree = ElementTree::build(&elements)?;
    compile_tree(&tree, SchemaHeader::from_definition(definition))
}

pub fn compile_tree(tree: &ElementTree, header: SchemaHeader) -> Result<SchemaModel> {
    let compiler = TreeCompiler {
        tree,
        root_type: tree.root_path(),
    };
    let root = compiler.compile_object(tree.root_path())?;
    Ok(SchemaModel { header, root })
}

/// `value` + `dateTime` -> `valueDateTime`
pub fn choice_field_name(base: &str, type_code: &str) -> String {
    let type_name = type_code.rsplit(['/', '.']).next().unwrap_or(type_code);
    let mut chars = type_name.chars();
    match chars.next() {
        Some(first) => format!("{}{}{}", base, first.to_uppercase(), chars.as_str()),
        None => base.to_string(),
    }
}

struct TreeCompiler<'a> {
    tree: &'a ElementTree,
    root_type: &'a str,
}

impl TreeCompiler<'_> {
    fn compile_object(&self, path: &str) -> Result<ObjectShape> {
        let mut shape = ObjectShape::new(path);
        for child in self.tree.child_nodes(path) {
            for entry in self.compile_node(child)? {
                shape.push(entry);
            }
        }
        Ok(shape)
    }

    fn compile_node(&self, node: &ElementNode) -> Result<Vec<ObjectEntry>> {
        let element = &node.element;
        let cardinality = Cardinality::from_element(element)?;
        let name = element.name();

        if cardinality.is_excluded() {
            return Ok(vec![ObjectEntry::Omitted {
                name: name.to_string(),
                path: node.path.clone(),
            }]);
        }

        if element.is_choice() {
            return self.compile_choice(node, cardinality);
        }

        let shape = if !node.is_leaf() {
            FieldShape::Object(self.compile_object(&node.path)?)
        } else if let Some(reference) = element.content_reference.as_deref() {
            FieldShape::ContentReference {
                target: self.check_content_reference(&node.path, reference)?,
            }
        } else {
            let codes = element.resolved_type_codes();
            match codes.as_slice() {
                [] => {
                    return Err(SchemaGenError::malformed_element(
                        node.path.as_str(),
                        "element has neither type nor contentReference",
                    ));
                }
                [code] => self.leaf_shape(code),
                _ => return Err(SchemaGenError::ambiguous_type(node.path.as_str(), codes.len())),
            }
        };

        Ok(vec![ObjectEntry::Field(FieldDescriptor {
            name: name.to_string(),
            path: node.path.clone(),
            cardinality,
            shape,
            choice_of: None,
        })])
    }

    /// One field per allowed type: `value[x]` -> `valueString`, `valueQuantity`, ...
    fn compile_choice(&self, node: &ElementNode, cardinality: Cardinality) -> Result<Vec<ObjectEntry>> {
        let base = node.element.name().trim_end_matches("[x]");
        let codes = node.element.resolved_type_codes();
        if codes.is_empty() {
            return Err(SchemaGenError::malformed_element(
                node.path.as_str(),
                "choice element declares no types",
            ));
        }

        if !node.is_leaf() {
            // Narrowed during expansion and grown from its single type.
            if codes.len() != 1 {
                return Err(SchemaGenError::ambiguous_type(node.path.as_str(), codes.len()));
            }
            return Ok(vec![ObjectEntry::Field(FieldDescriptor {
                name: choice_field_name(base, codes[0]),
                path: node.path.clone(),
                cardinality,
                shape: FieldShape::Object(self.compile_object(&node.path)?),
                choice_of: Some(base.to_string()),
            })]);
        }

        // Every alternative carries the choice element's own cardinality.
        Ok(codes
            .into_iter()
            .map(|code| {
                ObjectEntry::Field(FieldDescriptor {
                    name: choice_field_name(base, code),
                    path: node.path.clone(),
                    cardinality,
                    shape: self.leaf_shape(code),
                    choice_of: Some(base.to_string()),
                })
            })
            .collect())
    }

    fn leaf_shape(&self, code: &str) -> FieldShape {
        match PrimitiveType::from_code(code) {
            Some(primitive) => FieldShape::Primitive {
                type_code: code.to_string(),
                primitive,
            },
            None => FieldShape::Reference {
                type_code: code.to_string(),
                deferred: code == self.root_type,
            },
        }
    }

    fn check_content_reference(&self, path: &str, reference: &str) -> Result<String> {
        let target = content_reference_target(reference);
        if !reference.contains('#')
            || (target != self.root_type && !is_ancestor_path(self.root_type, target))
        {
            return Err(SchemaGenError::invalid_content_reference(
                path,
                reference,
                self.root_type,
            ));
        }
        if !self.tree.contains(target) {
            return Err(SchemaGenError::unresolved_content_reference(path, reference));
        }
        Ok(target.to_string())
    }
}
