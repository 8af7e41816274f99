//! Emission model: a format-independent description of one generated
//! schema. Backends in [`crate::codegen`] render it to text.

use crate::error::{Result, SchemaGenError};
use crate::types::{ElementDefinition, PrimitiveType, StructureDefinition, StructureDefinitionKind};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Max {
    Unbounded,
    Bounded(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    pub min: u32,
    pub max: Max,
}

impl Cardinality {
    pub fn new(min: u32, max: Max) -> Self {
        Self { min, max }
    }

    /// Cardinality of an element. Absent `min` is 0 and absent `max` is 1.
    pub fn from_element(element: &ElementDefinition) -> Result<Self> {
        let min = element.min.unwrap_or(0);
        let max = match element.max.as_deref() {
            None => Max::Bounded(1),
            Some("*") => Max::Unbounded,
            Some(value) => value.parse::<u32>().map(Max::Bounded).map_err(|_| {
                SchemaGenError::malformed_element(
                    element.path.clone(),
                    format!("invalid max cardinality '{value}'"),
                )
            })?,
        };
        Ok(Self { min, max })
    }

    pub fn is_excluded(&self) -> bool {
        self.min == 0 && self.max == Max::Bounded(0)
    }

    pub fn is_optional(&self) -> bool {
        self.min == 0
    }

    pub fn is_array(&self) -> bool {
        match self.max {
            Max::Unbounded => true,
            Max::Bounded(n) => n > 1,
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Max::Unbounded => write!(f, "{}..*", self.min),
            Max::Bounded(n) => write!(f, "{}..{}", self.min, n),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldShape {
    Primitive {
        type_code: String,
        primitive: PrimitiveType,
    },
    /// Reference to another generated schema. Deferred references must be
    /// emitted lazily because the target is not yet defined at that point.
    Reference { type_code: String, deferred: bool },
    /// Reuses the structure of another element in the same model
    ContentReference { target: String },
    Object(ObjectShape),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub path: String,
    pub cardinality: Cardinality,
    pub shape: FieldShape,
    /// Base name (`value`) when the field was produced from a choice element
    pub choice_of: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectEntry {
    Field(FieldDescriptor),
    /// Prohibited (0..0) element, kept so backends can document it
    Omitted { name: String, path: String },
}

impl ObjectEntry {
    pub fn name(&self) -> &str {
        match self {
            Self::Field(field) => &field.name,
            Self::Omitted { name, .. } => name,
        }
    }

    pub fn as_field(&self) -> Option<&FieldDescriptor> {
        match self {
            Self::Field(field) => Some(field),
            Self::Omitted { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectShape {
    pub path: String,
    pub entries: Vec<ObjectEntry>,
}

impl ObjectShape {
    pub fn new<S: Into<String>>(path: S) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
        }
    }

    /// Add an entry. An entry with the same name replaces the earlier one
    /// in place, which lets a narrowed choice sibling override the field
    /// generated from the generic choice element.
    pub fn push(&mut self, entry: ObjectEntry) {
        match self.entries.iter().position(|e| e.name() == entry.name()) {
            Some(index) => self.entries[index] = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.entries
            .iter()
            .filter_map(ObjectEntry::as_field)
            .find(|field| field.name == name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.entries.iter().filter_map(ObjectEntry::as_field)
    }

    pub fn omitted(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            ObjectEntry::Omitted { name, .. } => Some(name.as_str()),
            ObjectEntry::Field(_) => None,
        })
    }

    fn visit<'a>(&'a self, out: &mut Vec<&'a FieldDescriptor>) {
        for field in self.fields() {
            out.push(field);
            if let FieldShape::Object(inner) = &field.shape {
                inner.visit(out);
            }
        }
    }

    fn visit_mut(&mut self, f: &mut impl FnMut(&mut FieldDescriptor)) {
        for entry in &mut self.entries {
            if let ObjectEntry::Field(field) = entry {
                f(field);
                if let FieldShape::Object(inner) = &mut field.shape {
                    inner.visit_mut(f);
                }
            }
        }
    }

    fn find_object(&self, path: &str) -> Option<&ObjectShape> {
        if self.path == path {
            return Some(self);
        }
        self.fields().find_map(|field| match &field.shape {
            FieldShape::Object(inner) => inner.find_object(path),
            _ => None,
        })
    }
}

/// Identity of a generated schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaHeader {
    pub type_id: String,
    pub url: String,
    pub root_type: String,
    pub kind: StructureDefinitionKind,
    pub is_profile: bool,
}

impl SchemaHeader {
    pub fn from_definition(definition: &StructureDefinition) -> Self {
        Self {
            type_id: definition.id.clone(),
            url: definition.url.clone(),
            root_type: definition.root_type().to_string(),
            kind: definition.kind,
            is_profile: definition.is_constraint(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaModel {
    pub header: SchemaHeader,
    pub root: ObjectShape,
}

impl SchemaModel {
    pub fn type_id(&self) -> &str {
        &self.header.type_id
    }

    /// All fields, depth first.
    pub fn all_fields(&self) -> Vec<&FieldDescriptor> {
        let mut out = Vec::new();
        self.root.visit(&mut out);
        out
    }

    pub fn object_at(&self, path: &str) -> Option<&ObjectShape> {
        self.root.find_object(path)
    }

    /// Non-primitive types this schema refers to, excluding itself.
    pub fn referenced_types(&self) -> BTreeSet<&str> {
        self.all_fields()
            .into_iter()
            .filter_map(|field| match &field.shape {
                FieldShape::Reference { type_code, .. } => Some(type_code.as_str()),
                _ => None,
            })
            .filter(|code| *code != self.header.type_id)
            .collect()
    }

    /// Element paths targeted by content references, in first-use order.
    pub fn content_reference_targets(&self) -> Vec<&str> {
        let mut targets: Vec<&str> = Vec::new();
        for field in self.all_fields() {
            if let FieldShape::ContentReference { target } = &field.shape {
                if !targets.contains(&target.as_str()) {
                    targets.push(target);
                }
            }
        }
        targets
    }

    pub fn has_deferred_references(&self) -> bool {
        self.all_fields().into_iter().any(|field| {
            matches!(
                field.shape,
                FieldShape::Reference { deferred: true, .. } | FieldShape::ContentReference { .. }
            )
        })
    }

    /// Mark every reference whose target is not yet available as deferred.
    pub fn mark_deferred(&mut self, is_available: impl Fn(&str) -> bool) {
        self.root.visit_mut(&mut |field: &mut FieldDescriptor| {
            if let FieldShape::Reference { type_code, deferred } = &mut field.shape {
                if !*deferred && !is_available(type_code.as_str()) {
                    *deferred = true;
                }
            }
        });
    }
}
