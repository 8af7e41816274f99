pub mod primitive;
pub mod schema;
pub mod structure_definition;
pub mod type_registry;

pub use primitive::{PrimitiveType, PrimitiveValue};
pub use schema::{
    Cardinality, FieldDescriptor, FieldShape, Max, ObjectEntry, ObjectShape, SchemaHeader,
    SchemaModel,
};
pub use structure_definition::{
    Derivation, ElementBase, ElementDefinition, ElementList, ElementType, Extension,
    FHIR_TYPE_EXTENSION_URL, StructureDefinition, StructureDefinitionKind,
    is_structure_definition,
};
pub use type_registry::{DefinitionIndex, TypeRegistry};
