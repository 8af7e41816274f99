//! Output backends. A backend renders emission models to source text; it
//! never sees StructureDefinitions directly.

pub mod naming;
pub mod zod;

pub use naming::{profile_schema_name, schema_name, schema_name_for};
pub use zod::ZodBackend;

use crate::types::{SchemaHeader, SchemaModel};
use std::collections::HashMap;

/// Everything a backend needs to know about the rest of the output.
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    /// Type id to generated schema name, for every type that gets a file
    pub schema_names: &'a HashMap<String, String>,
    /// Append `.js` to relative import specifiers
    pub import_extension: bool,
    /// Directory holding per-type files, relative to the output root
    pub schema_dir: &'a str,
}

impl EmitContext<'_> {
    pub fn schema_name(&self, type_id: &str) -> Option<&str> {
        self.schema_names.get(type_id).map(String::as_str)
    }

    pub fn import_specifier(&self, relative: &str) -> String {
        if self.import_extension {
            format!("{relative}.js")
        } else {
            relative.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub type_id: String,
    pub schema_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    pub url: String,
    pub type_id: String,
    pub schema_name: String,
}

pub trait SchemaBackend: Send + Sync {
    /// Extension of generated files, without the dot.
    fn file_extension(&self) -> &str;

    fn render_schema(&self, model: &SchemaModel, ctx: &EmitContext<'_>) -> String;

    /// Stand-in for a definition that failed to compile.
    fn render_placeholder(&self, header: &SchemaHeader, reason: &str, ctx: &EmitContext<'_>) -> String;

    /// Re-exports every schema, in the given order.
    fn render_index(&self, entries: &[IndexEntry], ctx: &EmitContext<'_>) -> String;

    /// Canonical URL to schema lookup for profiles.
    fn render_profile_map(&self, entries: &[ProfileEntry], ctx: &EmitContext<'_>) -> String;
}
