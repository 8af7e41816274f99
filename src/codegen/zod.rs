//! Zod (TypeScript) backend.

use crate::codegen::naming::{path_identifier, schema_name_for};
use crate::codegen::{EmitContext, IndexEntry, ProfileEntry, SchemaBackend};
use crate::types::{
    Cardinality, FieldDescriptor, FieldShape, Max, ObjectEntry, ObjectShape, PrimitiveType,
    PrimitiveValue, SchemaHeader, SchemaModel,
};

const INDENT: &str = "    ";

#[derive(Debug, Clone, Default)]
pub struct ZodBackend;

impl ZodBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Zod expression for a primitive value.
pub fn primitive_expression(primitive: PrimitiveType) -> &'static str {
    match primitive.value_kind() {
        PrimitiveValue::Text => "z.string()",
        PrimitiveValue::Uri => "z.string().url()",
        PrimitiveValue::Uuid => "z.string().uuid()",
        PrimitiveValue::Number => "z.number()",
        PrimitiveValue::Integer => "z.number().int()",
        PrimitiveValue::NonNegativeInteger => "z.number().int().nonnegative()",
        PrimitiveValue::PositiveInteger => "z.number().int().positive()",
        PrimitiveValue::Boolean => "z.boolean()",
    }
}

/// Apply array, bound and optionality modifiers to `expression`.
pub fn apply_cardinality(expression: String, cardinality: &Cardinality) -> String {
    let mut out = expression;
    if cardinality.is_array() {
        out.push_str(".array()");
        if cardinality.min > 0 {
            out.push_str(&format!(".min({})", cardinality.min));
        }
        if let Max::Bounded(max) = cardinality.max {
            out.push_str(&format!(".max({max})"));
        }
    }
    if cardinality.is_optional() {
        out.push_str(".optional()");
    }
    out
}

fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn lazy(expression: &str) -> String {
    format!("z.lazy(() => {expression})")
}

fn hoisted_name(target: &str) -> String {
    format!("{}Shape", path_identifier(target))
}

/// Rendering state for one schema file.
struct ModelRenderer<'a> {
    model: &'a SchemaModel,
    ctx: &'a EmitContext<'a>,
    own_name: String,
    /// Content-reference targets emitted as local lazy constants
    hoisted: Vec<&'a str>,
}

impl<'a> ModelRenderer<'a> {
    fn new(model: &'a SchemaModel, ctx: &'a EmitContext<'a>) -> Self {
        let header = &model.header;
        let own_name = ctx
            .schema_name(&header.type_id)
            .map(str::to_string)
            .unwrap_or_else(|| schema_name_for(&header.type_id, &header.root_type, header.is_profile));
        let hoisted = model
            .content_reference_targets()
            .into_iter()
            .filter(|target| *target != model.root.path)
            .collect();
        Self {
            model,
            ctx,
            own_name,
            hoisted,
        }
    }

    fn render(&self) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "// Generated from {} - do not edit manually\n",
            self.model.header.url
        ));
        output.push_str("import { z } from 'zod'\n");

        for type_code in self.model.referenced_types() {
            if let Some(name) = self.ctx.schema_name(type_code) {
                output.push_str(&format!(
                    "import {{ {} }} from {}\n",
                    name,
                    js_string(&self.ctx.import_specifier(&format!("./{type_code}")))
                ));
            }
        }
        output.push('\n');

        for target in &self.hoisted {
            let body = self.render_target(target);
            output.push_str(&format!(
                "const {}: z.ZodTypeAny = {}\n\n",
                hoisted_name(target),
                lazy(&body)
            ));
        }

        let annotation = if self.model.has_deferred_references() {
            ": z.ZodTypeAny"
        } else {
            ""
        };
        output.push_str(&format!(
            "export const {}{} = {}\n",
            self.own_name,
            annotation,
            self.render_object(&self.model.root, 0)
        ));
        output
    }

    fn render_target(&self, target: &str) -> String {
        if let Some(shape) = self.model.object_at(target) {
            return self.render_object(shape, 0);
        }
        self.model
            .all_fields()
            .into_iter()
            .find(|field| field.path == target && field.choice_of.is_none())
            .map(|field| self.base_expression(field, 0))
            .unwrap_or_else(|| "z.unknown()".to_string())
    }

    fn render_object(&self, shape: &ObjectShape, depth: usize) -> String {
        let inner = INDENT.repeat(depth + 1);
        let mut out = String::from("z.object({\n");
        for entry in &shape.entries {
            match entry {
                ObjectEntry::Field(field) => {
                    out.push_str(&format!(
                        "{}{}: {},\n",
                        inner,
                        field.name,
                        self.field_expression(field, depth + 1)
                    ));
                }
                ObjectEntry::Omitted { name, .. } => {
                    out.push_str(&format!(
                        "{inner}// The field '{name}' is omitted because its cardinality is 0..0\n"
                    ));
                }
            }
        }
        out.push_str(&INDENT.repeat(depth));
        out.push_str("})");
        out
    }

    fn field_expression(&self, field: &FieldDescriptor, depth: usize) -> String {
        apply_cardinality(self.base_expression(field, depth), &field.cardinality)
    }

    fn base_expression(&self, field: &FieldDescriptor, depth: usize) -> String {
        match &field.shape {
            FieldShape::Primitive { primitive, .. } => primitive_expression(*primitive).to_string(),
            FieldShape::Reference {
                type_code,
                deferred,
            } => {
                if *type_code == self.model.header.type_id {
                    return lazy(&self.own_name);
                }
                match self.ctx.schema_name(type_code) {
                    Some(name) if *deferred => lazy(name),
                    Some(name) => name.to_string(),
                    None => "z.unknown()".to_string(),
                }
            }
            FieldShape::ContentReference { target } => {
                if *target == self.model.root.path {
                    lazy(&self.own_name)
                } else {
                    hoisted_name(target)
                }
            }
            FieldShape::Object(shape) => {
                if self.hoisted.iter().any(|target| *target == shape.path) {
                    hoisted_name(&shape.path)
                } else {
                    self.render_object(shape, depth)
                }
            }
        }
    }
}

impl SchemaBackend for ZodBackend {
    fn file_extension(&self) -> &str {
        "ts"
    }

    fn render_schema(&self, model: &SchemaModel, ctx: &EmitContext<'_>) -> String {
        ModelRenderer::new(model, ctx).render()
    }

    fn render_placeholder(&self, header: &SchemaHeader, reason: &str, ctx: &EmitContext<'_>) -> String {
        let name = ctx
            .schema_name(&header.type_id)
            .map(str::to_string)
            .unwrap_or_else(|| schema_name_for(&header.type_id, &header.root_type, header.is_profile));

        let mut output = String::new();
        output.push_str(&format!(
            "// Generated from {} - do not edit manually\n",
            header.url
        ));
        output.push_str(&format!(
            "// Schema generation failed: {}\n",
            single_line(reason)
        ));
        output.push_str("import { z } from 'zod'\n\n");
        output.push_str(&format!("export const {name}: z.ZodTypeAny = z.unknown()\n"));
        output
    }

    fn render_index(&self, entries: &[IndexEntry], ctx: &EmitContext<'_>) -> String {
        let mut output = String::from("// Generated index of FHIR schemas - do not edit manually\n\n");
        for entry in entries {
            let specifier = ctx.import_specifier(&format!("./{}/{}", ctx.schema_dir, entry.type_id));
            output.push_str(&format!(
                "export {{ {} }} from {}\n",
                entry.schema_name,
                js_string(&specifier)
            ));
        }
        output
    }

    fn render_profile_map(&self, entries: &[ProfileEntry], ctx: &EmitContext<'_>) -> String {
        let mut output = String::from("// Generated profile map - do not edit manually\n");
        output.push_str("import { z } from 'zod'\n");
        for entry in entries {
            let specifier = ctx.import_specifier(&format!("./{}/{}", ctx.schema_dir, entry.type_id));
            output.push_str(&format!(
                "import {{ {} }} from {}\n",
                entry.schema_name,
                js_string(&specifier)
            ));
        }
        output.push_str("\nexport const profileMap: Record<string, z.ZodTypeAny> = {\n");
        for entry in entries {
            output.push_str(&format!(
                "{}{}: {},\n",
                INDENT,
                js_string(&entry.url),
                entry.schema_name
            ));
        }
        output.push_str("}\n");
        output
    }
}
