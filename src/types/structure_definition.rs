//! FHIR StructureDefinition and ElementDefinition types.
//!
//! Only the fields the generator reads are modelled explicitly; everything
//! else on an element (pattern[x], fixed[x], mappings, ...) is kept in a
//! flattened map so that overlaying a differential never loses data.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Extension that overrides the nominal type code of an element type.
pub const FHIR_TYPE_EXTENSION_URL: &str =
    "http://hl7.org/fhir/StructureDefinition/structuredefinition-fhir-type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StructureDefinitionKind {
    PrimitiveType,
    ComplexType,
    Resource,
    Logical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Derivation {
    Specialization,
    Constraint,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Extension {
    pub url: String,

    #[serde(rename = "valueUrl", skip_serializing_if = "Option::is_none")]
    pub value_url: Option<String>,

    #[serde(rename = "valueUri", skip_serializing_if = "Option::is_none")]
    pub value_uri: Option<String>,

    #[serde(rename = "valueString", skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,

    #[serde(rename = "valueCanonical", skip_serializing_if = "Option::is_none")]
    pub value_canonical: Option<String>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementType {
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Vec<String>>,

    #[serde(rename = "targetProfile", skip_serializing_if = "Option::is_none")]
    pub target_profile: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ElementType {
    pub fn new<S: Into<String>>(code: S) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    /// The effective type code. The fhir-type extension wins over the
    /// nominal code, which is how FHIRPath system types on `id` and
    /// `value` elements name their FHIR primitive.
    pub fn resolved_code(&self) -> &str {
        self.extension
            .iter()
            .flatten()
            .find(|ext| ext.url == FHIR_TYPE_EXTENSION_URL)
            .and_then(|ext| ext.value_url.as_deref().or(ext.value_uri.as_deref()))
            .unwrap_or(&self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementBase {
    pub path: String,
    pub min: u32,
    pub max: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Dot-separated element path, e.g. `Patient.name.given`
    pub path: String,

    #[serde(rename = "sliceName", skip_serializing_if = "Option::is_none")]
    pub slice_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub slicing: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<u32>,

    /// Maximum cardinality, a decimal integer or `*`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base: Option<ElementBase>,

    /// Local reference (`#Root.path`) to another element whose structure
    /// this element reuses
    #[serde(rename = "contentReference", skip_serializing_if = "Option::is_none")]
    pub content_reference: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<ElementType>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Vec<Value>>,

    #[serde(rename = "mustSupport", skip_serializing_if = "Option::is_none")]
    pub must_support: Option<bool>,

    #[serde(rename = "isModifier", skip_serializing_if = "Option::is_none")]
    pub is_modifier: Option<bool>,

    #[serde(rename = "isSummary", skip_serializing_if = "Option::is_none")]
    pub is_summary: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<Vec<Extension>>,

    /// Everything else: fixed[x], pattern[x], example, mapping, ...
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ElementDefinition {
    pub fn new<S: Into<String>>(path: S) -> Self {
        let path = path.into();
        Self {
            id: Some(path.clone()),
            path,
            ..Default::default()
        }
    }

    pub fn with_cardinality<S: Into<String>>(mut self, min: u32, max: S) -> Self {
        self.min = Some(min);
        self.max = Some(max.into());
        self
    }

    pub fn with_type<S: Into<String>>(mut self, code: S) -> Self {
        self.types
            .get_or_insert_with(Vec::new)
            .push(ElementType::new(code));
        self
    }

    pub fn with_content_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.content_reference = Some(reference.into());
        self
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    pub fn parent_path(&self) -> Option<&str> {
        self.path.rsplit_once('.').map(|(parent, _)| parent)
    }

    pub fn is_choice(&self) -> bool {
        self.path.ends_with("[x]")
    }

    /// Cardinality `0..0`: the element is prohibited.
    pub fn is_excluded(&self) -> bool {
        self.min.unwrap_or(0) == 0 && self.max.as_deref() == Some("0")
    }

    pub fn type_list(&self) -> &[ElementType] {
        self.types.as_deref().unwrap_or(&[])
    }

    /// Distinct effective type codes in declaration order.
    pub fn resolved_type_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = Vec::new();
        for ty in self.type_list() {
            let code = ty.resolved_code();
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
        codes
    }

    /// Copy of this element moved to `path`, keeping everything else.
    pub fn relocated<S: Into<String>>(&self, path: S) -> Self {
        let path = path.into();
        Self {
            id: Some(path.clone()),
            path,
            ..self.clone()
        }
    }

    /// Field-level overlay: every field the differential sets wins,
    /// every field it leaves absent keeps the base value.
    pub fn overlay(&self, diff: &ElementDefinition) -> Self {
        fn pick<T: Clone>(diff: &Option<T>, base: &Option<T>) -> Option<T> {
            diff.clone().or_else(|| base.clone())
        }

        let mut other = self.other.clone();
        for (key, value) in &diff.other {
            other.insert(key.clone(), value.clone());
        }

        Self {
            id: pick(&diff.id, &self.id),
            path: diff.path.clone(),
            slice_name: pick(&diff.slice_name, &self.slice_name),
            slicing: pick(&diff.slicing, &self.slicing),
            short: pick(&diff.short, &self.short),
            definition: pick(&diff.definition, &self.definition),
            comment: pick(&diff.comment, &self.comment),
            min: pick(&diff.min, &self.min),
            max: pick(&diff.max, &self.max),
            base: pick(&diff.base, &self.base),
            content_reference: pick(&diff.content_reference, &self.content_reference),
            types: pick(&diff.types, &self.types),
            constraint: pick(&diff.constraint, &self.constraint),
            must_support: pick(&diff.must_support, &self.must_support),
            is_modifier: pick(&diff.is_modifier, &self.is_modifier),
            is_summary: pick(&diff.is_summary, &self.is_summary),
            binding: pick(&diff.binding, &self.binding),
            extension: pick(&diff.extension, &self.extension),
            other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ElementList {
    pub element: Vec<ElementDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureDefinition {
    #[serde(rename = "resourceType", default = "structure_definition_resource_type")]
    pub resource_type: String,

    pub id: String,

    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    pub kind: StructureDefinitionKind,

    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub is_abstract: Option<bool>,

    /// Type constrained or defined, e.g. `Patient`
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(rename = "baseDefinition", skip_serializing_if = "Option::is_none")]
    pub base_definition: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub derivation: Option<Derivation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<ElementList>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub differential: Option<ElementList>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

fn structure_definition_resource_type() -> String {
    "StructureDefinition".to_string()
}

impl StructureDefinition {
    pub fn new<S: Into<String>>(id: S, url: S, kind: StructureDefinitionKind) -> Self {
        Self {
            resource_type: structure_definition_resource_type(),
            id: id.into(),
            url: url.into(),
            name: None,
            version: None,
            kind,
            is_abstract: None,
            type_name: None,
            base_definition: None,
            derivation: None,
            snapshot: None,
            differential: None,
            other: Map::new(),
        }
    }

    pub fn is_constraint(&self) -> bool {
        self.derivation == Some(Derivation::Constraint)
    }

    pub fn snapshot_elements(&self) -> Option<&[ElementDefinition]> {
        self.snapshot.as_ref().map(|s| s.element.as_slice())
    }

    pub fn differential_elements(&self) -> Option<&[ElementDefinition]> {
        self.differential.as_ref().map(|d| d.element.as_slice())
    }

    /// Root path segment of the element model, falling back to `type`
    /// and finally to the id.
    pub fn root_type(&self) -> &str {
        self.snapshot_elements()
            .and_then(|elements| elements.first())
            .or_else(|| self.differential_elements().and_then(|e| e.first()))
            .map(|element| element.path.split('.').next().unwrap_or(&element.path))
            .or(self.type_name.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Check whether a JSON value is a StructureDefinition resource.
pub fn is_structure_definition(value: &Value) -> bool {
    value.get("resourceType").and_then(|v| v.as_str()) == Some("StructureDefinition")
}
