use octofhir_schemagen::*;
use serde_json::json;

pub const FHIR_BASE: &str = "http://hl7.org/fhir/StructureDefinition/";
pub const PROFILE_BASE: &str = "http://example.org/fhir/StructureDefinition/";

#[allow(dead_code)]
pub fn fhir_url(id: &str) -> String {
    format!("{FHIR_BASE}{id}")
}

#[allow(dead_code)]
pub fn profile_url(id: &str) -> String {
    format!("{PROFILE_BASE}{id}")
}

#[allow(dead_code)]
pub fn create_test_element(path: &str, min: u32, max: &str, types: &[&str]) -> ElementDefinition {
    let mut element = ElementDefinition::new(path).with_cardinality(min, max);
    for code in types {
        element = element.with_type(*code);
    }
    element
}

#[allow(dead_code)]
pub fn create_specialization(
    id: &str,
    kind: StructureDefinitionKind,
    elements: Vec<ElementDefinition>,
) -> StructureDefinition {
    let mut definition = StructureDefinition::new(id.to_string(), fhir_url(id), kind);
    definition.name = Some(id.to_string());
    definition.type_name = Some(id.to_string());
    definition.derivation = Some(Derivation::Specialization);
    definition.snapshot = Some(ElementList { element: elements });
    definition
}

#[allow(dead_code)]
pub fn create_primitive(id: &str) -> StructureDefinition {
    create_specialization(
        id,
        StructureDefinitionKind::PrimitiveType,
        vec![
            ElementDefinition::new(id),
            create_test_element(
                &format!("{id}.value"),
                0,
                "1",
                &["http://hl7.org/fhirpath/System.String"],
            ),
        ],
    )
}

#[allow(dead_code)]
pub fn create_profile(
    id: &str,
    root_type: &str,
    base_url: &str,
    differential: Vec<ElementDefinition>,
) -> StructureDefinition {
    let mut definition = StructureDefinition::new(
        id.to_string(),
        profile_url(id),
        StructureDefinitionKind::Resource,
    );
    definition.type_name = Some(root_type.to_string());
    definition.derivation = Some(Derivation::Constraint);
    definition.base_definition = Some(base_url.to_string());
    let mut elements = vec![ElementDefinition::new(root_type)];
    elements.extend(differential);
    definition.differential = Some(ElementList { element: elements });
    definition
}

#[allow(dead_code)]
pub fn create_human_name() -> StructureDefinition {
    create_specialization(
        "HumanName",
        StructureDefinitionKind::ComplexType,
        vec![
            ElementDefinition::new("HumanName"),
            create_test_element("HumanName.use", 0, "1", &["code"]),
            create_test_element("HumanName.family", 0, "1", &["string"]),
            create_test_element("HumanName.given", 0, "*", &["string"]),
            create_test_element("HumanName.period", 0, "1", &["Period"]),
        ],
    )
}

#[allow(dead_code)]
pub fn create_period() -> StructureDefinition {
    create_specialization(
        "Period",
        StructureDefinitionKind::ComplexType,
        vec![
            ElementDefinition::new("Period"),
            create_test_element("Period.start", 0, "1", &["dateTime"]),
            create_test_element("Period.end", 0, "1", &["dateTime"]),
        ],
    )
}

#[allow(dead_code)]
pub fn create_quantity() -> StructureDefinition {
    create_specialization(
        "Quantity",
        StructureDefinitionKind::ComplexType,
        vec![
            ElementDefinition::new("Quantity"),
            create_test_element("Quantity.value", 0, "1", &["decimal"]),
            create_test_element("Quantity.unit", 0, "1", &["string"]),
            create_test_element("Quantity.system", 0, "1", &["uri"]),
            create_test_element("Quantity.code", 0, "1", &["code"]),
        ],
    )
}

#[allow(dead_code)]
pub fn create_codeable_concept() -> StructureDefinition {
    create_specialization(
        "CodeableConcept",
        StructureDefinitionKind::ComplexType,
        vec![
            ElementDefinition::new("CodeableConcept"),
            create_test_element("CodeableConcept.text", 0, "1", &["string"]),
        ],
    )
}

/// Patient element id uses the FHIRPath system type with the fhir-type
/// extension, as the published R4 snapshots do.
#[allow(dead_code)]
pub fn create_patient() -> StructureDefinition {
    let id_element: ElementDefinition = serde_json::from_value(json!({
        "id": "Patient.id",
        "path": "Patient.id",
        "min": 0,
        "max": "1",
        "type": [{
            "code": "http://hl7.org/fhirpath/System.String",
            "extension": [{
                "url": FHIR_TYPE_EXTENSION_URL,
                "valueUrl": "id"
            }]
        }]
    }))
    .unwrap();

    create_specialization(
        "Patient",
        StructureDefinitionKind::Resource,
        vec![
            ElementDefinition::new("Patient"),
            id_element,
            create_test_element("Patient.active", 0, "1", &["boolean"]),
            create_test_element("Patient.name", 0, "*", &["HumanName"]),
            create_test_element("Patient.gender", 0, "1", &["code"]),
            create_test_element("Patient.deceased[x]", 0, "1", &["boolean", "dateTime"]),
            create_test_element("Patient.contact", 0, "*", &["BackboneElement"]),
            create_test_element("Patient.contact.name", 0, "1", &["HumanName"]),
            create_test_element(
                "Patient.contact.relationship",
                0,
                "*",
                &["CodeableConcept"],
            ),
            create_test_element("Patient.link", 0, "*", &["BackboneElement"]),
            create_test_element("Patient.link.other", 1, "1", &["Patient"]),
            create_test_element("Patient.link.type", 1, "1", &["code"]),
        ],
    )
}

#[allow(dead_code)]
pub fn create_observation() -> StructureDefinition {
    create_specialization(
        "Observation",
        StructureDefinitionKind::Resource,
        vec![
            ElementDefinition::new("Observation"),
            create_test_element("Observation.status", 1, "1", &["code"]),
            create_test_element("Observation.code", 1, "1", &["CodeableConcept"]),
            create_test_element(
                "Observation.value[x]",
                0,
                "1",
                &["Quantity", "string", "boolean", "CodeableConcept"],
            ),
            create_test_element("Observation.note", 0, "*", &["string"]),
        ],
    )
}

#[allow(dead_code)]
pub fn create_questionnaire() -> StructureDefinition {
    create_specialization(
        "Questionnaire",
        StructureDefinitionKind::Resource,
        vec![
            ElementDefinition::new("Questionnaire"),
            create_test_element("Questionnaire.title", 0, "1", &["string"]),
            create_test_element("Questionnaire.item", 0, "*", &["BackboneElement"]),
            create_test_element("Questionnaire.item.linkId", 1, "1", &["string"]),
            ElementDefinition::new("Questionnaire.item.item")
                .with_cardinality(0, "*")
                .with_content_reference("#Questionnaire.item"),
        ],
    )
}

/// Primitives, data types and resources used across the tests.
#[allow(dead_code)]
pub fn create_core_definitions() -> Vec<StructureDefinition> {
    let mut definitions: Vec<StructureDefinition> = [
        "string", "boolean", "code", "id", "uri", "decimal", "dateTime",
    ]
    .iter()
    .map(|id| create_primitive(id))
    .collect();
    definitions.extend([
        create_period(),
        create_human_name(),
        create_quantity(),
        create_codeable_concept(),
        create_patient(),
        create_observation(),
        create_questionnaire(),
    ]);
    definitions
}

#[allow(dead_code)]
pub fn create_index(definitions: &[StructureDefinition]) -> (DefinitionIndex, TypeRegistry) {
    let registry = TypeRegistry::from_definitions(definitions);
    let index = DefinitionIndex::from_definitions(definitions.to_vec());
    (index, registry)
}

#[allow(dead_code)]
pub fn paths(elements: &[ElementDefinition]) -> Vec<&str> {
    elements.iter().map(|e| e.path.as_str()).collect()
}

#[allow(dead_code)]
pub fn find<'a>(elements: &'a [ElementDefinition], path: &str) -> &'a ElementDefinition {
    elements
        .iter()
        .find(|e| e.path == path)
        .unwrap_or_else(|| panic!("element {path} not found"))
}
