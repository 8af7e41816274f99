mod common;

use common::*;
use octofhir_schemagen::*;

fn position(order: &[String], id: &str) -> usize {
    order
        .iter()
        .position(|x| x == id)
        .unwrap_or_else(|| panic!("{id} missing from order"))
}

#[test]
fn test_dependencies_include_resolved_type_codes() {
    let registry = TypeRegistry::from_definitions(&create_core_definitions());
    let dependencies = definition_dependencies(&create_patient(), &registry);

    assert!(dependencies.contains(&"id".to_string()));
    assert!(dependencies.contains(&"HumanName".to_string()));
    assert!(dependencies.contains(&"CodeableConcept".to_string()));
    assert!(!dependencies.contains(&"Patient".to_string()));
    assert!(!dependencies.iter().any(|d| d.contains("System.String")));
}

#[test]
fn test_profile_depends_on_base_and_differential_types() {
    let family = ElementDefinition::new("Patient.name.family").with_type("string");
    let profile = create_profile("family-patient", "Patient", &fhir_url("Patient"), vec![family]);
    let registry = TypeRegistry::from_definitions(&create_core_definitions());

    assert_eq!(
        definition_dependencies(&profile, &registry),
        vec!["Patient".to_string(), "string".to_string()]
    );
}

#[test]
fn test_unregistered_base_falls_back_to_last_url_segment() {
    let profile = create_profile(
        "ext-profile",
        "Patient",
        "http://example.org/fhir/StructureDefinition/ExternalPatient",
        vec![],
    );
    let registry = TypeRegistry::new();
    assert_eq!(
        definition_dependencies(&profile, &registry),
        vec!["ExternalPatient".to_string()]
    );
}

#[test]
fn test_map_skips_definitions_without_elements() {
    let mut definitions = create_core_definitions();
    let mut empty = create_specialization("Empty", StructureDefinitionKind::ComplexType, vec![]);
    empty.snapshot = None;
    definitions.push(empty);

    let registry = TypeRegistry::from_definitions(&definitions);
    let mut diagnostics = Diagnostics::new();
    let map = build_dependency_map(&definitions, &registry, &mut diagnostics);

    assert!(!map.contains_key("Empty"));
    assert_eq!(diagnostics.count(Severity::Warning), 1);
    assert_eq!(diagnostics.for_type("Empty").count(), 1);
    assert!(map["string"].is_empty());
}

#[test]
fn test_order_places_dependencies_first() {
    let mut definitions = create_core_definitions();
    definitions.push(create_profile(
        "named-patient",
        "Patient",
        &fhir_url("Patient"),
        vec![],
    ));
    // Reverse so input order cannot satisfy the constraints by accident.
    definitions.reverse();

    let registry = TypeRegistry::from_definitions(&definitions);
    let mut diagnostics = Diagnostics::new();
    let map = build_dependency_map(&definitions, &registry, &mut diagnostics);
    let order = topological_sort(&map);

    assert_eq!(order.len(), definitions.len());
    assert!(position(&order, "dateTime") < position(&order, "Period"));
    assert!(position(&order, "Period") < position(&order, "HumanName"));
    assert!(position(&order, "HumanName") < position(&order, "Patient"));
    assert!(position(&order, "Patient") < position(&order, "named-patient"));
    assert!(position(&order, "Quantity") < position(&order, "Observation"));
    assert!(diagnostics.is_empty());
}

#[test]
fn test_order_is_stable_across_runs() {
    let definitions = create_core_definitions();
    let registry = TypeRegistry::from_definitions(&definitions);
    let mut diagnostics = Diagnostics::new();
    let map = build_dependency_map(&definitions, &registry, &mut diagnostics);

    assert_eq!(topological_sort(&map), topological_sort(&map));
}

#[test]
fn test_map_builds_from_borrowed_index() {
    let definitions = create_core_definitions();
    let (index, registry) = create_index(&definitions);

    let mut from_index = Diagnostics::new();
    let mut from_slice = Diagnostics::new();
    assert_eq!(
        build_dependency_map(index.iter(), &registry, &mut from_index),
        build_dependency_map(&definitions, &registry, &mut from_slice)
    );
}
