mod common;

use common::*;
use octofhir_schemagen::*;

fn resolve(definitions: Vec<StructureDefinition>, id: &str) -> Result<Vec<ElementDefinition>> {
    let (index, registry) = create_index(&definitions);
    let definition = index.get(id).unwrap();
    resolve_elements(definition, &index, &registry)
}

fn with_profiles(profiles: Vec<StructureDefinition>) -> Vec<StructureDefinition> {
    let mut definitions = create_core_definitions();
    definitions.extend(profiles);
    definitions
}

#[test]
fn test_specialization_returns_snapshot_unchanged() {
    let elements = resolve(create_core_definitions(), "Patient").unwrap();
    assert_eq!(
        elements.as_slice(),
        create_patient().snapshot_elements().unwrap()
    );
}

#[test]
fn test_profile_tightens_cardinality() {
    let mut name = ElementDefinition::new("Patient.name");
    name.min = Some(1);
    let profile = create_profile("named-patient", "Patient", &fhir_url("Patient"), vec![name]);

    let elements = resolve(with_profiles(vec![profile]), "named-patient").unwrap();
    let name = find(&elements, "Patient.name");
    assert_eq!(name.min, Some(1));
    assert_eq!(name.max.as_deref(), Some("*"));
    assert_eq!(name.resolved_type_codes(), vec!["HumanName"]);
    assert_eq!(elements.len(), create_patient().snapshot_elements().unwrap().len());
}

#[test]
fn test_overlay_keeps_fields_the_differential_omits() {
    let mut gender = ElementDefinition::new("Patient.gender");
    gender.short = Some("administrative gender".to_string());
    gender.must_support = Some(true);
    let profile = create_profile("ms-patient", "Patient", &fhir_url("Patient"), vec![gender]);

    let elements = resolve(with_profiles(vec![profile]), "ms-patient").unwrap();
    let gender = find(&elements, "Patient.gender");
    assert_eq!(gender.short.as_deref(), Some("administrative gender"));
    assert_eq!(gender.must_support, Some(true));
    assert_eq!(gender.min, Some(0));
    assert_eq!(gender.max.as_deref(), Some("1"));
}

#[test]
fn test_three_level_chain_applies_every_differential() {
    let mut name_required = ElementDefinition::new("Patient.name");
    name_required.min = Some(1);
    let level1 = create_profile("level1", "Patient", &fhir_url("Patient"), vec![name_required]);

    let mut gender_required = ElementDefinition::new("Patient.gender");
    gender_required.min = Some(1);
    let level2 = create_profile("level2", "Patient", &profile_url("level1"), vec![gender_required]);

    let mut name_bounded = ElementDefinition::new("Patient.name");
    name_bounded.max = Some("3".to_string());
    let level3 = create_profile("level3", "Patient", &profile_url("level2"), vec![name_bounded]);

    let elements = resolve(with_profiles(vec![level1, level2, level3]), "level3").unwrap();

    let name = find(&elements, "Patient.name");
    assert_eq!(name.min, Some(1));
    assert_eq!(name.max.as_deref(), Some("3"));
    assert_eq!(find(&elements, "Patient.gender").min, Some(1));
}

#[test]
fn test_chain_equals_manual_fold() {
    let mut name_required = ElementDefinition::new("Patient.name");
    name_required.min = Some(1);
    let level1 = create_profile("level1", "Patient", &fhir_url("Patient"), vec![name_required]);

    let mut family = ElementDefinition::new("Patient.name.family");
    family.min = Some(1);
    let level2 = create_profile("level2", "Patient", &profile_url("level1"), vec![family]);

    let definitions = with_profiles(vec![level1.clone(), level2.clone()]);
    let (index, registry) = create_index(&definitions);

    let resolved = resolve_elements(index.get("level2").unwrap(), &index, &registry).unwrap();

    let base = create_patient().snapshot_elements().unwrap().to_vec();
    let step1 =
        merge_differential(&base, level1.differential_elements().unwrap(), &index).unwrap();
    let step2 =
        merge_differential(&step1, level2.differential_elements().unwrap(), &index).unwrap();

    assert_eq!(resolved, step2);
}

#[test]
fn test_nested_path_expands_from_type_snapshot() {
    let mut family = ElementDefinition::new("Patient.name.family");
    family.min = Some(1);
    let profile = create_profile("family-patient", "Patient", &fhir_url("Patient"), vec![family]);

    let elements = resolve(with_profiles(vec![profile]), "family-patient").unwrap();
    let resolved_paths = paths(&elements);

    let start = resolved_paths.iter().position(|p| *p == "Patient.name").unwrap();
    assert_eq!(
        &resolved_paths[start..start + 6],
        &[
            "Patient.name",
            "Patient.name.use",
            "Patient.name.family",
            "Patient.name.given",
            "Patient.name.period",
            "Patient.gender"
        ]
    );
    assert_eq!(find(&elements, "Patient.name.family").min, Some(1));
    assert_eq!(
        find(&elements, "Patient.name.given").max.as_deref(),
        Some("*")
    );
}

#[test]
fn test_deep_path_expands_every_level() {
    let mut start = ElementDefinition::new("Patient.contact.name.period.start");
    start.min = Some(1);
    let profile = create_profile("deep-patient", "Patient", &fhir_url("Patient"), vec![start]);

    let elements = resolve(with_profiles(vec![profile]), "deep-patient").unwrap();
    assert_eq!(find(&elements, "Patient.contact.name.period.start").min, Some(1));
    assert!(elements.iter().any(|e| e.path == "Patient.contact.name.period.end"));
    assert!(elements.iter().any(|e| e.path == "Patient.contact.name.given"));
}

#[test]
fn test_path_below_recursive_content_reference_expands_one_level() {
    let mut link_id = ElementDefinition::new("Questionnaire.item.item.linkId");
    link_id.must_support = Some(true);
    let profile = create_profile(
        "nested-questionnaire",
        "Questionnaire",
        &fhir_url("Questionnaire"),
        vec![link_id],
    );

    let elements = resolve(with_profiles(vec![profile]), "nested-questionnaire").unwrap();
    assert_eq!(
        paths(&elements),
        vec![
            "Questionnaire",
            "Questionnaire.title",
            "Questionnaire.item",
            "Questionnaire.item.linkId",
            "Questionnaire.item.item",
            "Questionnaire.item.item.linkId",
            "Questionnaire.item.item.item"
        ]
    );

    let nested = find(&elements, "Questionnaire.item.item");
    assert!(nested.content_reference.is_none());
    assert_eq!(nested.max.as_deref(), Some("*"));

    let link_id = find(&elements, "Questionnaire.item.item.linkId");
    assert_eq!(link_id.must_support, Some(true));
    assert_eq!(link_id.min, Some(1));
    assert_eq!(link_id.resolved_type_codes(), vec!["string"]);

    assert_eq!(
        find(&elements, "Questionnaire.item.item.item").content_reference.as_deref(),
        Some("#Questionnaire.item")
    );
}

#[test]
fn test_named_slice_without_id_is_dropped() {
    let mut official = ElementDefinition::new("Patient.name");
    official.id = None;
    official.slice_name = Some("official".to_string());
    official.min = Some(1);
    official.max = Some("1".to_string());
    let profile = create_profile("sliced-patient", "Patient", &fhir_url("Patient"), vec![official]);

    let elements = resolve(with_profiles(vec![profile]), "sliced-patient").unwrap();
    let name = find(&elements, "Patient.name");
    assert_eq!(name.min, Some(0));
    assert_eq!(name.max.as_deref(), Some("*"));
    assert!(name.slice_name.is_none());
}

#[test]
fn test_concrete_choice_path_creates_sibling() {
    let mut quantity = ElementDefinition::new("Observation.valueQuantity");
    quantity.min = Some(1);
    let profile = create_profile(
        "quantity-observation",
        "Observation",
        &fhir_url("Observation"),
        vec![quantity],
    );

    let elements = resolve(with_profiles(vec![profile]), "quantity-observation").unwrap();
    let resolved_paths = paths(&elements);
    let choice = resolved_paths
        .iter()
        .position(|p| *p == "Observation.value[x]")
        .unwrap();
    assert_eq!(resolved_paths[choice + 1], "Observation.valueQuantity");

    let sibling = find(&elements, "Observation.valueQuantity");
    assert_eq!(sibling.min, Some(1));
    assert_eq!(sibling.resolved_type_codes(), vec!["Quantity"]);
}

#[test]
fn test_concrete_choice_path_with_children() {
    let mut unit = ElementDefinition::new("Observation.valueQuantity.unit");
    unit.min = Some(1);
    let profile = create_profile(
        "unit-observation",
        "Observation",
        &fhir_url("Observation"),
        vec![unit],
    );

    let elements = resolve(with_profiles(vec![profile]), "unit-observation").unwrap();
    assert_eq!(find(&elements, "Observation.valueQuantity.unit").min, Some(1));
    assert!(elements.iter().any(|e| e.path == "Observation.valueQuantity.system"));
}

#[test]
fn test_type_slice_on_choice_is_normalized() {
    let mut slice = ElementDefinition::new("Observation.value[x]");
    slice.id = Some("Observation.value[x]:valueQuantity".to_string());
    slice.slice_name = Some("valueQuantity".to_string());
    slice.min = Some(1);
    let profile = create_profile(
        "sliced-observation",
        "Observation",
        &fhir_url("Observation"),
        vec![slice],
    );

    let elements = resolve(with_profiles(vec![profile]), "sliced-observation").unwrap();
    assert_eq!(find(&elements, "Observation.valueQuantity").min, Some(1));
    assert_eq!(find(&elements, "Observation.value[x]").min, Some(0));
}

#[test]
fn test_choice_narrowed_by_differential_types() {
    let mut narrowed = ElementDefinition::new("Observation.value[x]").with_type("Quantity");
    narrowed.min = Some(1);
    let mut unit = ElementDefinition::new("Observation.value[x].unit");
    unit.min = Some(1);
    let profile = create_profile(
        "narrowed-observation",
        "Observation",
        &fhir_url("Observation"),
        vec![narrowed, unit],
    );

    let elements = resolve(with_profiles(vec![profile]), "narrowed-observation").unwrap();
    let choice = find(&elements, "Observation.value[x]");
    assert_eq!(choice.resolved_type_codes(), vec!["Quantity"]);
    assert_eq!(find(&elements, "Observation.value[x].unit").min, Some(1));
}

#[test]
fn test_unknown_choice_suffix_fails() {
    let profile = create_profile(
        "bad-observation",
        "Observation",
        &fhir_url("Observation"),
        vec![ElementDefinition::new("Observation.valuePeriod")],
    );

    let result = resolve(with_profiles(vec![profile]), "bad-observation");
    assert!(matches!(
        result,
        Err(SchemaGenError::UnknownChoiceType { ref suffix, .. }) if suffix == "Period"
    ));
}

#[test]
fn test_missing_type_definition_fails() {
    let mut definitions: Vec<_> = with_profiles(vec![create_profile(
        "family-patient",
        "Patient",
        &fhir_url("Patient"),
        vec![ElementDefinition::new("Patient.name.family")],
    )]);
    definitions.retain(|d| d.id != "HumanName");

    let result = resolve(definitions, "family-patient");
    assert!(matches!(
        result,
        Err(SchemaGenError::TypeNotFound { ref type_code, .. }) if type_code == "HumanName"
    ));
}

#[test]
fn test_constraint_without_base_definition_fails() {
    let mut profile = create_profile("orphan", "Patient", &fhir_url("Patient"), vec![]);
    profile.base_definition = None;

    let result = resolve(with_profiles(vec![profile]), "orphan");
    assert!(matches!(result, Err(SchemaGenError::MissingBaseDefinition { .. })));
}

#[test]
fn test_unresolvable_base_url_fails() {
    let profile = create_profile(
        "lost",
        "Patient",
        "http://example.org/fhir/StructureDefinition/nowhere",
        vec![],
    );

    let result = resolve(with_profiles(vec![profile]), "lost");
    assert!(matches!(result, Err(SchemaGenError::UnresolvedBaseUrl { .. })));
}

#[test]
fn test_circular_base_chain_fails() {
    let a = create_profile("cycle-a", "Patient", &profile_url("cycle-b"), vec![]);
    let b = create_profile("cycle-b", "Patient", &profile_url("cycle-a"), vec![]);

    let result = resolve(with_profiles(vec![a, b]), "cycle-a");
    assert!(matches!(result, Err(SchemaGenError::CircularBaseDefinition { .. })));
}

#[test]
fn test_resolution_does_not_modify_inputs() {
    let mut family = ElementDefinition::new("Patient.name.family");
    family.min = Some(1);
    let profile = create_profile("family-patient", "Patient", &fhir_url("Patient"), vec![family]);
    let definitions = with_profiles(vec![profile]);
    let (index, registry) = create_index(&definitions);

    let resolved = resolve_definition(index.get("family-patient").unwrap(), &index, &registry)
        .unwrap();
    assert!(resolved.snapshot.is_some());

    for original in &definitions {
        assert_eq!(index.get(&original.id), Some(original));
    }
    assert!(index.get("family-patient").unwrap().snapshot.is_none());
}
