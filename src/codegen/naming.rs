//! Identifier naming for generated schemas.

const DIGIT_WORDS: [&str; 10] = [
    "Zero", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine",
];

/// `ab-cd` -> `AbCdSchema`, `234-abc` -> `TwoThreeFourAbcSchema`.
///
/// `-` and `.` start a new capitalized word and are dropped; digits are
/// spelled out so the result is always a valid identifier.
pub fn schema_name(type_id: &str) -> String {
    let mut name = String::with_capacity(type_id.len() + 6);
    let mut capitalize_next = true;

    for ch in type_id.chars() {
        if matches!(ch, '-' | '.') {
            capitalize_next = true;
            continue;
        }
        if let Some(digit) = ch.to_digit(10) {
            name.push_str(DIGIT_WORDS[digit as usize]);
        } else if capitalize_next {
            name.extend(ch.to_uppercase());
        } else {
            name.push(ch);
        }
        capitalize_next = false;
    }

    name.push_str("Schema");
    name
}

/// Profiles are named after their root type and id, so that profiles of
/// different resources never collide with each other or with base types.
pub fn profile_schema_name(root_type: &str, profile_id: &str) -> String {
    schema_name(&format!("{root_type}-{profile_id}"))
}

/// Schema name for a generated definition.
pub fn schema_name_for(type_id: &str, root_type: &str, is_profile: bool) -> String {
    if is_profile {
        profile_schema_name(root_type, type_id)
    } else {
        schema_name(type_id)
    }
}

/// Element path to a local identifier: `Questionnaire.item` ->
/// `QuestionnaireItem`.
pub fn path_identifier(path: &str) -> String {
    let mut identifier = String::with_capacity(path.len());
    for segment in path.split('.') {
        let segment = segment.trim_end_matches("[x]");
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            identifier.extend(first.to_uppercase());
            identifier.push_str(chars.as_str());
        }
    }
    identifier
}
