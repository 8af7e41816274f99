//! NDJSON record source and resource classification.

use crate::diagnostics::Diagnostics;
use crate::error::{Result, SchemaGenError};
use crate::types::{StructureDefinition, is_structure_definition};
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

struct LineState {
    lines: Lines<BufReader<File>>,
    source_name: String,
    line: usize,
    failed: bool,
}

/// Open an NDJSON file as a lazy stream of parsed records.
///
/// Blank lines are skipped. A line that fails to parse yields a
/// [`SchemaGenError::RecordParse`] naming the file and line; the stream
/// continues with the next line.
pub async fn read_ndjson<P: AsRef<Path>>(path: P) -> Result<impl Stream<Item = Result<Value>>> {
    let path = path.as_ref();
    let file = File::open(path).await?;
    let state = LineState {
        lines: BufReader::new(file).lines(),
        source_name: path.display().to_string(),
        line: 0,
        failed: false,
    };

    Ok(stream::unfold(state, |mut state| async move {
        if state.failed {
            return None;
        }
        loop {
            state.line += 1;
            match state.lines.next_line().await {
                Ok(Some(text)) if text.trim().is_empty() => continue,
                Ok(Some(text)) => {
                    let record = serde_json::from_str(&text).map_err(|source| {
                        SchemaGenError::RecordParse {
                            source_name: state.source_name.clone(),
                            line: state.line,
                            source,
                        }
                    });
                    return Some((record, state));
                }
                Ok(None) => return None,
                Err(e) => {
                    state.failed = true;
                    return Some((Err(SchemaGenError::IoError(e)), state));
                }
            }
        }
    }))
}

/// Resource classes, checked in declaration order; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceClass {
    StructureDefinition,
    Other,
}

impl ResourceClass {
    pub const ALL: [ResourceClass; 2] = [ResourceClass::StructureDefinition, ResourceClass::Other];

    pub fn matches(self, record: &Value) -> bool {
        match self {
            ResourceClass::StructureDefinition => is_structure_definition(record),
            ResourceClass::Other => true,
        }
    }

    pub fn of(record: &Value) -> Self {
        Self::ALL
            .into_iter()
            .find(|class| class.matches(record))
            .unwrap_or(ResourceClass::Other)
    }
}

/// Records grouped by class, each group in source order.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedRecords {
    groups: HashMap<ResourceClass, Vec<Value>>,
}

impl ClassifiedRecords {
    pub fn get(&self, class: ResourceClass) -> &[Value] {
        self.groups.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn take(&mut self, class: ResourceClass) -> Vec<Value> {
        self.groups.remove(&class).unwrap_or_default()
    }

    pub fn push(&mut self, record: Value) {
        self.groups
            .entry(ResourceClass::of(&record))
            .or_default()
            .push(record);
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drain a record stream into classes. Unparseable records are reported
/// and skipped.
pub async fn classify<S>(records: S, diagnostics: &mut Diagnostics) -> ClassifiedRecords
where
    S: Stream<Item = Result<Value>>,
{
    let mut classified = ClassifiedRecords::default();
    let mut records = std::pin::pin!(records);
    while let Some(record) = records.next().await {
        match record {
            Ok(value) => classified.push(value),
            Err(error) => diagnostics.error(None, &error),
        }
    }
    classified
}

/// Load every StructureDefinition from the given NDJSON files.
///
/// A file that cannot be opened fails the whole load. Records that are
/// StructureDefinitions by `resourceType` but do not deserialize are
/// reported and skipped.
pub async fn load_structure_definitions(
    paths: &[PathBuf],
    diagnostics: &mut Diagnostics,
) -> Result<Vec<StructureDefinition>> {
    let mut definitions = Vec::new();
    for path in paths {
        tracing::info!("Loading {}", path.display());
        let records = read_ndjson(path).await?;
        let mut classified = classify(records, diagnostics).await;

        let raw = classified.take(ResourceClass::StructureDefinition);
        tracing::debug!(
            "{}: {} StructureDefinitions, {} other resources",
            path.display(),
            raw.len(),
            classified.len()
        );

        for value in raw {
            let id = value
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("<no id>")
                .to_string();
            match serde_json::from_value::<StructureDefinition>(value) {
                Ok(definition) => definitions.push(definition),
                Err(e) => diagnostics.warning(
                    Some(id.as_str()),
                    format!("Skipping StructureDefinition {id}: {e}"),
                ),
            }
        }
    }
    Ok(definitions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_classification_first_match_wins() {
        let sd = json!({"resourceType": "StructureDefinition", "id": "Patient"});
        let vs = json!({"resourceType": "ValueSet", "id": "gender"});
        assert_eq!(ResourceClass::of(&sd), ResourceClass::StructureDefinition);
        assert_eq!(ResourceClass::of(&vs), ResourceClass::Other);
    }

    #[tokio::test]
    async fn test_read_ndjson_reports_bad_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"resourceType": "StructureDefinition", "id": "a"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{{not json").unwrap();
        writeln!(file, r#"{{"resourceType": "ValueSet", "id": "b"}}"#).unwrap();

        let records: Vec<_> = read_ndjson(file.path()).await.unwrap().collect().await;
        assert_eq!(records.len(), 3);
        assert!(records[0].is_ok());
        assert!(matches!(
            records[1],
            Err(SchemaGenError::RecordParse { line: 3, .. })
        ));
        assert!(records[2].is_ok());
    }

    #[tokio::test]
    async fn test_classify_keeps_order() {
        let records = stream::iter(vec![
            Ok(json!({"resourceType": "StructureDefinition", "id": "a"})),
            Ok(json!({"resourceType": "CodeSystem", "id": "x"})),
            Ok(json!({"resourceType": "StructureDefinition", "id": "b"})),
        ]);
        let mut diagnostics = Diagnostics::new();
        let classified = classify(records, &mut diagnostics).await;

        let ids: Vec<_> = classified
            .get(ResourceClass::StructureDefinition)
            .iter()
            .filter_map(|v| v["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(classified.get(ResourceClass::Other).len(), 1);
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let result = read_ndjson("/nonexistent/definitions.ndjson").await;
        assert!(matches!(result, Err(SchemaGenError::IoError(_))));
    }
}
