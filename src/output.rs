//! Write generated sources to disk.

use crate::codegen::{EmitContext, IndexEntry, ProfileEntry, SchemaBackend, schema_name_for};
use crate::core::config::OutputConfig;
use crate::core::pipeline::{CompiledSchema, GenerationReport};
use crate::error::Result;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct OutputSummary {
    pub schema_files: Vec<PathBuf>,
    pub index_file: PathBuf,
    pub profile_map_file: PathBuf,
}

/// Type id to schema name for every result in the report.
pub fn schema_names(report: &GenerationReport) -> HashMap<String, String> {
    report
        .results
        .iter()
        .map(|(id, result)| {
            let header = result.header();
            (
                id.clone(),
                schema_name_for(&header.type_id, &header.root_type, header.is_profile),
            )
        })
        .collect()
}

/// Render every result plus the index and profile map, and write them
/// under `config.output_dir`.
pub async fn write_outputs(
    report: &GenerationReport,
    backend: &dyn SchemaBackend,
    config: &OutputConfig,
) -> Result<OutputSummary> {
    let names = schema_names(report);
    let ctx = EmitContext {
        schema_names: &names,
        import_extension: config.import_extension,
        schema_dir: &config.schema_dir,
    };

    let schema_dir = config.output_dir.join(&config.schema_dir);
    tokio::fs::create_dir_all(&schema_dir).await?;

    let mut summary = OutputSummary::default();
    let mut index_entries = Vec::with_capacity(report.results.len());
    let mut profile_entries = Vec::new();

    for (id, result) in &report.results {
        let source = match result {
            CompiledSchema::Compiled(model) => backend.render_schema(model, &ctx),
            CompiledSchema::Placeholder { header, reason } => {
                backend.render_placeholder(header, reason, &ctx)
            }
        };
        let path = schema_dir.join(format!("{}.{}", id, backend.file_extension()));
        tokio::fs::write(&path, source).await?;
        tracing::debug!("Wrote {}", path.display());
        summary.schema_files.push(path);

        let schema_name = names.get(id).cloned().unwrap_or_default();
        let header = result.header();
        if header.is_profile {
            profile_entries.push(ProfileEntry {
                url: header.url.clone(),
                type_id: id.clone(),
                schema_name: schema_name.clone(),
            });
        }
        index_entries.push(IndexEntry {
            type_id: id.clone(),
            schema_name,
        });
    }

    summary.index_file = config
        .output_dir
        .join(format!("index.{}", backend.file_extension()));
    tokio::fs::write(&summary.index_file, backend.render_index(&index_entries, &ctx)).await?;

    summary.profile_map_file = config
        .output_dir
        .join(format!("profileMap.{}", backend.file_extension()));
    tokio::fs::write(
        &summary.profile_map_file,
        backend.render_profile_map(&profile_entries, &ctx),
    )
    .await?;

    tracing::info!(
        "Wrote {} schema files, {} profiles to {}",
        summary.schema_files.len(),
        profile_entries.len(),
        config.output_dir.display()
    );
    Ok(summary)
}
