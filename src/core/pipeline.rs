//! End-to-end generation: index the corpus, order it by dependency,
//! compile each definition and mark references that must be emitted lazily.

use crate::converter::compiler::compile_definition;
use crate::converter::dependency::{build_dependency_map, topological_sort};
use crate::core::config::GeneratorConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{Result, SchemaGenError};
use crate::types::{
    DefinitionIndex, SchemaHeader, SchemaModel, StructureDefinition, StructureDefinitionKind,
    TypeRegistry,
};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Outcome for one definition.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledSchema {
    Compiled(SchemaModel),
    /// The definition failed; a stand-in is emitted so that everything
    /// referring to it still resolves.
    Placeholder { header: SchemaHeader, reason: String },
}

impl CompiledSchema {
    pub fn header(&self) -> &SchemaHeader {
        match self {
            Self::Compiled(model) => &model.header,
            Self::Placeholder { header, .. } => header,
        }
    }

    pub fn model(&self) -> Option<&SchemaModel> {
        match self {
            Self::Compiled(model) => Some(model),
            Self::Placeholder { .. } => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    /// Dependency-first processing order
    pub order: Vec<String>,
    /// One result per id in `order`, in the same order
    pub results: IndexMap<String, CompiledSchema>,
    pub diagnostics: Diagnostics,
}

impl GenerationReport {
    pub fn compiled_count(&self) -> usize {
        self.results.values().filter(|r| !r.is_placeholder()).count()
    }

    pub fn placeholder_count(&self) -> usize {
        self.results.values().filter(|r| r.is_placeholder()).count()
    }

    pub fn get(&self, type_id: &str) -> Option<&CompiledSchema> {
        self.results.get(type_id)
    }
}

/// Generator over an immutable, shared definition set.
///
/// The id index and URL registry are complete before any compilation
/// starts and are only read afterwards, so compilations can run on
/// separate threads without coordination.
pub struct SchemaGenerator {
    definitions: Arc<DefinitionIndex>,
    registry: Arc<TypeRegistry>,
    config: GeneratorConfig,
}

impl SchemaGenerator {
    pub fn new(definitions: Vec<StructureDefinition>, config: GeneratorConfig) -> Self {
        let registry = TypeRegistry::from_definitions(&definitions);
        let definitions = DefinitionIndex::from_definitions(definitions);
        tracing::info!(
            "Indexed {} StructureDefinitions ({} canonical URLs)",
            definitions.len(),
            registry.len()
        );
        Self {
            definitions: Arc::new(definitions),
            registry: Arc::new(registry),
            config,
        }
    }

    pub fn definitions(&self) -> &DefinitionIndex {
        &self.definitions
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Dependency-first order of the definitions that can be processed.
    pub fn dependency_order(&self, diagnostics: &mut Diagnostics) -> Vec<String> {
        let map = build_dependency_map(self.definitions.iter(), &self.registry, diagnostics);
        topological_sort(&map)
    }

    /// Compile a single definition by id.
    pub fn compile(&self, type_id: &str) -> Result<SchemaModel> {
        let definition = self
            .definitions
            .get(type_id)
            .ok_or_else(|| SchemaGenError::type_not_found(type_id, type_id))?;
        compile_definition(definition, &self.definitions, &self.registry)
    }

    /// Compile everything on the current thread.
    pub fn generate(&self) -> GenerationReport {
        let mut diagnostics = Diagnostics::new();
        let order = self.dependency_order(&mut diagnostics);

        let outcomes = order
            .iter()
            .map(|id| (id.clone(), compile_one(&self.definitions, &self.registry, id)))
            .collect();

        finish(order, outcomes, diagnostics)
    }

    /// Compile everything on the blocking pool, at most
    /// `max_concurrent_compilations` at a time. The result is identical to
    /// [`SchemaGenerator::generate`].
    pub async fn generate_concurrent(&self) -> Result<GenerationReport> {
        let mut diagnostics = Diagnostics::new();
        let order = self.dependency_order(&mut diagnostics);
        let limit = self.config.performance.max_concurrent_compilations.max(1);
        let semaphore = Arc::new(Semaphore::new(limit));

        tracing::info!(
            "Compiling {} definitions with up to {} concurrent tasks",
            order.len(),
            limit
        );

        let mut tasks = Vec::with_capacity(order.len());
        for id in &order {
            let definitions = Arc::clone(&self.definitions);
            let registry = Arc::clone(&self.registry);
            let semaphore = Arc::clone(&semaphore);
            let id = id.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| SchemaGenError::concurrency_error(e.to_string()))?;
                tokio::task::spawn_blocking(move || {
                    let outcome = compile_one(&definitions, &registry, &id);
                    (id, outcome)
                })
                .await
                .map_err(|e| SchemaGenError::concurrency_error(format!("Task execution failed: {e}")))
            }));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in futures::future::join_all(tasks).await {
            let outcome = task
                .map_err(|e| SchemaGenError::concurrency_error(format!("Task execution failed: {e}")))??;
            outcomes.push(outcome);
        }

        Ok(finish(order, outcomes, diagnostics))
    }
}

type Outcome = (String, std::result::Result<SchemaModel, (SchemaHeader, SchemaGenError)>);

fn compile_one(
    definitions: &DefinitionIndex,
    registry: &TypeRegistry,
    id: &str,
) -> std::result::Result<SchemaModel, (SchemaHeader, SchemaGenError)> {
    let Some(definition) = definitions.get(id) else {
        return Err((
            SchemaHeader {
                type_id: id.to_string(),
                url: String::new(),
                root_type: id.to_string(),
                kind: StructureDefinitionKind::Logical,
                is_profile: false,
            },
            SchemaGenError::type_not_found(id, id),
        ));
    };
    tracing::debug!("Compiling {}", id);
    compile_definition(definition, definitions, registry)
        .map_err(|error| (SchemaHeader::from_definition(definition), error))
}

/// Turn failures into placeholders and defer forward references.
fn finish(order: Vec<String>, outcomes: Vec<Outcome>, mut diagnostics: Diagnostics) -> GenerationReport {
    let mut results: IndexMap<String, CompiledSchema> = IndexMap::with_capacity(outcomes.len());
    for (id, outcome) in outcomes {
        let result = match outcome {
            Ok(model) => CompiledSchema::Compiled(model),
            Err((header, error)) => {
                diagnostics.error(Some(id.as_str()), &error);
                CompiledSchema::Placeholder {
                    header,
                    reason: error.to_string(),
                }
            }
        };
        results.insert(id, result);
    }

    // A reference to a type that is generated later in the order (only
    // possible through a dependency cycle) must be emitted lazily.
    let known: HashSet<String> = results.keys().cloned().collect();
    let mut emitted: HashSet<String> = HashSet::with_capacity(results.len());
    for (id, result) in results.iter_mut() {
        if let CompiledSchema::Compiled(model) = result {
            model.mark_deferred(|code| emitted.contains(code) || !known.contains(code));
        }
        emitted.insert(id.clone());
    }

    let report = GenerationReport {
        order,
        results,
        diagnostics,
    };
    tracing::info!(
        "Generated {} schemas ({} placeholders)",
        report.compiled_count(),
        report.placeholder_count()
    );
    report
}
