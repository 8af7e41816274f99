//! # OctoFHIR Schemagen
//!
//! Generates runtime validator schemas (Zod) from FHIR R4
//! StructureDefinitions, including profiles whose structure has to be
//! reconstructed from a chain of differentials.
//!
//! ## Pipeline
//!
//! - **Loading**: NDJSON records are streamed and classified
//! - **Constraint resolution**: profiles are folded onto their base snapshot
//! - **Compilation**: element trees become a format-independent emission model
//! - **Ordering**: definitions are emitted dependency-first
//! - **Codegen**: a backend renders the models to source files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use octofhir_schemagen::*;
//!
//! # async fn example() -> Result<()> {
//! let mut diagnostics = Diagnostics::new();
//! let definitions =
//!     load_structure_definitions(&["definitions.ndjson".into()], &mut diagnostics).await?;
//!
//! let config = GeneratorConfig::default();
//! let generator = SchemaGenerator::new(definitions, config.clone());
//! let report = generator.generate_concurrent().await?;
//! write_outputs(&report, &ZodBackend::new(), &config.output).await?;
//! # Ok(())
//! # }
//! ```

pub mod codegen;
pub mod converter;
pub mod core;
pub mod diagnostics;
pub mod error;
pub mod loader;
pub mod output;
pub mod types;

pub use codegen::{SchemaBackend, ZodBackend};
pub use converter::*;
pub use crate::core::{CompiledSchema, GenerationReport, GeneratorConfig, SchemaGenerator};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::Result;
pub use error::SchemaGenError;
pub use loader::{ResourceClass, classify, load_structure_definitions, read_ndjson};
pub use output::write_outputs;
pub use types::*;
