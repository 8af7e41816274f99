pub mod config;
pub mod pipeline;

pub use config::{GeneratorConfig, OutputConfig, PerformanceConfig};
pub use pipeline::{CompiledSchema, GenerationReport, SchemaGenerator};
