use crate::error::{Result, SchemaGenError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub output: OutputConfig,
    pub performance: PerformanceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
    /// Directory for per-type schema files, relative to `output_dir`
    pub schema_dir: String,
    /// Append `.js` to relative import specifiers (ESM resolution)
    pub import_extension: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub max_concurrent_compilations: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            schema_dir: "schema".to_string(),
            import_extension: false,
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_compilations: num_cpus::get(),
        }
    }
}

impl GeneratorConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SchemaGenError::config_error(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            SchemaGenError::config_error(format!("invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.performance.max_concurrent_compilations == 0 {
            return Err(SchemaGenError::config_error(
                "max_concurrent_compilations must be at least 1",
            ));
        }
        if self.output.schema_dir.is_empty() {
            return Err(SchemaGenError::config_error("schema_dir must not be empty"));
        }
        Ok(())
    }

    pub fn with_output_dir<P: Into<PathBuf>>(mut self, output_dir: P) -> Self {
        self.output.output_dir = output_dir.into();
        self
    }

    pub fn with_import_extension(mut self, enabled: bool) -> Self {
        self.output.import_extension = enabled;
        self
    }

    pub fn with_max_concurrent_compilations(mut self, limit: usize) -> Self {
        self.performance.max_concurrent_compilations = limit;
        self
    }

    pub fn schema_output_dir(&self) -> PathBuf {
        self.output.output_dir.join(&self.output.schema_dir)
    }
}
