use clap::Parser;
use octofhir_schemagen::codegen::ZodBackend;
use octofhir_schemagen::core::{GeneratorConfig, SchemaGenerator};
use octofhir_schemagen::diagnostics::{Diagnostics, Severity};
use octofhir_schemagen::loader::load_structure_definitions;
use octofhir_schemagen::output::write_outputs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schemagen")]
#[command(about = "Generate Zod schemas from FHIR StructureDefinitions")]
#[command(version)]
struct Cli {
    /// NDJSON file with FHIR definitions (repeatable)
    #[arg(short = 'f', long = "file")]
    files: Vec<PathBuf>,

    /// Output directory (default: ./output)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Append .js to import specifiers
    #[arg(short = 'E', long = "import-extension")]
    import_extension: bool,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if cli.files.is_empty() {
        eprintln!("❌ No input files. Pass one or more NDJSON files with -f <FILE>");
        std::process::exit(1);
    }

    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_file(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(output) = cli.output {
        config = config.with_output_dir(output);
    }
    if cli.import_extension {
        config = config.with_import_extension(true);
    }
    config.validate()?;

    let mut diagnostics = Diagnostics::new();
    let definitions = load_structure_definitions(&cli.files, &mut diagnostics).await?;
    if definitions.is_empty() {
        eprintln!("❌ No StructureDefinitions found in the input files");
        std::process::exit(1);
    }

    let generator = SchemaGenerator::new(definitions, config.clone());
    let mut report = generator.generate_concurrent().await?;
    diagnostics.extend(std::mem::take(&mut report.diagnostics));

    let summary = write_outputs(&report, &ZodBackend::new(), &config.output).await?;

    println!(
        "✅ Generated {} schemas ({} placeholders) in {}",
        report.compiled_count(),
        report.placeholder_count(),
        config.output.output_dir.display()
    );
    println!("📄 Index: {}", summary.index_file.display());
    println!("📄 Profile map: {}", summary.profile_map_file.display());

    if !diagnostics.is_empty() {
        println!(
            "⚠️  {} errors, {} warnings",
            diagnostics.count(Severity::Error),
            diagnostics.count(Severity::Warning)
        );
        for diagnostic in diagnostics.iter().filter(|d| d.severity == Severity::Error) {
            println!("   {diagnostic}");
        }
    }

    Ok(())
}
