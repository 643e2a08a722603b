use crate::backend::{generate, BackendKind, GenerationInput};
use crate::config::GeneratorConfig;
use crate::fixture::FixtureFile;
use crate::parser::{AstParser, ParsedFile};
use crate::provider::{SynTraitProvider, TypeProvider};
use crate::scanner::SourceScanner;
use crate::serializer::{serialize_json, serialize_yaml, write_artifacts};
use crate::spec::builder::SpecBuilder;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::PathBuf;

/// routekit - Generate an axum router, a reqwest client and HTTP tests from an annotated service trait
#[derive(Parser, Debug)]
#[command(name = "routekit")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Source file declaring the trait, or a crate directory to search
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Name of the service trait
    #[arg(short = 't', long = "trait", value_name = "NAME")]
    pub trait_name: String,

    /// Directory the artifacts are written to (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Generator configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Test fixture file (YAML)
    #[arg(long = "fixtures", value_name = "FILE")]
    pub fixtures: Option<PathBuf>,

    /// Backends to run; all of them if not specified
    #[arg(short = 'b', long = "backend", value_enum)]
    pub backends: Vec<BackendKind>,

    /// Trace every operation
    #[arg(long = "enable-tracing")]
    pub enable_tracing: bool,

    /// Type name marking the request-context parameter (repeatable)
    #[arg(long = "context-type", value_name = "TYPE")]
    pub context_types: Vec<String>,

    /// Print the service specification in the given format instead of generating
    #[arg(long = "dump-spec", value_enum, value_name = "FORMAT")]
    pub dump_spec: Option<OutputFormat>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.source.exists() {
        anyhow::bail!("Source path does not exist: {}", args.source.display());
    }
    if let Some(ref config) = args.config {
        if !config.is_file() {
            anyhow::bail!("Config file does not exist: {}", config.display());
        }
    }
    if let Some(ref fixtures) = args.fixtures {
        if !fixtures.is_file() {
            anyhow::bail!("Fixture file does not exist: {}", fixtures.display());
        }
    }

    info!("Source: {}", args.source.display());
    info!("Trait: {}", args.trait_name);
    if let Some(ref out_dir) = args.out_dir {
        info!("Output directory: {}", out_dir.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Loads the configuration file, if any, and applies command-line overrides.
pub fn effective_config(args: &CliArgs) -> Result<GeneratorConfig> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    if args.enable_tracing {
        config.enable_tracing = true;
    }
    if !args.context_types.is_empty() {
        config.context_types = args.context_types.clone();
    }
    Ok(config)
}

fn locate_trait(args: &CliArgs) -> Result<ParsedFile> {
    if args.source.is_dir() {
        info!("Searching {} for trait {}", args.source.display(), args.trait_name);
        SourceScanner::new(args.source.clone()).find_trait(&args.trait_name)
    } else {
        AstParser::parse_file(&args.source)
    }
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    let config = effective_config(&args)?;

    // Step 1: Find and parse the file declaring the trait
    let parsed = locate_trait(&args)?;
    info!("Trait {} found in {}", args.trait_name, parsed.path.display());

    // Step 2: Describe the trait and build the specification
    let service = SynTraitProvider::new(&parsed, &args.trait_name, &config.context_types).describe()?;
    let spec = SpecBuilder::new(config.build_options()).build(&service)?;
    info!("Built {} operations", spec.operations.len());

    if let Some(format) = args.dump_spec {
        let content = match format {
            OutputFormat::Yaml => serialize_yaml(&spec)?,
            OutputFormat::Json => serialize_json(&spec)?,
        };
        println!("{}", content);
        return Ok(());
    }

    // Step 3: Resolve codecs and load fixtures
    let codecs = config.codec_registry();
    codecs.resolve_all(&spec)?;
    let fixtures = args.fixtures.as_deref().map(FixtureFile::load).transpose()?;
    let options = config.generation_options()?;

    // Step 4: Render every artifact before anything is written
    let kinds = if args.backends.is_empty() {
        BackendKind::ALL.to_vec()
    } else {
        args.backends.clone()
    };
    let input = GenerationInput {
        spec: &spec,
        codecs: &codecs,
        options: &options,
        fixtures: fixtures.as_ref(),
    };
    let artifacts = generate(&input, &kinds)?;

    // Step 5: Output to files or stdout
    match &args.out_dir {
        Some(out_dir) => {
            let written = write_artifacts(&artifacts, out_dir)?;
            info!("Wrote {} files to {}", written.len(), out_dir.display());
        }
        None => {
            for artifact in &artifacts {
                println!("// ===== {} =====", artifact.file_name);
                println!("{}", artifact.content);
            }
        }
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Trait: {}", spec.package.service_trait);
    info!("  - Operations: {}", spec.operations.len());
    info!("  - Artifacts: {}", artifacts.len());

    Ok(())
}
