use crate::config::{DocConfig, DEFAULT_MAX_DEPTH};
use crate::detector::ControllerDetector;
use crate::model::SourceModel;
use crate::parser::AstParser;
use crate::registry::EndpointRegistry;
use crate::scanner::FileScanner;
use crate::serializer::{
    serialize_json, serialize_markdown, serialize_yaml, write_to_file, DEFAULT_BASE_URL,
};
use crate::type_resolver::TypeResolver;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// REST doc generator - Documents the REST endpoints of a project from its source
#[derive(Parser, Debug)]
#[command(name = "rest-doc-from-source")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Rust project directory
    #[arg(value_name = "PROJECT_PATH", required_unless_present = "model")]
    pub project_path: Option<PathBuf>,

    /// Pre-built source model (JSON or YAML) used instead of scanning a project
    #[arg(short = 'm', long = "model", value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "markdown")]
    pub output_format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Prefix of the source links written in the Markdown footer
    #[arg(long = "base-url", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Extra package prefix whose types are never expanded (repeatable)
    #[arg(long = "opaque-prefix", value_name = "PREFIX")]
    pub opaque_prefixes: Vec<String>,

    /// Nesting depth at which payload members stop being expanded
    #[arg(long = "max-depth", default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Write the source model built from the project to this file (JSON)
    #[arg(long = "dump-model", value_name = "FILE")]
    pub dump_model: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Markdown page
    Markdown,
    /// JSON endpoint list
    Json,
    /// YAML endpoint list
    Yaml,
}

impl CliArgs {
    pub fn doc_config(&self) -> DocConfig {
        DocConfig::default()
            .with_opaque_prefixes(self.opaque_prefixes.iter().cloned())
            .with_max_depth(self.max_depth)
    }
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if let Some(model) = &args.model {
        if !model.is_file() {
            anyhow::bail!("Model file does not exist: {}", model.display());
        }
        info!("Source model: {}", model.display());
    } else if let Some(project_path) = &args.project_path {
        if !project_path.exists() {
            anyhow::bail!("Project path does not exist: {}", project_path.display());
        }
        if !project_path.is_dir() {
            anyhow::bail!("Project path is not a directory: {}", project_path.display());
        }
        info!("Project path: {}", project_path.display());
    }

    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Builds the source model of a Rust project: scan, parse, resolve.
pub fn build_model(project_path: &Path) -> Result<SourceModel> {
    info!("Scanning project directory...");
    let scan_result = FileScanner::new(project_path.to_path_buf()).scan()?;
    info!("Found {} Rust files", scan_result.rust_files.len());

    if scan_result.rust_files.is_empty() {
        anyhow::bail!("No Rust files found in the project directory");
    }

    info!("Parsing Rust files...");
    let parsed_files = AstParser::parse_files(&scan_result.rust_files);
    info!("Successfully parsed {} files", parsed_files.len());
    if parsed_files.is_empty() {
        anyhow::bail!("No files could be parsed successfully");
    }

    let model = TypeResolver::new(parsed_files).build();
    info!("Resolved {} declared types", model.len());
    Ok(model)
}

/// Registers every class from several threads at once; registration is idempotent.
pub fn register_all(
    registry: &EndpointRegistry,
    model: &SourceModel,
    config: &DocConfig,
    classes: &[String],
) {
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, classes.len().max(1));
    let chunk = classes.len().div_ceil(workers).max(1);
    debug!("Registering {} classes on {} threads", classes.len(), workers);

    std::thread::scope(|scope| {
        for batch in classes.chunks(chunk) {
            scope.spawn(move || {
                for class in batch {
                    if !registry.register(model, config, class) {
                        warn!("{} could not be registered", class);
                    }
                }
            });
        }
    });
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting REST documentation generation...");
    let config = args.doc_config();

    // Step 1: Obtain the source model
    let model = match (&args.model, &args.project_path) {
        (Some(model_path), _) => {
            info!("Loading source model...");
            SourceModel::load(model_path)
                .with_context(|| format!("Failed to load model: {}", model_path.display()))?
        }
        (None, Some(project_path)) => build_model(project_path)?,
        (None, None) => anyhow::bail!("Either a project path or --model is required"),
    };

    if let Some(dump_path) = &args.dump_model {
        let json = model.to_json().context("Failed to serialize source model")?;
        write_to_file(&json, dump_path)?;
        info!("Source model written to {}", dump_path.display());
    }

    // Step 2: Discover and register handler classes
    let detection = ControllerDetector::detect(&model, &config);
    if detection.controllers.is_empty() {
        warn!("No handler class found (tag: {})", config.controller_tag);
    }
    let registry = EndpointRegistry::new();
    register_all(&registry, &model, &config, &detection.controllers);

    // Step 3: Assemble endpoints
    let endpoints = registry.document(&model, &config);
    if endpoints.is_empty() {
        warn!("No endpoints found in the project");
    }

    // Step 4: Serialize to requested format
    info!("Serializing to {:?} format...", args.output_format);
    let content = match args.output_format {
        OutputFormat::Markdown => serialize_markdown(&endpoints, &args.base_url),
        OutputFormat::Json => serialize_json(&endpoints)?,
        OutputFormat::Yaml => serialize_yaml(&endpoints)?,
    };

    // Step 5: Output to file or stdout
    if let Some(output_path) = &args.output_path {
        info!("Writing output to: {}", output_path.display());
        write_to_file(&content, output_path)?;
    } else {
        println!("{}", content);
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Types in model: {}", model.len());
    info!("  - Handler classes: {}", registry.len());
    info!("  - Endpoints: {}", endpoints.len());

    Ok(())
}
