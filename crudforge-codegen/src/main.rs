//! CLI entry point for crudforge

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crudforge_codegen::codegen::ArtifactKind;
use crudforge_codegen::config::CodegenConfig;
use crudforge_codegen::projection::Target;
use crudforge_codegen::SourceLoader;

#[derive(Parser)]
#[command(name = "crudforge")]
#[command(about = "Generate DTOs, managers, controllers and API clients from entity sources")]
#[command(version)]
struct Cli {
    /// Path to configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Entity source: .rs, .sql, declaration .json, or OpenAPI .json/.yaml (repeatable, overrides config)
    #[arg(short, long)]
    entity: Vec<PathBuf>,

    /// Output directory (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite files that already exist
    #[arg(long)]
    force: bool,

    /// Dry run - show what would be generated without writing files
    #[arg(long)]
    dry_run: bool,

    /// Target language for DTOs and clients: csharp, typescript, rust
    #[arg(short, long)]
    target: Option<Target>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate every configured artifact
    Generate,
    /// Generate only DTOs
    Dto,
    /// Generate only data-access managers
    Manager,
    /// Generate only REST controllers
    Api,
    /// Generate only API clients
    Client,
    /// Inspect sources (show extracted entities and documents for debugging)
    Inspect,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (before logging, so we can use config.log_level)
    // File given by --config (or ./crudforge.toml when present), then CRUDFORGE_* variables
    let mut config = CodegenConfig::load(cli.config.as_deref())?;

    // Initialize logging
    // Priority: RUST_LOG env var > config.log_level > default (debug for dev, info for release)
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };
    let log_level = config.log_level.as_deref().unwrap_or(default_level);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();

    // Apply CLI overrides
    if !cli.entity.is_empty() {
        config.entity_paths = cli.entity;
    }
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    if cli.force {
        config.force = true;
    }
    if cli.dry_run {
        config.dry_run = true;
    }
    if let Some(target) = cli.target {
        config.dto_target = target;
        config.client_target = target;
    }

    // Apply command-specific settings
    match &cli.command {
        Some(Commands::Dto) => config.artifacts = vec![ArtifactKind::Dto],
        Some(Commands::Manager) => config.artifacts = vec![ArtifactKind::Manager],
        Some(Commands::Api) => config.artifacts = vec![ArtifactKind::Controller],
        Some(Commands::Client) => config.artifacts = vec![ArtifactKind::Client],
        Some(Commands::Inspect) => return inspect_sources(&config),
        Some(Commands::Generate) | None => {}
    }

    // Validate configuration
    config.validate()?;

    info!("Generating code from {} sources", config.entity_paths.len());
    let report = crudforge_codegen::generate(&config)?;

    if config.dry_run {
        println!("Dry run mode - would generate:");
        for file in &report.emitted.written {
            println!("  write: {}", file.path.display());
        }
        for file in &report.emitted.skipped {
            println!("  skip:  {} (exists)", file.path.display());
        }
    }

    for failure in &report.failures {
        warn!("Not generated: {}", failure);
    }
    for file in &report.emitted.failed {
        warn!("Not written: {}: {}", file.path.display(), file.reason);
    }

    info!(
        "Code generation completed: {} written, {} skipped, {} failed",
        report.emitted.written.len(),
        report.emitted.skipped.len(),
        report.failures.len() + report.emitted.failed.len()
    );
    Ok(())
}

fn inspect_sources(config: &CodegenConfig) -> Result<()> {
    let sources = SourceLoader::new().load(&config.entity_paths);

    println!("Extracted {} entities:\n", sources.entities.len());
    for entity in &sources.entities {
        println!("Entity: {} ({})", entity.name, entity.namespace_name);
        println!("  Properties:");
        for prop in &entity.property_infos {
            let required = if prop.is_required { " required" } else { "" };
            let key = if prop.is_key { " key" } else { "" };
            let nullable = if prop.is_nullable { "?" } else { "" };
            println!("    - {}: {}{}{}{}", prop.name, prop.type_name, nullable, required, key);
        }
        if !entity.navigations.is_empty() {
            println!("  Navigations:");
            for nav in &entity.navigations {
                let shape = if nav.is_skip_navigation {
                    "many-to-many"
                } else if nav.is_collection {
                    "collection"
                } else {
                    "reference"
                };
                println!(
                    "    - {} -> {} ({}, fk: {})",
                    nav.name,
                    nav.type_name,
                    shape,
                    nav.foreign_key.as_deref().unwrap_or("-")
                );
            }
        }
        println!();
    }

    for document in &sources.documents {
        println!("Document: {} {}", document.title, document.version);
        println!("  Types: {}", document.types.len());
        println!("  Operations:");
        for op in &document.operations {
            println!("    - [{}] {} {}", op.tag, op.method, op.path);
        }
        println!();
    }

    for failure in &sources.failures {
        println!("Failed: {}", failure);
    }

    Ok(())
}
