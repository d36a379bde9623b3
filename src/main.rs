//! neox-args CLI
//!
//! # Usage
//!
//! ```bash
//! # Validate a model config together with a machine setup
//! neox-args validate configs/125M.yml configs/local_setup.yml
//!
//! # Export the finalized configuration
//! neox-args export configs/125M.yml --set lr=1e-4 --format yaml
//!
//! # Field reference
//! neox-args docs --format markdown --group model
//!
//! # Defaults of every group
//! neox-args defaults
//! ```

use clap::Parser;
use neox_args::config::{
    load_config, render_json, render_markdown, render_text, Cli, Command, DefaultsArgs,
    DocFormat, DocsArgs, ExportArgs, OutputFormat, ValidateArgs,
};
use neox_args::runtime::{ProcessFacts, RuntimeFacts};
use neox_args::{args, MergedConfig};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    init_logging(level);

    let result = match cli.command {
        Command::Validate(args) => run_validate(args),
        Command::Export(args) => run_export(args),
        Command::Docs(args) => run_docs(args),
        Command::Defaults(args) => run_defaults(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins over the verbosity flags when set
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("neox_args={level}")));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load(configs: &[PathBuf], assignments: &[String], no_runtime: bool) -> Result<MergedConfig, String> {
    let facts = (!no_runtime).then(ProcessFacts::discover);
    load_config(
        configs,
        assignments,
        facts.as_ref().map(|f| f as &dyn RuntimeFacts),
    )
    .map_err(|e| e.to_string())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let config = load(&args.configs, &args.assignments, args.no_runtime)?;
    info!(fields = config.len(), "configuration is valid");
    println!("Configuration is valid ({} fields)", config.len());
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<(), String> {
    let config = load(&args.configs, &args.assignments, args.no_runtime)?;
    print_mapping(&config.to_flat_map(), args.format)
}

fn run_docs(args: DocsArgs) -> Result<(), String> {
    let mut docs = args::defaults().map_err(|e| e.to_string())?.documentation();

    if let Some(group) = &args.group {
        if !docs.iter().any(|d| &d.group == group) {
            return Err(format!("Unknown parameter group: {group}"));
        }
        docs.retain(|d| &d.group == group);
    }

    let rendered = match args.format {
        DocFormat::Text => render_text(&docs),
        DocFormat::Markdown => render_markdown(&docs),
        DocFormat::Json => render_json(&docs).map_err(|e| format!("JSON serialization error: {e}"))?,
    };
    println!("{rendered}");
    Ok(())
}

fn run_defaults(args: DefaultsArgs) -> Result<(), String> {
    let config = args::defaults().map_err(|e| e.to_string())?;
    print_mapping(&config.to_flat_map(), args.format)
}

fn print_mapping(map: &Map<String, Value>, format: OutputFormat) -> Result<(), String> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(map)
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(map)
                .map_err(|e| format!("YAML serialization error: {e}"))?;
            print!("{yaml}");
        }
    }
    Ok(())
}
