//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! neox-args validate configs/125M.yml configs/local_setup.yml
//! neox-args validate configs/125M.yml --set lr=6e-4 --set norm=rmsnorm
//! neox-args export configs/125M.yml --format yaml
//! neox-args docs --format markdown --group model
//! neox-args defaults --format json
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Compose, validate and document NeoX training configurations
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "neox-args")]
#[command(version)]
#[command(about = "Compose, validate and document NeoX training configurations")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Load, finalize and validate configuration files
    Validate(ValidateArgs),

    /// Print the validated configuration as one flat mapping
    Export(ExportArgs),

    /// Print documentation for every field
    Docs(DocsArgs),

    /// Print the default configuration
    Defaults(DefaultsArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// YAML configuration files; a key may appear in only one of them
    #[arg(value_name = "CONFIG", required = true)]
    pub configs: Vec<PathBuf>,

    /// Override a field, e.g. --set lr=6e-4 (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub assignments: Vec<String>,

    /// Skip git revision and launcher environment discovery
    #[arg(long)]
    pub no_runtime: bool,
}

/// Arguments for the export command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ExportArgs {
    /// YAML configuration files; a key may appear in only one of them
    #[arg(value_name = "CONFIG", required = true)]
    pub configs: Vec<PathBuf>,

    /// Override a field, e.g. --set lr=6e-4 (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub assignments: Vec<String>,

    /// Skip git revision and launcher environment discovery
    #[arg(long)]
    pub no_runtime: bool,

    /// Output format (json, yaml)
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,
}

/// Arguments for the docs command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct DocsArgs {
    /// Output format (text, markdown, json)
    #[arg(short, long, default_value = "text")]
    pub format: DocFormat,

    /// Only document this parameter group
    #[arg(short, long)]
    pub group: Option<String>,
}

/// Arguments for the defaults command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct DefaultsArgs {
    /// Output format (json, yaml)
    #[arg(short, long, default_value = "yaml")]
    pub format: OutputFormat,
}

/// Mapping output format
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(format!(
                "Unknown output format: {}. Valid formats: json, yaml",
                s
            )),
        }
    }
}

/// Documentation output format
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DocFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

impl std::str::FromStr for DocFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(DocFormat::Text),
            "markdown" | "md" => Ok(DocFormat::Markdown),
            "json" => Ok(DocFormat::Json),
            _ => Err(format!(
                "Unknown documentation format: {}. Valid formats: text, markdown, json",
                s
            )),
        }
    }
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validate_command() {
        let cli = parse_args(["neox-args", "validate", "125M.yml", "local_setup.yml"]).unwrap();
        match cli.command {
            Command::Validate(args) => {
                assert_eq!(
                    args.configs,
                    vec![PathBuf::from("125M.yml"), PathBuf::from("local_setup.yml")]
                );
                assert!(args.assignments.is_empty());
                assert!(!args.no_runtime);
            }
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_parse_validate_with_assignments() {
        let cli = parse_args([
            "neox-args",
            "validate",
            "125M.yml",
            "--set",
            "lr=6e-4",
            "--set",
            "norm=rmsnorm",
            "--no-runtime",
        ])
        .unwrap();
        match cli.command {
            Command::Validate(args) => {
                assert_eq!(args.assignments, vec!["lr=6e-4", "norm=rmsnorm"]);
                assert!(args.no_runtime);
            }
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_validate_requires_config() {
        assert!(parse_args(["neox-args", "validate"]).is_err());
    }

    #[test]
    fn test_parse_export_yaml() {
        let cli = parse_args(["neox-args", "export", "125M.yml", "--format", "yaml"]).unwrap();
        match cli.command {
            Command::Export(args) => assert_eq!(args.format, OutputFormat::Yaml),
            _ => panic!("Expected Export command"),
        }
    }

    #[test]
    fn test_parse_docs_defaults() {
        let cli = parse_args(["neox-args", "docs"]).unwrap();
        match cli.command {
            Command::Docs(args) => {
                assert_eq!(args.format, DocFormat::Text);
                assert_eq!(args.group, None);
            }
            _ => panic!("Expected Docs command"),
        }
    }

    #[test]
    fn test_parse_docs_markdown_group() {
        let cli = parse_args(["neox-args", "docs", "-f", "md", "--group", "model"]).unwrap();
        match cli.command {
            Command::Docs(args) => {
                assert_eq!(args.format, DocFormat::Markdown);
                assert_eq!(args.group.as_deref(), Some("model"));
            }
            _ => panic!("Expected Docs command"),
        }
    }

    #[test]
    fn test_parse_defaults_command() {
        let cli = parse_args(["neox-args", "defaults"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Defaults(DefaultsArgs {
                format: OutputFormat::Yaml
            })
        );
    }

    #[test]
    fn test_global_flags() {
        let cli = parse_args(["neox-args", "defaults", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(!cli.quiet);
        let cli = parse_args(["neox-args", "-q", "docs"]).unwrap();
        assert!(cli.quiet);
    }

    #[test]
    fn test_invalid_format() {
        assert!(parse_args(["neox-args", "defaults", "--format", "toml"]).is_err());
        assert!("xml".parse::<DocFormat>().is_err());
        assert_eq!("YAML".parse::<OutputFormat>(), Ok(OutputFormat::Yaml));
    }
}
