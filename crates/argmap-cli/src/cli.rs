//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// argmap - Build debate maps with language models.
#[derive(Debug, Parser)]
#[command(name = "argmap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ARGMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log more (repeat for trace output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Numbered outline (default)
    Outline,
    /// Node-link JSON
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a single debate from a motion
    Build(BuildArgs),

    /// Build every debate in a TOML manifest
    Batch(BatchArgs),

    /// Render a saved debate graph
    Export(ExportArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for the build command.
#[derive(Debug, Parser)]
pub struct BuildArgs {
    /// The motion (root claim)
    pub motion: String,

    /// Short title of the motion
    #[arg(short, long, default_value = "")]
    pub label: String,

    /// Topic of the debate (defaults to the motion)
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Domain tags (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Pro/con children per depth (comma separated)
    #[arg(short, long, value_delimiter = ',', default_value = "2,1")]
    pub degrees: Vec<usize>,

    /// Debate identifier
    #[arg(long)]
    pub id: Option<String>,

    /// Write the graph as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Title line for the outline
    #[arg(long)]
    pub title: Option<String>,
}

/// Arguments for the batch command.
#[derive(Debug, Parser)]
pub struct BatchArgs {
    /// TOML manifest with [[debates]] entries
    pub manifest: PathBuf,

    /// Directory for the built graphs (JSON and outline per debate)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Ledger database (defaults to the configured ledger)
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Build without recording progress
    #[arg(long, conflicts_with = "ledger")]
    pub no_ledger: bool,
}

/// Arguments for the export command.
#[derive(Debug, Parser)]
pub struct ExportArgs {
    /// Graph JSON file
    #[arg(required_unless_present = "debate")]
    pub input: Option<PathBuf>,

    /// Read the graph of this debate from the ledger instead
    #[arg(long, conflicts_with = "input")]
    pub debate: Option<String>,

    /// Ledger database (defaults to the configured ledger)
    #[arg(long)]
    pub ledger: Option<PathBuf>,

    /// Title line for the outline
    #[arg(long)]
    pub title: Option<String>,
}

/// Arguments for configuration management.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the active configuration
    Show,

    /// Print the configuration file path
    Path,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Outline => crate::config::OutputFormat::Outline,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}
