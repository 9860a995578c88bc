//! argmap CLI - Build debate maps from the command line.

use argmap_cli::commands;
use argmap_cli::{Cli, Command, Config, Formatter};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Log to stderr so stdout carries only outlines and JSON.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

async fn run(cli: Cli) -> argmap_cli::Result<()> {
    let config_path = cli.config.as_deref();
    let config = Config::load(config_path)?;

    let format = cli.format.map(Into::into).unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Build(args) => commands::execute_build(args, &config, &formatter).await,
        Command::Batch(args) => commands::execute_batch(args, &config, &formatter).await,
        Command::Export(args) => commands::execute_export(args, &config, &formatter).await,
        Command::Config(args) => {
            commands::execute_config(args, &config, config_path, &formatter).await
        }
    }
}
