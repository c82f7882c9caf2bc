//! gldpubs - GridLAB-D Simulation Output Configuration Tool
//!
//! Builds the publication configuration a GridLAB-D simulation needs from
//! the CIM measurement dictionary of a feeder model, either read from a file
//! or requested from the dictionary importer.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use common::{load_config, AppConfig, TracingLogSink};
use errors::PubsError;
use gld_pubs::{
    HandlerRegistry, HttpDictionaryGenerator, Parameters, SimulationOutputHandler,
    DICTIONARY_FILE, MODEL_ID, TYPENAME,
};

#[derive(Parser)]
#[command(name = "gldpubs")]
#[command(about = "GridLAB-D simulation output configuration generator")]
#[command(long_about = "GridLAB-D simulation output configuration generator

Commands:
  generate     Build the publication configuration for a feeder model
  show-config  Print the effective configuration

Examples:
  gldpubs generate --model-id _49AD8E07 --dictionary-file dict.json
  gldpubs generate --model-id _49AD8E07 -o simulation_output.json
  GLDPUBS_IMPORTER__URL=http://importer:8090/dictionary gldpubs generate --model-id _49AD8E07")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file (toml, yaml or json)
    #[arg(short = 'c', long = "config-path", global = true)]
    config_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the publication configuration for a feeder model
    Generate {
        /// Feeder model mRID
        #[arg(short, long)]
        model_id: Option<String>,

        /// Measurement dictionary to use instead of generating one
        #[arg(short, long)]
        dictionary_file: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Process id attached to log messages (default: this process)
        #[arg(long)]
        process_id: Option<String>,

        /// Username attached to log messages
        #[arg(long, env = "USER", default_value = "system")]
        username: String,
    },

    /// Print the effective configuration
    ShowConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".bright_red(), e);
            if let Some(err) = e.downcast_ref::<PubsError>() {
                eprintln!("{} {}", "Code:".bright_red(), err.error_code());
            }
            ExitCode::FAILURE
        },
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config_path.as_deref())?;

    let log_level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    common::logging::init(log_level)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::Generate {
            model_id,
            dictionary_file,
            output,
            process_id,
            username,
        } => {
            let parameters = build_parameters(model_id, dictionary_file.as_deref());
            let process_id = process_id.unwrap_or_else(|| std::process::id().to_string());
            let document = generate(config, &parameters, &process_id, &username)?;
            write_document(&document, output.as_deref())?;
        },
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        },
    }

    Ok(())
}

fn build_parameters(model_id: Option<String>, dictionary_file: Option<&Path>) -> Parameters {
    let mut parameters = Parameters::new();
    if let Some(model_id) = model_id {
        parameters.insert(MODEL_ID, model_id);
    }
    if let Some(path) = dictionary_file {
        parameters.insert(DICTIONARY_FILE, path.to_string_lossy());
    }
    parameters
}

/// Run one request through the registered handler, buffering the document
fn generate(
    config: AppConfig,
    parameters: &Parameters,
    process_id: &str,
    username: &str,
) -> Result<Vec<u8>> {
    let generator = HttpDictionaryGenerator::from_config(&config.importer);
    let handler = Arc::new(SimulationOutputHandler::new(
        Arc::new(config),
        Arc::new(generator),
        Arc::new(TracingLogSink),
    ));

    let mut registry = HandlerRegistry::new();
    handler.register(&mut registry);

    let mut document = Vec::new();
    registry.generate_config(TYPENAME, parameters, &mut document, process_id, username)?;
    Ok(document)
}

fn write_document(document: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, document)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} {}", "Wrote".bright_green(), path.display());
        },
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(document)?;
            writeln!(stdout)?;
        },
    }
    Ok(())
}
