//! # dhc CLI entry point
//!
//! Parses command-line arguments, loads the optional configuration, and
//! dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use dhc_cli::config::DhcConfig;
use dhc_cli::consumers::{run_consumers, ConsumersArgs};
use dhc_cli::fields::{run_fields, FieldsArgs};
use dhc_cli::migrate::{run_migrate, MigrateArgs};
use dhc_cli::repair::{run_repair, RepairArgs};
use dhc_cli::schemas::{run_schemas, SchemasArgs};
use dhc_cli::validate::{run_validate, ValidateArgs};

/// District-heating output contracts
///
/// Validates, repairs and migrates the JSON documents exchanged between the
/// CHA, KPI and LFA stages of the planning pipeline.
#[derive(Parser, Debug)]
#[command(name = "dhc", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (default: ./dhc.yaml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a document against its contract.
    Validate(ValidateArgs),

    /// Repair enum spellings, stringly numbers and missing sections, then re-validate.
    Repair(RepairArgs),

    /// Convert CHA output between versions 1.0.0 and 2.0.0.
    Migrate(MigrateArgs),

    /// Report which dotted field paths a document lacks.
    Fields(FieldsArgs),

    /// Check the fields downstream consumers (EAA, TCA) read.
    Consumers(ConsumersArgs),

    /// List, export or lint the published schemas.
    Schemas(SchemasArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("dhc CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let result = DhcConfig::load(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Validate(args) => run_validate(args, &config),
        Commands::Repair(args) => run_repair(args, &config),
        Commands::Migrate(args) => run_migrate(args, &config),
        Commands::Fields(args) => run_fields(args, &config),
        Commands::Consumers(args) => run_consumers(args, &config),
        Commands::Schemas(args) => run_schemas(args, &config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
