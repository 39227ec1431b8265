//! # Migrate Subcommand
//!
//! Converts CHA output between versions 1.0.0 and 2.0.0.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use dhc_core::{ContractKind, SchemaVersion};
use dhc_repair::migrate;
use dhc_schema::load_document;

use crate::config::DhcConfig;
use crate::{emit_document, EXIT_OK};

/// Arguments for the `dhc migrate` subcommand.
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// CHA output document.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Target version (1.0.0 or 2.0.0).
    #[arg(long, value_name = "VERSION")]
    pub to: SchemaVersion,

    /// Write the migrated document here instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

/// Execute the migrate subcommand.
pub fn run_migrate(args: &MigrateArgs, config: &DhcConfig) -> Result<u8> {
    let mut document = load_document(&args.file)?;
    match ContractKind::detect(&document) {
        Some(ContractKind::ChaOutput) => {}
        Some(other) => bail!(
            "{} is {} output; only CHA output has more than one version",
            args.file.display(),
            other
        ),
        None => bail!("{} does not look like CHA output", args.file.display()),
    }

    let log = migrate(&mut document, args.to, &config.defaults)
        .with_context(|| format!("failed to migrate {}", args.file.display()))?;

    if log.is_noop() {
        eprintln!("{} is already at {}", args.file.display(), log.to);
    } else {
        let from = log
            .from
            .map_or_else(|| "unknown version".to_string(), |v| v.to_string());
        eprintln!("Migrated {} from {from} to {}:", args.file.display(), log.to);
        for action in &log.actions {
            eprintln!("{action}");
        }
    }

    emit_document(args.out.as_deref(), &document)?;
    Ok(EXIT_OK)
}
