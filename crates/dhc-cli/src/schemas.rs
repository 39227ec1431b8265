//! # Schemas Subcommand
//!
//! Lists the loaded contracts, exports the embedded ones, and lints a
//! schema set.
//!
//! ```bash
//! dhc schemas list
//! dhc schemas export ./schemas
//! dhc schemas lint --schema-dir ./schemas
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use dhc_schema::{export_schemas, lint_all, LintSeverity};
use serde_json::Value;

use crate::config::DhcConfig;
use crate::{EXIT_INVALID, EXIT_OK};

/// Schemas subcommand arguments.
#[derive(Args, Debug)]
pub struct SchemasArgs {
    #[command(subcommand)]
    pub command: SchemasCommand,
}

/// Available schemas subcommands.
#[derive(Subcommand, Debug)]
pub enum SchemasCommand {
    /// List loaded schemas with their version and $id.
    List {
        /// List the schemas in this directory instead of the embedded ones.
        #[arg(long, value_name = "DIR")]
        schema_dir: Option<PathBuf>,
    },

    /// Write the embedded schemas into a directory.
    Export {
        /// Target directory; created if missing.
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Check schema structure and enum consistency.
    Lint {
        /// Lint the schemas in this directory instead of the embedded ones.
        #[arg(long, value_name = "DIR")]
        schema_dir: Option<PathBuf>,
    },
}

/// Execute the schemas subcommand.
pub fn run_schemas(args: &SchemasArgs, config: &DhcConfig) -> Result<u8> {
    match &args.command {
        SchemasCommand::List { schema_dir } => run_list(schema_dir.as_deref(), config),
        SchemasCommand::Export { dir } => run_export(dir),
        SchemasCommand::Lint { schema_dir } => run_lint(schema_dir.as_deref(), config),
    }
}

fn run_list(schema_dir: Option<&std::path::Path>, config: &DhcConfig) -> Result<u8> {
    let validator = config.validator(schema_dir)?;
    println!("Schemas ({}):", validator.source());
    println!();
    for name in validator.schema_names() {
        let schema = validator.get_schema(name);
        let field = |key: &str| {
            schema
                .and_then(|s| s.get(key))
                .and_then(Value::as_str)
                .unwrap_or("-")
                .to_string()
        };
        println!("  {:<26} {:<8} {}", name, field("version"), field("$id"));
    }
    println!();
    println!("Total: {} schemas", validator.schema_count());
    Ok(EXIT_OK)
}

fn run_export(dir: &std::path::Path) -> Result<u8> {
    let written = export_schemas(dir)
        .with_context(|| format!("failed to export schemas to {}", dir.display()))?;
    for path in &written {
        println!("  wrote {}", path.display());
    }
    println!("Exported {} schemas", written.len());
    Ok(EXIT_OK)
}

/// Returns 2 when any finding is an error; warnings alone pass.
fn run_lint(schema_dir: Option<&std::path::Path>, config: &DhcConfig) -> Result<u8> {
    let validator = config.validator(schema_dir)?;
    let findings = lint_all(&validator);
    for finding in &findings {
        println!("{finding}");
    }
    let errors = findings
        .iter()
        .filter(|f| f.severity == LintSeverity::Error)
        .count();
    println!(
        "Linted {} schemas: {} error(s), {} warning(s)",
        validator.schema_count(),
        errors,
        findings.len() - errors
    );
    Ok(if errors == 0 { EXIT_OK } else { EXIT_INVALID })
}
