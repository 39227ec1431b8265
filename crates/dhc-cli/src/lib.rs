//! # dhc-cli — Command Line for the Output Contracts
//!
//! Provides the `dhc` binary.
//!
//! ## Subcommands
//!
//! - `dhc validate`: Validate a CHA, KPI or LFA document.
//! - `dhc repair`: Normalize, coerce, fill defaults and re-validate.
//! - `dhc migrate`: Move CHA output between versions 1.0.0 and 2.0.0.
//! - `dhc fields`: Report which dotted field paths a document lacks.
//! - `dhc consumers`: Check the fields EAA and TCA read.
//! - `dhc schemas`: List, export or lint the published schemas.
//!
//! ## Exit Codes
//!
//! `0` when the document passes, `2` when it does not, `1` on any error
//! (unreadable file, bad schema directory, undetectable contract).
//!
//! ```bash
//! dhc validate results/cha_output.json
//! dhc repair results/cha_output.json --in-place
//! dhc migrate legacy.json --to 2.0.0 --out upgraded.json
//! dhc fields results/cha_output.json kpis.network.n_consumers pipes[0].length_m
//! ```

pub mod config;
pub mod consumers;
pub mod fields;
pub mod migrate;
pub mod repair;
pub mod schemas;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde_json::Value;

/// The document passes.
pub const EXIT_OK: u8 = 0;
/// The document does not pass.
pub const EXIT_INVALID: u8 = 2;

/// Report rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Resolve a path that may be relative to a base directory.
///
/// Absolute paths are returned as-is. A relative path that exists under
/// `base` resolves there; otherwise it stays relative to the current
/// directory.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let based = base.join(path);
    if based.exists() {
        based
    } else {
        path.to_path_buf()
    }
}

fn is_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

/// Serialize a document, as YAML when `yaml` is set and pretty JSON
/// otherwise.
pub fn render_document(document: &Value, yaml: bool) -> Result<String> {
    if yaml {
        serde_yaml::to_string(document).context("failed to serialize document as YAML")
    } else {
        let mut text =
            serde_json::to_string_pretty(document).context("failed to serialize document")?;
        text.push('\n');
        Ok(text)
    }
}

/// Write a document to `path`, in YAML for `.yaml`/`.yml` and JSON
/// otherwise.
pub fn write_document(path: &Path, document: &Value) -> Result<()> {
    let text = render_document(document, is_yaml_path(path))?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

/// Write a document to `out`, or print it to stdout as JSON.
pub fn emit_document(out: Option<&Path>, document: &Value) -> Result<()> {
    match out {
        Some(path) => {
            write_document(path, document)?;
            tracing::info!(path = %path.display(), "wrote document");
        }
        None => print!("{}", render_document(document, false)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_path_absolute_path_returned_as_is() {
        let result = resolve_path(Path::new("/abs/schemas"), Path::new("/some/base"));
        assert_eq!(result, PathBuf::from("/abs/schemas"));
    }

    #[test]
    fn resolve_path_prefers_existing_base_relative() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("schemas")).unwrap();
        let result = resolve_path(Path::new("schemas"), dir.path());
        assert_eq!(result, dir.path().join("schemas"));
    }

    #[test]
    fn resolve_path_falls_back_to_cwd_relative() {
        let dir = tempfile::tempdir().unwrap();
        let result = resolve_path(Path::new("missing"), dir.path());
        assert_eq!(result, PathBuf::from("missing"));
    }

    #[test]
    fn write_document_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let doc = json!({ "crs": { "epsg": 25833 } });

        let json_path = dir.path().join("out.json");
        write_document(&json_path, &doc).unwrap();
        let text = std::fs::read_to_string(&json_path).unwrap();
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), doc);

        let yaml_path = dir.path().join("out.yaml");
        write_document(&yaml_path, &doc).unwrap();
        let text = std::fs::read_to_string(&yaml_path).unwrap();
        assert!(text.contains("epsg: 25833"));
        assert_eq!(serde_yaml::from_str::<Value>(&text).unwrap(), doc);
    }

    #[test]
    fn write_document_reports_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no").join("such").join("dir.json");
        let err = write_document(&path, &json!({})).unwrap_err();
        assert!(format!("{err:#}").contains("failed to write"));
    }
}
