//! # Configuration
//!
//! Optional `dhc.yaml`, read from `--config` or from the current directory.
//! Every field has a default, so an empty file and no file behave the same.
//!
//! ```yaml
//! schema_dir: schemas          # relative to this file
//! validate_formats: true
//! repair:
//!   migrate: true
//!   normalize_enums: true
//!   coerce_types: true
//!   insert_defaults: true
//!   always: false
//! defaults:
//!   crs_epsg: 25833
//!   crs_name: ETRS89 / UTM zone 33N
//! synonyms:
//!   circuit:
//!     VL: supply
//!     RL: return
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dhc_repair::{DefaultValues, RepairOptions, RepairPipeline};
use dhc_schema::SchemaValidator;
use serde::{Deserialize, Serialize};

/// Filename looked up in the current directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "dhc.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DhcConfig {
    /// Directory of `*.schema.json` files to use instead of the embedded
    /// contracts.
    pub schema_dir: Option<PathBuf>,
    /// Check `format` keywords (`date-time`).
    pub validate_formats: bool,
    pub repair: RepairOptions,
    pub defaults: DefaultValues,
    /// Extra enum synonyms: field → {synonym → canonical}.
    pub synonyms: BTreeMap<String, BTreeMap<String, String>>,
}

impl Default for DhcConfig {
    fn default() -> Self {
        Self {
            schema_dir: None,
            validate_formats: true,
            repair: RepairOptions::default(),
            defaults: DefaultValues::default(),
            synonyms: BTreeMap::new(),
        }
    }
}

impl DhcConfig {
    /// Parse YAML. Relative `schema_dir` stays as written.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("invalid configuration")
    }

    /// Read a config file; a relative `schema_dir` is resolved against the
    /// file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config = Self::from_yaml_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        if let Some(dir) = &config.schema_dir {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            config.schema_dir = Some(crate::resolve_path(dir, base));
        }
        Ok(config)
    }

    /// Load `explicit` if given (it must exist), else `./dhc.yaml` if
    /// present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            tracing::debug!(path = %path.display(), "loading config");
            return Self::from_file(path);
        }
        let implicit = Path::new(DEFAULT_CONFIG_FILE);
        if implicit.is_file() {
            tracing::debug!(path = DEFAULT_CONFIG_FILE, "loading config from current directory");
            return Self::from_file(implicit);
        }
        Ok(Self::default())
    }

    /// Schema validator over `override_dir`, the configured `schema_dir`,
    /// or the embedded contracts, in that order.
    pub fn validator(&self, override_dir: Option<&Path>) -> Result<SchemaValidator> {
        let validator = match override_dir.or(self.schema_dir.as_deref()) {
            Some(dir) => SchemaValidator::from_dir(dir)
                .with_context(|| format!("failed to load schemas from {}", dir.display()))?,
            None => SchemaValidator::builtin().context("failed to load embedded schemas")?,
        };
        tracing::info!(
            source = %validator.source(),
            schema_count = validator.schema_count(),
            "loaded schema registry"
        );
        Ok(validator.with_format_validation(self.validate_formats))
    }

    /// Repair pipeline configured from this file.
    pub fn pipeline<'v>(&self, validator: &'v SchemaValidator) -> RepairPipeline<'v> {
        RepairPipeline::new(validator)
            .with_options(self.repair)
            .with_defaults(self.defaults.clone())
            .with_synonyms(&self.synonyms)
    }
}
