//! # Runtime Schema Validation
//!
//! Validates JSON/YAML documents against the draft-07 output contracts.
//!
//! ## Schema Resolution
//!
//! Contracts reference shared definitions with relative `$ref`s
//! (`common.schema.json#/definitions/percent`), which the validator resolves
//! against the contract's `$id` to
//! `https://schemas.district-heating.dev/contracts/common.schema.json`.
//! [`LocalSchemaRetriever`] answers those lookups from the loaded schema set,
//! by `$id` first and by filename second. Nothing is fetched over the
//! network; an unknown URI fails the compile.
//!
//! ## Reports
//!
//! Validation never stops at the first error. Every violation is collected
//! into a [`ValidationReport`], addressed by dotted path. For missing
//! properties the path names the missing field itself
//! (`metadata.cluster_id`), not the object that lacks it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dhc_core::{ContractKind, FieldPath};
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Retrieve, Uri, ValidationError, Validator};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::contracts::EMBEDDED_SCHEMAS;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors returned by schema loading and validation.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// A schema file could not be read or parsed.
    #[error("failed to load schema {path}: {reason}")]
    SchemaLoadError {
        /// Path or filename of the schema.
        path: String,
        /// Why it failed.
        reason: String,
    },

    /// A document could not be read or parsed.
    #[error("failed to load document {path}: {reason}")]
    DocumentLoadError {
        /// Path to the document.
        path: String,
        /// Why it failed.
        reason: String,
    },

    /// A schema could not be compiled into a validator.
    #[error("failed to compile schema {schema}: {reason}")]
    SchemaCompileError {
        /// Schema filename.
        schema: String,
        /// Compiler message.
        reason: String,
    },

    /// The requested schema is not loaded.
    #[error("schema not found: {0}")]
    SchemaNotFound(String),

    /// The contract of a document could not be inferred.
    #[error("cannot tell which contract {0} follows; pass the contract explicitly")]
    UnknownContract(String),

    /// The document failed validation.
    #[error("{count} violation(s) against {schema}:\n{details}")]
    ValidationFailed {
        /// Schema filename.
        schema: String,
        /// Number of violations.
        count: usize,
        /// One line per violation.
        details: String,
        /// The full report.
        report: Box<ValidationReport>,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// Category of a schema violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// A `required` property is absent.
    MissingRequired,
    /// The value has the wrong JSON type.
    WrongType,
    /// The value is not one of the allowed `enum`/`const` values.
    NotInEnum,
    /// Numeric bound, length or item-count violation.
    OutOfRange,
    /// `format` or `pattern` mismatch.
    InvalidFormat,
    /// Anything else the validator reports.
    Other,
}

impl ViolationKind {
    fn classify(kind: &ValidationErrorKind) -> Self {
        match kind {
            ValidationErrorKind::Required { .. } => Self::MissingRequired,
            ValidationErrorKind::Type { .. } => Self::WrongType,
            ValidationErrorKind::Enum { .. } | ValidationErrorKind::Constant { .. } => {
                Self::NotInEnum
            }
            ValidationErrorKind::Minimum { .. }
            | ValidationErrorKind::Maximum { .. }
            | ValidationErrorKind::ExclusiveMinimum { .. }
            | ValidationErrorKind::ExclusiveMaximum { .. }
            | ValidationErrorKind::MinItems { .. }
            | ValidationErrorKind::MaxItems { .. }
            | ValidationErrorKind::MinLength { .. }
            | ValidationErrorKind::MaxLength { .. } => Self::OutOfRange,
            ValidationErrorKind::Format { .. } | ValidationErrorKind::Pattern { .. } => {
                Self::InvalidFormat
            }
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingRequired => "missing_required",
            Self::WrongType => "wrong_type",
            Self::NotInEnum => "not_in_enum",
            Self::OutOfRange => "out_of_range",
            Self::InvalidFormat => "invalid_format",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Dotted path of the offending field (`pipes[0].length_m`).
    pub path: String,
    /// JSON Pointer of the instance location the validator reported.
    pub instance_path: String,
    /// JSON Pointer into the schema of the failing keyword.
    pub schema_path: String,
    pub kind: ViolationKind,
    /// Validator message.
    pub message: String,
}

impl Violation {
    fn from_error(error: &ValidationError<'_>) -> Self {
        let instance_path = error.instance_path.to_string();
        let mut path = FieldPath::from_json_pointer(&instance_path);
        if let ValidationErrorKind::Required { property } = &error.kind {
            if let Some(name) = property.as_str() {
                path = path.child(name);
            }
        }
        Self {
            path: path.to_string(),
            instance_path,
            schema_path: error.schema_path.to_string(),
            kind: ViolationKind::classify(&error.kind),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {} [{}]: {}", self.path, self.kind, self.message)
    }
}

/// Outcome of validating one document against one schema.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Schema filename.
    pub schema: String,
    /// Schema `$id`, when the schema declares one.
    pub schema_id: Option<String>,
    /// Contract, when the schema is one of the published contracts.
    pub contract: Option<ContractKind>,
    pub valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Violation messages, one per violation, prefixed with the dotted path.
    pub fn messages(&self) -> Vec<String> {
        self.violations
            .iter()
            .map(|v| format!("{}: {}", v.path, v.message))
            .collect()
    }

    /// Violations of one category.
    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }

    /// Whether any violation is reported at exactly this dotted path.
    pub fn has_violation_at(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }

    /// `Ok(self)` when valid, `ValidationFailed` otherwise.
    pub fn into_result(self) -> Result<Self, SchemaValidationError> {
        if self.valid {
            return Ok(self);
        }
        Err(SchemaValidationError::ValidationFailed {
            schema: self.schema.clone(),
            count: self.violations.len(),
            details: self.to_string(),
            report: Box::new(self),
        })
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Schema retriever for $ref resolution
// ---------------------------------------------------------------------------

/// Resolves `$ref` URIs against the loaded schema set.
struct LocalSchemaRetriever {
    by_id: HashMap<String, Value>,
    by_filename: HashMap<String, Value>,
}

impl Retrieve for LocalSchemaRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri_str = uri.as_str();
        if let Some(value) = self.by_id.get(uri_str) {
            return Ok(value.clone());
        }
        let filename = uri_str.rsplit('/').next().unwrap_or(uri_str);
        self.by_filename
            .get(filename)
            .cloned()
            .ok_or_else(|| format!("schema not found for URI: {uri_str}").into())
    }
}

// ---------------------------------------------------------------------------
// SchemaValidator
// ---------------------------------------------------------------------------

/// Where a validator's schemas came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// The contracts compiled into this crate.
    Embedded,
    /// `*.schema.json` files under a directory.
    Directory(PathBuf),
}

impl std::fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embedded => f.write_str("embedded contracts"),
            Self::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// Validates documents against a set of loaded schemas.
///
/// Compiled validators are cached per schema filename, so validating many
/// documents against the same contract compiles it once.
pub struct SchemaValidator {
    source: SchemaSource,
    /// Schemas indexed by filename (e.g. `cha_output.schema.json`).
    schemas: HashMap<String, Value>,
    validate_formats: bool,
    compiled: RwLock<HashMap<String, Arc<Validator>>>,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("source", &self.source)
            .field("schema_count", &self.schemas.len())
            .field("validate_formats", &self.validate_formats)
            .finish()
    }
}

impl SchemaValidator {
    /// Validator over the embedded contracts.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::SchemaLoadError`] if an embedded
    /// schema is not valid JSON.
    pub fn builtin() -> Result<Self, SchemaValidationError> {
        let mut schemas = HashMap::new();
        for embedded in EMBEDDED_SCHEMAS {
            let value: Value = serde_json::from_str(embedded.source).map_err(|e| {
                SchemaValidationError::SchemaLoadError {
                    path: embedded.filename.to_string(),
                    reason: e.to_string(),
                }
            })?;
            schemas.insert(embedded.filename.to_string(), value);
        }
        tracing::debug!(count = schemas.len(), "loaded embedded schemas");
        Ok(Self::from_parts(SchemaSource::Embedded, schemas))
    }

    /// Validator over every `*.schema.json` file under `schema_dir`,
    /// searched recursively.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::SchemaLoadError`] if the directory is
    /// missing or a schema file cannot be read or parsed.
    pub fn from_dir(schema_dir: impl Into<PathBuf>) -> Result<Self, SchemaValidationError> {
        let schema_dir = schema_dir.into();
        if !schema_dir.is_dir() {
            return Err(SchemaValidationError::SchemaLoadError {
                path: schema_dir.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }

        let mut paths = Vec::new();
        walk_for_schemas(&schema_dir, &mut paths)?;
        paths.sort();

        let mut schemas = HashMap::new();
        for path in paths {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                SchemaValidationError::SchemaLoadError {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
            })?;
            let value: Value = serde_json::from_str(&content).map_err(|e| {
                SchemaValidationError::SchemaLoadError {
                    path: path.display().to_string(),
                    reason: format!("invalid JSON: {e}"),
                }
            })?;
            if let Some(filename) = path.file_name().and_then(|f| f.to_str()) {
                if schemas.insert(filename.to_string(), value).is_some() {
                    tracing::warn!(
                        path = %path.display(),
                        "duplicate schema filename; later file wins"
                    );
                }
            }
        }

        tracing::debug!(dir = %schema_dir.display(), count = schemas.len(), "loaded schema directory");
        Ok(Self::from_parts(SchemaSource::Directory(schema_dir), schemas))
    }

    fn from_parts(source: SchemaSource, schemas: HashMap<String, Value>) -> Self {
        Self {
            source,
            schemas,
            validate_formats: true,
            compiled: RwLock::new(HashMap::new()),
        }
    }

    /// Toggle `format` checking (`date-time`). On by default.
    pub fn with_format_validation(mut self, enabled: bool) -> Self {
        self.validate_formats = enabled;
        self.compiled.get_mut().clear();
        self
    }

    pub fn source(&self) -> &SchemaSource {
        &self.source
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Loaded schema filenames, sorted.
    pub fn schema_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up a loaded schema by filename.
    pub fn get_schema(&self, filename: &str) -> Option<&Value> {
        self.schemas.get(filename)
    }

    fn retriever(&self) -> LocalSchemaRetriever {
        let by_id = self
            .schemas
            .values()
            .filter_map(|schema| {
                let id = schema.get("$id")?.as_str()?;
                Some((id.trim_end_matches('#').to_string(), schema.clone()))
            })
            .collect();
        LocalSchemaRetriever {
            by_id,
            by_filename: self.schemas.clone(),
        }
    }

    /// Compile (or fetch from cache) the validator for a schema filename.
    ///
    /// # Errors
    ///
    /// [`SchemaValidationError::SchemaNotFound`] if the schema is not loaded,
    /// [`SchemaValidationError::SchemaCompileError`] if it does not compile
    /// (including unresolvable `$ref`s).
    pub fn compile(&self, filename: &str) -> Result<Arc<Validator>, SchemaValidationError> {
        if let Some(validator) = self.compiled.read().get(filename) {
            return Ok(Arc::clone(validator));
        }

        let schema = self
            .schemas
            .get(filename)
            .ok_or_else(|| SchemaValidationError::SchemaNotFound(filename.to_string()))?;

        let validator = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft7)
            .should_validate_formats(self.validate_formats)
            .with_retriever(self.retriever())
            .build(schema)
            .map_err(|e| SchemaValidationError::SchemaCompileError {
                schema: filename.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(schema = filename, "compiled validator");
        let validator = Arc::new(validator);
        self.compiled
            .write()
            .insert(filename.to_string(), Arc::clone(&validator));
        Ok(validator)
    }

    /// Validate a document against a loaded schema by filename.
    pub fn validate_against(
        &self,
        document: &Value,
        filename: &str,
    ) -> Result<ValidationReport, SchemaValidationError> {
        let validator = self.compile(filename)?;

        let violations: Vec<Violation> = validator
            .iter_errors(document)
            .map(|e| Violation::from_error(&e))
            .collect();

        let report = ValidationReport {
            schema: filename.to_string(),
            schema_id: self
                .schemas
                .get(filename)
                .and_then(|s| s.get("$id"))
                .and_then(Value::as_str)
                .map(str::to_string),
            contract: ContractKind::from_schema_ref(filename),
            valid: violations.is_empty(),
            violations,
        };

        if report.valid {
            tracing::debug!(schema = filename, "document valid");
        } else {
            tracing::info!(
                schema = filename,
                violations = report.violations.len(),
                "document invalid"
            );
        }
        Ok(report)
    }

    /// Validate a document against a published contract.
    pub fn validate(
        &self,
        document: &Value,
        contract: ContractKind,
    ) -> Result<ValidationReport, SchemaValidationError> {
        self.validate_against(document, contract.schema_file())
    }

    /// Validate a document, inferring its contract when `contract` is `None`.
    pub fn validate_detected(
        &self,
        document: &Value,
        contract: Option<ContractKind>,
        label: &str,
    ) -> Result<ValidationReport, SchemaValidationError> {
        let kind = contract
            .or_else(|| ContractKind::detect(document))
            .ok_or_else(|| SchemaValidationError::UnknownContract(label.to_string()))?;
        self.validate(document, kind)
    }

    /// Load a JSON or YAML document from disk and validate it.
    pub fn validate_file(
        &self,
        path: &Path,
        contract: Option<ContractKind>,
    ) -> Result<ValidationReport, SchemaValidationError> {
        let document = load_document(path)?;
        self.validate_detected(&document, contract, &path.display().to_string())
    }
}

/// Read a document, parsing YAML for `.yaml`/`.yml` and JSON otherwise.
pub fn load_document(path: &Path) -> Result<Value, SchemaValidationError> {
    let load_error = |reason: String| SchemaValidationError::DocumentLoadError {
        path: path.display().to_string(),
        reason,
    };

    let content =
        std::fs::read_to_string(path).map_err(|e| load_error(format!("cannot read file: {e}")))?;

    match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "yaml" | "yml" => serde_yaml::from_str::<Value>(&content)
            .map_err(|e| load_error(format!("invalid YAML: {e}"))),
        _ => serde_json::from_str::<Value>(&content)
            .map_err(|e| load_error(format!("invalid JSON: {e}"))),
    }
}

fn walk_for_schemas(dir: &Path, acc: &mut Vec<PathBuf>) -> Result<(), SchemaValidationError> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk_for_schemas(&path, acc)?;
        } else if path
            .file_name()
            .and_then(|f| f.to_str())
            .is_some_and(|name| name.ends_with(".schema.json"))
        {
            acc.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> SchemaValidator {
        SchemaValidator::builtin().unwrap()
    }

    fn minimal_kpi() -> Value {
        json!({
            "metadata": {
                "schema_version": "2.0.0",
                "created_at": "2025-03-14T10:00:00Z",
                "cluster_id": "c1"
            },
            "economic": { "lcoh_eur_per_mwh": 110.0, "capex_eur": 1.0, "opex_eur_per_year": 2.0 },
            "technical": {
                "annual_heat_demand_mwh": 10.0,
                "peak_load_kw": 5.0,
                "heat_loss_percent": 4.0,
                "max_velocity_ms": 1.0
            },
            "environmental": { "co2_t_per_year": 3.0, "renewable_share_percent": 50.0 }
        })
    }

    #[test]
    fn builtin_loads_all_schemas() {
        let v = validator();
        assert_eq!(v.schema_count(), EMBEDDED_SCHEMAS.len());
        assert_eq!(
            v.schema_names(),
            vec![
                "cha_output.schema.json",
                "common.schema.json",
                "kpi_summary.schema.json",
                "lfa_demand.schema.json"
            ]
        );
        assert_eq!(v.source(), &SchemaSource::Embedded);
    }

    #[test]
    fn every_contract_compiles_with_common_refs() {
        let v = validator();
        for name in v.schema_names() {
            v.compile(name)
                .unwrap_or_else(|e| panic!("{name} failed to compile: {e}"));
        }
    }

    #[test]
    fn compile_is_cached() {
        let v = validator();
        let a = v.compile("kpi_summary.schema.json").unwrap();
        let b = v.compile("kpi_summary.schema.json").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn valid_kpi_summary_passes() {
        let report = validator().validate(&minimal_kpi(), ContractKind::KpiSummary).unwrap();
        assert!(report.is_valid(), "unexpected violations:\n{report}");
        assert_eq!(report.contract, Some(ContractKind::KpiSummary));
        assert_eq!(
            report.schema_id.as_deref(),
            Some("https://schemas.district-heating.dev/contracts/kpi_summary.schema.json")
        );
    }

    #[test]
    fn missing_required_reports_field_path() {
        let mut doc = minimal_kpi();
        doc["metadata"].as_object_mut().unwrap().remove("cluster_id");
        let report = validator().validate(&doc, ContractKind::KpiSummary).unwrap();
        assert!(!report.is_valid());
        let v = report.of_kind(ViolationKind::MissingRequired).next().unwrap();
        assert_eq!(v.path, "metadata.cluster_id");
        assert_eq!(v.instance_path, "/metadata");
        assert!(v.message.contains("cluster_id"));
    }

    #[test]
    fn negative_kpi_is_out_of_range() {
        let mut doc = minimal_kpi();
        doc["economic"]["capex_eur"] = json!(-5.0);
        let report = validator().validate(&doc, ContractKind::KpiSummary).unwrap();
        assert!(report.has_violation_at("economic.capex_eur"));
        assert_eq!(report.violations[0].kind, ViolationKind::OutOfRange);
    }

    #[test]
    fn string_number_is_wrong_type() {
        let mut doc = minimal_kpi();
        doc["technical"]["peak_load_kw"] = json!("5.0");
        let report = validator().validate(&doc, ContractKind::KpiSummary).unwrap();
        let v = report.of_kind(ViolationKind::WrongType).next().unwrap();
        assert_eq!(v.path, "technical.peak_load_kw");
    }

    #[test]
    fn enum_violation_is_classified() {
        let mut doc = minimal_kpi();
        doc["recommendation"] = json!({ "preferred_option": "gas_boiler" });
        let report = validator().validate(&doc, ContractKind::KpiSummary).unwrap();
        let v = report.of_kind(ViolationKind::NotInEnum).next().unwrap();
        assert_eq!(v.path, "recommendation.preferred_option");
    }

    #[test]
    fn bad_timestamp_is_format_violation() {
        let mut doc = minimal_kpi();
        doc["metadata"]["created_at"] = json!("yesterday");
        let report = validator().validate(&doc, ContractKind::KpiSummary).unwrap();
        assert!(report
            .of_kind(ViolationKind::InvalidFormat)
            .any(|v| v.path == "metadata.created_at"));
    }

    #[test]
    fn format_validation_can_be_disabled() {
        let mut doc = minimal_kpi();
        doc["metadata"]["created_at"] = json!("yesterday");
        let v = validator().with_format_validation(false);
        assert!(v.validate(&doc, ContractKind::KpiSummary).unwrap().is_valid());
    }

    #[test]
    fn all_violations_are_collected() {
        let doc = json!({ "metadata": {} });
        let report = validator().validate(&doc, ContractKind::KpiSummary).unwrap();
        let missing: Vec<&str> = report
            .of_kind(ViolationKind::MissingRequired)
            .map(|v| v.path.as_str())
            .collect();
        for expected in ["economic", "technical", "environmental", "metadata.cluster_id"] {
            assert!(missing.contains(&expected), "missing {expected} in {missing:?}");
        }
    }

    #[test]
    fn into_result_wraps_failure() {
        let doc = json!({});
        let err = validator()
            .validate(&doc, ContractKind::KpiSummary)
            .unwrap()
            .into_result()
            .unwrap_err();
        match err {
            SchemaValidationError::ValidationFailed { count, report, .. } => {
                assert_eq!(count, report.violations.len());
                assert!(count >= 4);
            }
            other => panic!("expected ValidationFailed, got {other}"),
        }
    }

    #[test]
    fn unknown_schema_is_not_found() {
        let err = validator()
            .validate_against(&json!({}), "eaa_input.schema.json")
            .unwrap_err();
        assert!(matches!(err, SchemaValidationError::SchemaNotFound(_)));
    }

    #[test]
    fn validate_detected_needs_a_contract() {
        let err = validator()
            .validate_detected(&json!({"metadata": {}}), None, "doc.json")
            .unwrap_err();
        assert!(matches!(err, SchemaValidationError::UnknownContract(_)));
    }

    #[test]
    fn from_dir_loads_recursively_and_resolves_refs() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("shared");
        crate::contracts::export_schemas(dir.path()).unwrap();
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::rename(
            dir.path().join("common.schema.json"),
            nested.join("common.schema.json"),
        )
        .unwrap();

        let v = SchemaValidator::from_dir(dir.path()).unwrap();
        assert_eq!(v.schema_count(), 4);
        let report = v.validate(&minimal_kpi(), ContractKind::KpiSummary).unwrap();
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn from_dir_rejects_missing_dir() {
        let err = SchemaValidator::from_dir("/nonexistent/schemas").unwrap_err();
        assert!(matches!(err, SchemaValidationError::SchemaLoadError { .. }));
    }

    #[test]
    fn from_dir_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.schema.json"), "{ not json").unwrap();
        let err = SchemaValidator::from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("broken.schema.json"));
    }

    #[test]
    fn unresolved_ref_fails_compile() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("orphan.schema.json"),
            r#"{
                "$schema": "http://json-schema.org/draft-07/schema#",
                "$id": "https://schemas.district-heating.dev/contracts/orphan.schema.json",
                "type": "object",
                "properties": { "a": { "$ref": "missing.schema.json#/definitions/x" } }
            }"#,
        )
        .unwrap();
        let v = SchemaValidator::from_dir(dir.path()).unwrap();
        let err = v.compile("orphan.schema.json").unwrap_err();
        assert!(matches!(err, SchemaValidationError::SchemaCompileError { .. }));
    }

    #[test]
    fn load_document_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kpi.yaml");
        std::fs::write(&path, serde_yaml::to_string(&minimal_kpi()).unwrap()).unwrap();
        let doc = load_document(&path).unwrap();
        assert_eq!(doc, minimal_kpi());
        let report = validator().validate_file(&path, None).unwrap();
        assert!(report.is_valid());
    }

    #[test]
    fn load_document_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();
        let err = load_document(&path).unwrap_err();
        assert!(matches!(err, SchemaValidationError::DocumentLoadError { .. }));
    }

    #[test]
    fn violation_display_includes_kind_and_path() {
        let v = Violation {
            path: "metadata.convergence_status".to_string(),
            instance_path: "/metadata/convergence_status".to_string(),
            schema_path: "/properties/metadata/properties/convergence_status/enum".to_string(),
            kind: ViolationKind::NotInEnum,
            message: r#""done" is not one of ["converged","max_iterations","failed"]"#.to_string(),
        };
        let text = v.to_string();
        assert!(text.contains("metadata.convergence_status"));
        assert!(text.contains("[not_in_enum]"));
    }
}
