//! # Embedded Contracts
//!
//! The schema files under `schemas/` compiled into the binary. These are the
//! published contracts; a [`SchemaValidator`](crate::SchemaValidator) built
//! with `builtin()` validates against exactly these bytes.

use std::path::{Path, PathBuf};

use crate::validate::SchemaValidationError;

/// A schema file compiled into the crate.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddedSchema {
    /// Filename under `schemas/`.
    pub filename: &'static str,
    /// Raw JSON text.
    pub source: &'static str,
}

/// Every published schema, shared definitions first.
pub const EMBEDDED_SCHEMAS: &[EmbeddedSchema] = &[
    EmbeddedSchema {
        filename: "common.schema.json",
        source: include_str!("../../../schemas/common.schema.json"),
    },
    EmbeddedSchema {
        filename: "cha_output.schema.json",
        source: include_str!("../../../schemas/cha_output.schema.json"),
    },
    EmbeddedSchema {
        filename: "kpi_summary.schema.json",
        source: include_str!("../../../schemas/kpi_summary.schema.json"),
    },
    EmbeddedSchema {
        filename: "lfa_demand.schema.json",
        source: include_str!("../../../schemas/lfa_demand.schema.json"),
    },
];

/// Write every embedded schema into `dir`, creating it if needed.
///
/// Returns the written paths. Existing files are overwritten.
pub fn export_schemas(dir: &Path) -> Result<Vec<PathBuf>, SchemaValidationError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(EMBEDDED_SCHEMAS.len());
    for schema in EMBEDDED_SCHEMAS {
        let path = dir.join(schema.filename);
        std::fs::write(&path, schema.source)?;
        tracing::debug!(path = %path.display(), "exported schema");
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dhc_core::ContractKind;
    use serde_json::Value;

    #[test]
    fn every_contract_is_embedded() {
        for kind in ContractKind::ALL {
            assert!(
                EMBEDDED_SCHEMAS.iter().any(|s| s.filename == kind.schema_file()),
                "{} is not embedded",
                kind.schema_file()
            );
        }
    }

    #[test]
    fn embedded_ids_and_versions_match_contract_kind() {
        for kind in ContractKind::ALL {
            let embedded = EMBEDDED_SCHEMAS
                .iter()
                .find(|s| s.filename == kind.schema_file())
                .unwrap();
            let schema: Value = serde_json::from_str(embedded.source).unwrap();
            assert_eq!(schema["$id"], kind.schema_id());
            assert_eq!(schema["version"], kind.current_version().to_string());
        }
    }

    #[test]
    fn export_writes_all_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("schemas");
        let written = export_schemas(&out).unwrap();
        assert_eq!(written.len(), EMBEDDED_SCHEMAS.len());
        for path in written {
            let text = std::fs::read_to_string(&path).unwrap();
            assert!(serde_json::from_str::<Value>(&text).is_ok());
        }
    }
}
