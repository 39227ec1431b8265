//! # CHA Version Migration
//!
//! CHA output v1 predates the compliance, CRS and units sections and
//! reported convergence as a boolean:
//!
//! ```json
//! { "metadata": { "version": "1.0.0", "converged": false, "iterations": 100, "max_iterations": 100 } }
//! ```
//!
//! v2 replaces the flag with `convergence_status` and moves the version to
//! `metadata.schema_version`. Upgrading maps the flag through
//! [`ConvergenceStatus::from_legacy_flag`] and fills the new sections from
//! [`DefaultValues`]. Downgrading projects v2 back onto the v1 shape and
//! drops what v1 cannot express.
//!
//! Both directions are no-ops on a document already at the target version,
//! so applying either twice changes nothing the second time.

use dhc_core::{ContractKind, ConvergenceStatus, SchemaVersion, Timestamp};
use serde::Serialize;
use serde_json::{json, Value};

use crate::action::{RepairAction, RepairStep};
use crate::defaults::{insert_defaults, DefaultValues};
use crate::error::RepairError;

/// Sections v2 added and v1 cannot carry.
const V2_ONLY_SECTIONS: &[&str] = &["compliance", "crs", "units"];

/// Steps applied by one migration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationLog {
    /// Version detected before migrating; `None` if it could not be told.
    pub from: Option<SchemaVersion>,
    pub to: SchemaVersion,
    pub actions: Vec<RepairAction>,
}

impl MigrationLog {
    fn noop(version: SchemaVersion) -> Self {
        Self {
            from: Some(version),
            to: version,
            actions: Vec::new(),
        }
    }

    /// Whether the document was changed.
    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Version of a CHA document, from its metadata.
///
/// `metadata.schema_version` wins when present. Otherwise a `1.x`
/// `metadata.version` or a boolean `metadata.converged` marks v1, and a
/// bare `metadata.convergence_status` marks v2.
pub fn detect_cha_version(document: &Value) -> Option<SchemaVersion> {
    let metadata = document.get("metadata")?;
    if let Some(version) = metadata.get("schema_version").and_then(Value::as_str) {
        if let Ok(parsed) = SchemaVersion::parse(version) {
            return Some(parsed);
        }
    }
    if let Some(version) = metadata.get("version").and_then(Value::as_str) {
        if let Ok(parsed) = SchemaVersion::parse(version) {
            if parsed.major == 1 {
                return Some(SchemaVersion::CHA_V1);
            }
        }
    }
    if metadata.get("converged").and_then(legacy_flag).is_some() {
        return Some(SchemaVersion::CHA_V1);
    }
    if metadata.get("convergence_status").is_some() {
        return Some(SchemaVersion::CHA_V2);
    }
    None
}

/// The v1 `converged` flag. Producers sometimes wrote it as `"true"` or
/// `"false"`; anything else is not a flag.
fn legacy_flag(flag: &Value) -> Option<bool> {
    match flag {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// A version this module does not know how to move from.
fn unknown_version(version: Option<SchemaVersion>) -> Option<SchemaVersion> {
    version.filter(|v| *v != SchemaVersion::CHA_V1 && *v != SchemaVersion::CHA_V2)
}

fn migration_action(
    path: &str,
    before: Option<Value>,
    after: Option<Value>,
    reason: &str,
) -> RepairAction {
    RepairAction::new(RepairStep::Migrate, path, before, after, reason)
}

/// Upgrade a CHA v1 document to v2 in place.
///
/// Documents whose version cannot be detected are treated as v1. A document
/// declaring any other version is left untouched.
pub fn upgrade_v1_to_v2(document: &mut Value, defaults: &DefaultValues) -> MigrationLog {
    let from = detect_cha_version(document);
    if from == Some(SchemaVersion::CHA_V2) {
        return MigrationLog::noop(SchemaVersion::CHA_V2);
    }
    if let Some(version) = unknown_version(from) {
        tracing::warn!(version = %version, "not a v1 document; upgrade skipped");
        return MigrationLog::noop(version);
    }
    let mut actions = Vec::new();

    if let Some(metadata) = document.get_mut("metadata").and_then(Value::as_object_mut) {
        let flag = metadata.get("converged").map(|f| (f.clone(), legacy_flag(f)));
        match flag {
            Some((flag, Some(converged))) => {
                metadata.remove("converged");
                if !metadata.contains_key("convergence_status") {
                    let iterations = metadata.get("iterations").and_then(Value::as_u64);
                    let cap = metadata.get("max_iterations").and_then(Value::as_u64);
                    let status = ConvergenceStatus::from_legacy_flag(converged, iterations, cap);
                    metadata.insert("convergence_status".into(), json!(status.as_str()));
                    actions.push(migration_action(
                        "metadata.convergence_status",
                        None,
                        Some(json!(status.as_str())),
                        "derived from v1 converged flag",
                    ));
                }
                actions.push(migration_action(
                    "metadata.converged",
                    Some(flag),
                    None,
                    "replaced by convergence_status",
                ));
            }
            Some((flag, None)) => {
                tracing::warn!(flag = %flag, "converged flag is not a boolean; convergence_status left unset");
            }
            None => {}
        }
        if let Some(version) = metadata.remove("version") {
            actions.push(migration_action(
                "metadata.version",
                Some(version),
                None,
                "replaced by schema_version",
            ));
        }
        let before = metadata.insert(
            "schema_version".into(),
            json!(SchemaVersion::CHA_V2.to_string()),
        );
        actions.push(migration_action(
            "metadata.schema_version",
            before,
            Some(json!(SchemaVersion::CHA_V2.to_string())),
            "upgraded to 2.0.0",
        ));
        if !metadata.contains_key("created_at") {
            let now = json!(Timestamp::now().to_rfc3339());
            metadata.insert("created_at".into(), now.clone());
            actions.push(migration_action(
                "metadata.created_at",
                None,
                Some(now),
                "v1 document carried no creation time",
            ));
        }
    }

    actions.extend(insert_defaults(document, ContractKind::ChaOutput, defaults));

    tracing::info!(from = ?from, steps = actions.len(), "upgraded CHA output to 2.0.0");
    MigrationLog {
        from,
        to: SchemaVersion::CHA_V2,
        actions,
    }
}

/// Downgrade a CHA v2 document to the v1 shape in place.
pub fn downgrade_v2_to_v1(document: &mut Value) -> MigrationLog {
    let from = detect_cha_version(document);
    if from == Some(SchemaVersion::CHA_V1) {
        return MigrationLog::noop(SchemaVersion::CHA_V1);
    }
    if let Some(version) = unknown_version(from) {
        tracing::warn!(version = %version, "not a v2 document; downgrade skipped");
        return MigrationLog::noop(version);
    }
    let mut actions = Vec::new();

    if let Some(metadata) = document.get_mut("metadata").and_then(Value::as_object_mut) {
        if let Some(status) = metadata.remove("convergence_status") {
            let converged = status.as_str() == Some(ConvergenceStatus::Converged.as_str());
            metadata.insert("converged".into(), json!(converged));
            actions.push(migration_action(
                "metadata.convergence_status",
                Some(status),
                None,
                "v1 has only a converged flag",
            ));
            actions.push(migration_action(
                "metadata.converged",
                None,
                Some(json!(converged)),
                "derived from convergence_status",
            ));
        }
        if let Some(version) = metadata.remove("schema_version") {
            actions.push(migration_action(
                "metadata.schema_version",
                Some(version),
                None,
                "v1 uses metadata.version",
            ));
        }
        let version = json!(SchemaVersion::CHA_V1.to_string());
        let before = metadata.insert("version".into(), version.clone());
        actions.push(migration_action(
            "metadata.version",
            before,
            Some(version),
            "downgraded to 1.0.0",
        ));
    }

    if let Some(root) = document.as_object_mut() {
        for section in V2_ONLY_SECTIONS {
            if let Some(removed) = root.remove(*section) {
                actions.push(migration_action(
                    section,
                    Some(removed),
                    None,
                    "not part of CHA output 1.0.0",
                ));
            }
        }
    }

    tracing::info!(from = ?from, steps = actions.len(), "downgraded CHA output to 1.0.0");
    MigrationLog {
        from,
        to: SchemaVersion::CHA_V1,
        actions,
    }
}

/// Migrate a CHA document to `target`.
///
/// # Errors
///
/// [`RepairError::UnsupportedVersion`] for any target other than 1.0.0 or
/// 2.0.0, [`RepairError::UnknownSourceVersion`] when the document declares
/// any other version, and [`RepairError::NotMigratable`] when the document is
/// recognisably another contract.
pub fn migrate(
    document: &mut Value,
    target: SchemaVersion,
    defaults: &DefaultValues,
) -> Result<MigrationLog, RepairError> {
    match ContractKind::detect(document) {
        Some(ContractKind::ChaOutput) | None => {}
        Some(other) => return Err(RepairError::NotMigratable(other)),
    }
    if let Some(version) = unknown_version(detect_cha_version(document)) {
        return Err(RepairError::UnknownSourceVersion(version));
    }
    match target {
        SchemaVersion::CHA_V2 => Ok(upgrade_v1_to_v2(document, defaults)),
        SchemaVersion::CHA_V1 => Ok(downgrade_v2_to_v1(document)),
        other => Err(RepairError::UnsupportedVersion(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kpi_summary_is_not_migratable() {
        let mut doc = json!({
            "metadata": { "schema_version": "2.0.0", "created_at": "2024-11-02T16:05:00Z" },
            "economic": { "lcoh_eur_per_mwh": 80.0 },
            "recommendation": { "preferred_option": "district_heating" }
        });
        let err = migrate(&mut doc, SchemaVersion::CHA_V2, &DefaultValues::default()).unwrap_err();
        assert!(matches!(err, RepairError::NotMigratable(_)));
    }

    fn touched(log: &MigrationLog, path: &str) -> bool {
        log.actions.iter().any(|a| a.path == path)
    }

    fn v1(converged: bool, iterations: u64, max_iterations: Option<u64>) -> Value {
        let mut doc = json!({
            "metadata": {
                "version": "1.0.0",
                "created_at": "2024-11-02T16:05:00Z",
                "cluster_id": "c",
                "converged": converged,
                "iterations": iterations
            },
            "nodes": [],
            "pipes": [],
            "kpis": {}
        });
        if let Some(cap) = max_iterations {
            doc["metadata"]["max_iterations"] = json!(cap);
        }
        doc
    }

    #[test]
    fn detects_versions() {
        assert_eq!(detect_cha_version(&v1(true, 3, None)), Some(SchemaVersion::CHA_V1));
        assert_eq!(
            detect_cha_version(&json!({ "metadata": { "version": "1.0" } })),
            Some(SchemaVersion::CHA_V1)
        );
        assert_eq!(
            detect_cha_version(&json!({ "metadata": { "converged": false } })),
            Some(SchemaVersion::CHA_V1)
        );
        assert_eq!(
            detect_cha_version(&json!({ "metadata": { "schema_version": "2.0.0" } })),
            Some(SchemaVersion::CHA_V2)
        );
        assert_eq!(
            detect_cha_version(&json!({ "metadata": { "convergence_status": "converged" } })),
            Some(SchemaVersion::CHA_V2)
        );
        assert_eq!(detect_cha_version(&json!({ "metadata": {} })), None);
        assert_eq!(detect_cha_version(&json!({})), None);
    }

    #[test]
    fn upgrade_maps_flag_and_fills_sections() {
        let mut doc = v1(true, 9, None);
        let log = upgrade_v1_to_v2(&mut doc, &DefaultValues::default());
        assert_eq!(log.from, Some(SchemaVersion::CHA_V1));
        assert_eq!(doc["metadata"]["convergence_status"], "converged");
        assert_eq!(doc["metadata"]["schema_version"], "2.0.0");
        assert!(doc["metadata"].get("converged").is_none());
        assert!(doc["metadata"].get("version").is_none());
        assert_eq!(doc["crs"]["epsg"], 25833);
        assert_eq!(doc["units"]["power"], "kW");
        assert_eq!(doc["compliance"]["overall_status"], "not_evaluated");
        assert!(touched(&log, "metadata.converged"));
        assert!(touched(&log, "units.length"));
    }

    #[test]
    fn exhausted_iterations_upgrade_to_max_iterations() {
        let mut doc = v1(false, 100, Some(100));
        upgrade_v1_to_v2(&mut doc, &DefaultValues::default());
        assert_eq!(doc["metadata"]["convergence_status"], "max_iterations");

        let mut doc = v1(false, 12, Some(100));
        upgrade_v1_to_v2(&mut doc, &DefaultValues::default());
        assert_eq!(doc["metadata"]["convergence_status"], "failed");
    }

    #[test]
    fn upgrade_fills_missing_created_at() {
        let mut doc = v1(true, 1, None);
        doc["metadata"].as_object_mut().unwrap().remove("created_at");
        upgrade_v1_to_v2(&mut doc, &DefaultValues::default());
        let created = doc["metadata"]["created_at"].as_str().unwrap();
        assert!(Timestamp::parse(created).is_ok());
    }

    #[test]
    fn upgrade_of_v2_is_noop() {
        let mut doc = v1(true, 9, None);
        upgrade_v1_to_v2(&mut doc, &DefaultValues::default());
        let once = doc.clone();
        let log = upgrade_v1_to_v2(&mut doc, &DefaultValues::default());
        assert!(log.is_noop());
        assert_eq!(doc, once);
    }

    #[test]
    fn downgrade_projects_back() {
        let mut doc = v1(false, 100, Some(100));
        upgrade_v1_to_v2(&mut doc, &DefaultValues::default());
        let log = downgrade_v2_to_v1(&mut doc);
        assert_eq!(log.from, Some(SchemaVersion::CHA_V2));
        assert_eq!(doc["metadata"]["converged"], false);
        assert_eq!(doc["metadata"]["version"], "1.0.0");
        assert!(doc["metadata"].get("convergence_status").is_none());
        assert!(doc["metadata"].get("schema_version").is_none());
        for section in V2_ONLY_SECTIONS {
            assert!(doc.get(section).is_none(), "{section} survived");
        }
        assert!(downgrade_v2_to_v1(&mut doc).is_noop());
    }

    #[test]
    fn round_trip_restores_v1_shape() {
        let original = v1(true, 9, None);
        let mut doc = original.clone();
        upgrade_v1_to_v2(&mut doc, &DefaultValues::default());
        downgrade_v2_to_v1(&mut doc);
        assert_eq!(doc, original);
    }

    #[test]
    fn migrate_rejects_unknown_targets() {
        let mut doc = v1(true, 1, None);
        let err = migrate(&mut doc, SchemaVersion::new(3, 0, 0), &DefaultValues::default())
            .unwrap_err();
        assert!(matches!(err, RepairError::UnsupportedVersion(_)));
        assert!(migrate(&mut doc, SchemaVersion::CHA_V1, &DefaultValues::default())
            .unwrap()
            .is_noop());
    }

    #[test]
    fn string_flag_is_read_as_boolean() {
        for (raw, expected) in [("true", "converged"), (" FALSE ", "failed")] {
            let mut doc = v1(true, 3, None);
            doc["metadata"]["converged"] = json!(raw);
            assert_eq!(detect_cha_version(&doc), Some(SchemaVersion::CHA_V1));
            upgrade_v1_to_v2(&mut doc, &DefaultValues::default());
            assert_eq!(doc["metadata"]["convergence_status"], expected, "{raw:?}");
            assert!(doc["metadata"].get("converged").is_none());
        }
    }

    #[test]
    fn unreadable_flag_leaves_status_unset() {
        let mut doc = v1(true, 3, None);
        doc["metadata"]["converged"] = json!("yes");
        let log = upgrade_v1_to_v2(&mut doc, &DefaultValues::default());
        assert!(doc["metadata"].get("convergence_status").is_none());
        assert_eq!(doc["metadata"]["converged"], "yes");
        assert!(!touched(&log, "metadata.convergence_status"));
        assert!(!touched(&log, "metadata.converged"));
    }

    #[test]
    fn unknown_source_version_is_left_alone() {
        let mut doc = v1(true, 3, None);
        let meta = doc["metadata"].as_object_mut().unwrap();
        meta.remove("version");
        meta.remove("converged");
        meta.insert("schema_version".into(), json!("3.0.0"));
        meta.insert("convergence_status".into(), json!("converged"));
        let before = doc.clone();

        let log = upgrade_v1_to_v2(&mut doc, &DefaultValues::default());
        assert!(log.is_noop());
        assert_eq!(log.to, SchemaVersion::new(3, 0, 0));
        assert!(downgrade_v2_to_v1(&mut doc).is_noop());
        assert_eq!(doc, before);

        let err = migrate(&mut doc, SchemaVersion::CHA_V2, &DefaultValues::default()).unwrap_err();
        assert!(matches!(err, RepairError::UnknownSourceVersion(v) if v == SchemaVersion::new(3, 0, 0)));
        assert_eq!(doc, before);
    }
}
