//! # Repair Pipeline
//!
//! Validate, repair, re-validate. The pipeline borrows a
//! [`SchemaValidator`] so that the enum and type steps read the same
//! schemas the reports are produced from; a validator loaded from a
//! directory repairs against that directory's contracts.

use std::collections::BTreeMap;

use dhc_core::{ContractKind, SchemaVersion};
use dhc_schema::{SchemaValidator, ValidationReport};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::RepairAction;
use crate::coerce::coerce_types;
use crate::defaults::{insert_defaults, DefaultValues};
use crate::enums::{normalize_enums, EnumNormalizer, SynonymTable};
use crate::error::RepairError;
use crate::migrate::{detect_cha_version, upgrade_v1_to_v2};

/// Which repair steps run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairOptions {
    /// Upgrade CHA v1 documents to v2.
    pub migrate: bool,
    pub normalize_enums: bool,
    pub coerce_types: bool,
    pub insert_defaults: bool,
    /// Run the steps even when the document is already valid.
    pub always: bool,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            migrate: true,
            normalize_enums: true,
            coerce_types: true,
            insert_defaults: true,
            always: false,
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct RepairOutcome {
    pub contract: ContractKind,
    /// The document after repair.
    pub document: Value,
    /// Every change made, in the order applied.
    pub actions: Vec<RepairAction>,
    /// Report on the document as given.
    pub initial: ValidationReport,
    /// Report on the repaired document.
    pub repaired: ValidationReport,
}

impl RepairOutcome {
    /// Whether the repaired document validates.
    pub fn is_valid(&self) -> bool {
        self.repaired.is_valid()
    }

    pub fn changed(&self) -> bool {
        !self.actions.is_empty()
    }
}

/// Runs the repair steps against one schema set.
#[derive(Debug)]
pub struct RepairPipeline<'v> {
    validator: &'v SchemaValidator,
    options: RepairOptions,
    defaults: DefaultValues,
    normalizer: EnumNormalizer,
}

impl<'v> RepairPipeline<'v> {
    /// A pipeline with default options, defaults and built-in synonyms.
    pub fn new(validator: &'v SchemaValidator) -> Self {
        Self {
            validator,
            options: RepairOptions::default(),
            defaults: DefaultValues::default(),
            normalizer: EnumNormalizer::default(),
        }
    }

    pub fn with_options(mut self, options: RepairOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_defaults(mut self, defaults: DefaultValues) -> Self {
        self.defaults = defaults;
        self
    }

    /// Extend the built-in synonyms with `field → {synonym → canonical}`.
    pub fn with_synonyms(mut self, synonyms: &BTreeMap<String, BTreeMap<String, String>>) -> Self {
        let mut table = SynonymTable::builtin();
        table.extend(synonyms);
        self.normalizer = EnumNormalizer::new(table);
        self
    }

    pub fn options(&self) -> &RepairOptions {
        &self.options
    }

    /// Repair `document`, inferring its contract when `contract` is `None`.
    ///
    /// # Errors
    ///
    /// [`RepairError::UnknownContract`] if the contract cannot be inferred;
    /// [`RepairError::Schema`] if the contract's schema fails to compile.
    /// A document that stays invalid is not an error.
    pub fn run(
        &self,
        mut document: Value,
        contract: Option<ContractKind>,
    ) -> Result<RepairOutcome, RepairError> {
        let contract = contract
            .or_else(|| ContractKind::detect(&document))
            .ok_or_else(|| RepairError::UnknownContract("document".to_string()))?;

        let initial = self.validator.validate(&document, contract)?;
        if initial.is_valid() && !self.options.always {
            tracing::debug!(contract = %contract, "document already valid; nothing to repair");
            return Ok(RepairOutcome {
                contract,
                document,
                actions: Vec::new(),
                repaired: initial.clone(),
                initial,
            });
        }

        let schema_file = contract.schema_file();
        let mut actions = Vec::new();

        if self.options.migrate && contract == ContractKind::ChaOutput {
            match detect_cha_version(&document) {
                Some(SchemaVersion::CHA_V1) | None => {
                    actions.extend(upgrade_v1_to_v2(&mut document, &self.defaults).actions)
                }
                Some(SchemaVersion::CHA_V2) => {}
                Some(other) => {
                    tracing::debug!(version = %other, "unknown CHA version; migration skipped")
                }
            }
        }
        if self.options.normalize_enums {
            actions.extend(normalize_enums(
                &mut document,
                self.validator,
                schema_file,
                &self.normalizer,
            ));
        }
        if self.options.coerce_types {
            actions.extend(coerce_types(&mut document, self.validator, schema_file));
        }
        if self.options.insert_defaults {
            actions.extend(insert_defaults(&mut document, contract, &self.defaults));
        }

        for action in &actions {
            tracing::warn!(
                path = %action.path,
                step = %action.step,
                "{}",
                action.reason
            );
        }

        let repaired = self.validator.validate(&document, contract)?;
        tracing::info!(
            contract = %contract,
            repairs = actions.len(),
            before = initial.violations.len(),
            after = repaired.violations.len(),
            "repair finished"
        );

        Ok(RepairOutcome {
            contract,
            document,
            actions,
            initial,
            repaired,
        })
    }
}
