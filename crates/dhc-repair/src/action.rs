//! Record of a single change made to a document.

use serde::Serialize;
use serde_json::Value;

/// Which repair step made a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStep {
    Migrate,
    NormalizeEnum,
    CoerceType,
    InsertDefault,
}

impl RepairStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Migrate => "migrate",
            Self::NormalizeEnum => "normalize_enum",
            Self::CoerceType => "coerce_type",
            Self::InsertDefault => "insert_default",
        }
    }
}

impl std::fmt::Display for RepairStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One change: where, what it was, what it became and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairAction {
    /// Dotted path of the changed field.
    pub path: String,
    /// Previous value; `None` when the field was absent.
    pub before: Option<Value>,
    /// New value; `None` when the field was removed.
    pub after: Option<Value>,
    pub step: RepairStep,
    pub reason: String,
}

impl RepairAction {
    pub(crate) fn new(
        step: RepairStep,
        path: impl ToString,
        before: Option<Value>,
        after: Option<Value>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            path: path.to_string(),
            before,
            after,
            step,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for RepairAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |v: &Option<Value>| match v {
            Some(v) => v.to_string(),
            None => "(absent)".to_string(),
        };
        write!(
            f,
            "  {} [{}]: {} -> {} ({})",
            self.path,
            self.step,
            show(&self.before),
            show(&self.after),
            self.reason
        )
    }
}
