//! # Contract Identity
//!
//! Names the three output contracts of the simulation pipeline and the
//! versions they are currently published at.
//!
//! ## Schema Resolution
//!
//! All contracts use `$id` URIs of the form
//! `https://schemas.district-heating.dev/contracts/<filename>`. The
//! filename is the key used everywhere else (schema directories, CLI
//! flags, validator cache).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::DhcError;

/// URI prefix shared by every contract `$id`.
pub const SCHEMA_URI_PREFIX: &str = "https://schemas.district-heating.dev/contracts/";

/// One of the documents the pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    /// Hydraulic/thermal network results from the Centralized Heating Agent.
    ChaOutput,
    /// Economic, technical and environmental indicators.
    KpiSummary,
    /// Hourly demand forecast from the Load Forecasting Agent.
    LfaDemand,
}

impl ContractKind {
    /// Every contract, in publication order.
    pub const ALL: &'static [ContractKind] = &[Self::ChaOutput, Self::KpiSummary, Self::LfaDemand];

    /// Schema filename (e.g. `cha_output.schema.json`).
    pub fn schema_file(&self) -> &'static str {
        match self {
            Self::ChaOutput => "cha_output.schema.json",
            Self::KpiSummary => "kpi_summary.schema.json",
            Self::LfaDemand => "lfa_demand.schema.json",
        }
    }

    /// Short CLI name.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::ChaOutput => "cha",
            Self::KpiSummary => "kpi",
            Self::LfaDemand => "lfa",
        }
    }

    /// Full `$id` URI of the schema.
    pub fn schema_id(&self) -> String {
        format!("{SCHEMA_URI_PREFIX}{}", self.schema_file())
    }

    /// Version the schema is currently published at.
    pub fn current_version(&self) -> SchemaVersion {
        match self {
            Self::ChaOutput | Self::KpiSummary => SchemaVersion::new(2, 0, 0),
            Self::LfaDemand => SchemaVersion::new(1, 0, 0),
        }
    }

    /// Look a contract up by its schema filename or `$id`.
    pub fn from_schema_ref(reference: &str) -> Option<Self> {
        let filename = reference.rsplit('/').next().unwrap_or(reference);
        let filename = filename.split('#').next().unwrap_or(filename);
        Self::ALL.iter().copied().find(|k| k.schema_file() == filename)
    }

    /// Infer which contract a document claims to follow.
    ///
    /// An explicit top-level `$schema` naming a contract wins. Otherwise the
    /// top-level keys decide: `nodes`/`pipes` mean CHA output, `economic`
    /// means KPI summary, `series`/`quantiles` mean LFA demand.
    pub fn detect(document: &Value) -> Option<Self> {
        let obj = document.as_object()?;

        if let Some(kind) = obj
            .get("$schema")
            .and_then(Value::as_str)
            .and_then(Self::from_schema_ref)
        {
            return Some(kind);
        }

        if obj.contains_key("nodes") || obj.contains_key("pipes") {
            Some(Self::ChaOutput)
        } else if obj.contains_key("economic") {
            Some(Self::KpiSummary)
        } else if obj.contains_key("series") || obj.contains_key("quantiles") {
            Some(Self::LfaDemand)
        } else {
            None
        }
    }
}

impl std::fmt::Display for ContractKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for ContractKind {
    type Err = DhcError;

    /// Accepts the short name (`cha`), the snake_case name (`cha_output`),
    /// or the schema filename.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cha" | "cha_output" => Ok(Self::ChaOutput),
            "kpi" | "kpi_summary" => Ok(Self::KpiSummary),
            "lfa" | "lfa_demand" => Ok(Self::LfaDemand),
            other => Self::from_schema_ref(other)
                .ok_or_else(|| DhcError::UnknownContract(other.to_string())),
        }
    }
}

/// Contract version in `major.minor.patch` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SchemaVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl SchemaVersion {
    /// CHA output before compliance, CRS and units were added.
    pub const CHA_V1: SchemaVersion = SchemaVersion::new(1, 0, 0);
    /// Current CHA output.
    pub const CHA_V2: SchemaVersion = SchemaVersion::new(2, 0, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }

    /// Parse `major.minor.patch`. A bare `major` or `major.minor` is
    /// accepted and padded with zeros, since v1 documents wrote `"1.0"`.
    pub fn parse(s: &str) -> Result<Self, DhcError> {
        let trimmed = s.trim().trim_start_matches('v');
        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.is_empty() || parts.len() > 3 {
            return Err(DhcError::InvalidVersion(s.to_string()));
        }
        let mut nums = [0u32; 3];
        for (slot, part) in nums.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(DhcError::InvalidVersion(s.to_string()));
            }
            *slot = part
                .parse()
                .map_err(|_| DhcError::InvalidVersion(s.to_string()))?;
        }
        Ok(Self::new(nums[0], nums[1], nums[2]))
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = DhcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialOrd for SchemaVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SchemaVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl Serialize for SchemaVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SchemaVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
