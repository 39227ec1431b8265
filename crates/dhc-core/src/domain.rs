//! # Closed Value Sets
//!
//! Every `enum` keyword in the contracts has a Rust counterpart here. The
//! canonical spellings (`as_str`, serde, `FromStr`) are exactly the strings
//! the schemas accept; synonym handling lives in `dhc-repair`, not here.
//!
//! | Enum | Contract field | Values |
//! |------|----------------|--------|
//! | [`ConvergenceStatus`] | `metadata.convergence_status` | converged, max_iterations, failed |
//! | [`ComplianceStatus`] | `compliance.overall_status`, `checks[].status` | pass, warning, fail, not_evaluated |
//! | [`PipeCircuit`] | `pipes[].circuit` | supply, return |
//! | [`NodeType`] | `nodes[].node_type` | junction, plant, consumer |
//! | [`PreferredOption`] | `recommendation.preferred_option` | district_heating, heat_pump, undecided |

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DhcError;

macro_rules! closed_value_set {
    (
        $(#[$meta:meta])*
        $name:ident, field = $field:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// All values in schema order.
            pub const ALL: &'static [$name] = &[$(Self::$variant),+];

            /// Contract field this value set constrains.
            pub const FIELD: &'static str = $field;

            /// Canonical spelling as it appears in the schema `enum`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            /// Canonical spellings, in schema order.
            pub fn canonical_values() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = DhcError;

            /// Exact, case-sensitive match on the canonical spelling.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(DhcError::UnknownEnumValue {
                        field: $field,
                        value: other.to_string(),
                        expected: Self::canonical_values().join(", "),
                    }),
                }
            }
        }
    };
}

closed_value_set! {
    /// Outcome of the hydraulic solver run recorded in CHA metadata.
    ConvergenceStatus, field = "convergence_status" {
        /// Solver reached its tolerance.
        Converged => "converged",
        /// Solver stopped at the iteration cap without converging.
        MaxIterations => "max_iterations",
        /// Solver aborted or diverged.
        Failed => "failed",
    }
}

closed_value_set! {
    /// Result of a standards-compliance check, or of all checks together.
    ComplianceStatus, field = "status" {
        Pass => "pass",
        Warning => "warning",
        Fail => "fail",
        /// Only valid for `compliance.overall_status`.
        NotEvaluated => "not_evaluated",
    }
}

closed_value_set! {
    /// Which side of the two-pipe network a pipe belongs to.
    PipeCircuit, field = "circuit" {
        Supply => "supply",
        Return => "return",
    }
}

closed_value_set! {
    /// Role of a network node.
    NodeType, field = "node_type" {
        Junction => "junction",
        /// Heat source.
        Plant => "plant",
        /// Building substation.
        Consumer => "consumer",
    }
}

closed_value_set! {
    /// Recommended supply option in the KPI summary.
    PreferredOption, field = "preferred_option" {
        DistrictHeating => "district_heating",
        HeatPump => "heat_pump",
        Undecided => "undecided",
    }
}

impl ConvergenceStatus {
    /// Map the boolean `converged` flag of CHA output v1.
    ///
    /// A `false` flag is `MaxIterations` when the run used up its iteration
    /// budget, `Failed` otherwise.
    pub fn from_legacy_flag(converged: bool, iterations: Option<u64>, max_iterations: Option<u64>) -> Self {
        match (converged, iterations, max_iterations) {
            (true, _, _) => Self::Converged,
            (false, Some(done), Some(cap)) if cap > 0 && done >= cap => Self::MaxIterations,
            (false, _, _) => Self::Failed,
        }
    }
}

impl ComplianceStatus {
    /// Worst status of a set of checks; `NotEvaluated` when there are none.
    pub fn aggregate<I: IntoIterator<Item = ComplianceStatus>>(checks: I) -> Self {
        checks
            .into_iter()
            .fold(None, |acc: Option<Self>, s| {
                Some(match (acc, s) {
                    (None, s) => s,
                    (Some(Self::Fail), _) | (_, Self::Fail) => Self::Fail,
                    (Some(Self::Warning), _) | (_, Self::Warning) => Self::Warning,
                    (Some(Self::NotEvaluated), s) => s,
                    (Some(a), _) => a,
                })
            })
            .unwrap_or(Self::NotEvaluated)
    }
}
