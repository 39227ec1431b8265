//! # Error Types
//!
//! Errors raised by the core vocabulary: malformed dotted paths, unparsable
//! versions, unknown contracts and enum values. Validation failures of whole
//! documents live in `dhc-schema`; this crate only reports problems with the
//! primitives themselves.

use thiserror::Error;

/// Top-level error type for the core primitives.
#[derive(Error, Debug)]
pub enum DhcError {
    /// A dotted field path could not be parsed.
    #[error("invalid field path {path:?}: {reason}")]
    InvalidPath {
        /// The path as given by the caller.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },

    /// A path could not be written into a document.
    #[error("cannot set {path}: {reason}")]
    PathConflict {
        /// Dotted form of the path.
        path: String,
        /// What blocked the write.
        reason: String,
    },

    /// A schema version string was not `major.minor.patch`.
    #[error("invalid schema version {0:?}: expected major.minor.patch")]
    InvalidVersion(String),

    /// No contract matches the given name or document.
    #[error("unknown contract: {0}")]
    UnknownContract(String),

    /// A string is not a member of a closed value set.
    #[error("unknown {field} value {value:?}; expected one of: {expected}")]
    UnknownEnumValue {
        /// Field the value was read from (e.g. `convergence_status`).
        field: &'static str,
        /// The rejected value.
        value: String,
        /// Comma-separated canonical values.
        expected: String,
    },

    /// Timestamp parsing failed.
    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
