//! Engine-wide error taxonomy.

use serde::Serialize;
use thiserror::Error;

/// Why a hunk failed to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyFailure {
    /// No anchor for the hunk's consuming lines, even after fuzzy search
    /// and a global scan.
    CannotLocate,
    /// An anchored hunk mismatched during the apply walk. Unreachable as
    /// long as the anchor predicate and the apply walk agree; surfaced as
    /// an error rather than a panic.
    ContextMismatch,
    /// The hunk landed inside a region inserted by an earlier hunk.
    Overlap,
}

impl std::fmt::Display for ApplyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplyFailure::CannotLocate => write!(f, "cannot locate hunk in source text"),
            ApplyFailure::ContextMismatch => write!(f, "context mismatch after anchoring"),
            ApplyFailure::Overlap => write!(f, "hunk overlaps a previously inserted region"),
        }
    }
}

/// Single sum type for every engine failure, so callers handle parse and
/// apply errors with one match.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("parse error at line {line_no}: {message}")]
    Parse { line_no: usize, message: String },

    #[error("failed to apply hunk {hunk_index}: {reason}")]
    Apply {
        hunk_index: usize,
        reason: ApplyFailure,
    },

    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Reserved for callers performing file I/O around the engine; the
    /// engine itself never constructs this variant.
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },
}

// Errors cross the UI boundary as their display string.
impl Serialize for EngineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
