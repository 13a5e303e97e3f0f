//! Shared data contract for the Patchy patch engine.
//!
//! This crate defines the value objects exchanged between the diff parser,
//! the applier, and the navigation layer, together with the engine-wide
//! error taxonomy and the invariant constants (skip prefixes, hunk-header
//! grammars, index base, newline policy).
//!
//! # Architecture
//!
//! This is the leaf crate of the engine:
//! - Depends on: nothing engine-internal
//! - Used by: patchy-udiff (parser + applier), patchy-nav (navigation)
//!
//! All types here are immutable value objects: the parser and applier
//! construct them, callers only read them. Every line index in this crate
//! is 0-based ([`constants::INDEX_BASE`]); the 1-based numbers of the diff
//! wire format are converted at the parser boundary.

pub mod constants;
mod error;
mod model;
mod summary;

pub use error::{ApplyFailure, EngineError, Result};
pub use model::{ApplyResult, FilePatch, Hunk, HunkLine, LineKind, Origin};
pub use summary::{format_file_diff, summarize_patch, PatchSummary};
