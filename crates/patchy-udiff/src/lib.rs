//! Unified diff parsing and application for the Patchy engine.
//!
//! This crate turns diff text into [`patchy_core::FilePatch`] values and
//! applies them to in-memory source text with strict and fuzzy anchoring,
//! producing line-level provenance for the UI (highlighting, navigation,
//! folding).
//!
//! # Architecture
//!
//! - Depends on: `patchy-core` (the shared data contract)
//! - Used by: the graphical shell's worker layer
//!
//! Both halves are pure: no I/O, no shared state, results depend only on
//! the arguments.
//!
//! # Usage
//!
//! ```rust,ignore
//! use patchy_udiff::{DiffApplier, DiffParser};
//!
//! let patches = DiffParser::parse(diff_text)?;
//! let applier = DiffApplier::default();
//! let result = applier.apply(&original, &patches[0])?;
//! // result.text, result.added_lines, result.origin_map ...
//! ```

mod applier;
mod parser;

pub use applier::DiffApplier;
pub use parser::DiffParser;
