//! Invariant constants shared by the parser and applier.

use once_cell::sync::Lazy;
use regex::Regex;

/// Line prefixes the parser skips entirely (VCS noise between file
/// sections). File-header lines (`--- `, `+++ `, `*** `) are handled
/// structurally and deliberately absent from this list.
pub const SKIP_PREFIXES: &[&str] = &[
    "diff --git ",
    "index ",
    "new file mode ",
    "deleted file mode ",
    "rename from ",
    "rename to ",
    "similarity index ",
    "Binary files ",
];

/// Base of every line index the engine produces or consumes.
pub const INDEX_BASE: usize = 0;

/// The engine joins and counts lines with LF only; callers normalize CRLF
/// and lone CR before handing text in.
pub const NEWLINE_POLICY: &str = "LF";

/// Default radius of the expanding ring search around a hunk's guess index.
pub const DEFAULT_FUZZY_CONTEXT: usize = 200;

/// Unified hunk header: `@@ -start[,len] +start[,len] @@ optional trailer`.
/// A missing length means 1; `,0` is an explicit zero.
pub static UNIFIED_HUNK_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@.*$").unwrap());

/// Context hunk header: `*** start,len ****`.
pub static CONTEXT_HUNK_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*\* (\d+),(\d+) \*\*\*\*$").unwrap());

/// New-side range line inside a context hunk body: `--- start,len ----`.
pub static CONTEXT_NEW_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^--- (\d+),(\d+) ----$").unwrap());
