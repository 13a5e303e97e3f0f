//! Value objects produced by the parser and applier.

use serde::{Deserialize, Serialize};

/// Kind of a hunk body line, mirroring the wire prefixes `' '`, `'+'`, `'-'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Context,
    Add,
    Remove,
}

impl LineKind {
    /// The wire prefix character for this kind.
    pub fn prefix(self) -> char {
        match self {
            LineKind::Context => ' ',
            LineKind::Add => '+',
            LineKind::Remove => '-',
        }
    }

    pub fn from_prefix(c: char) -> Option<Self> {
        match c {
            ' ' => Some(LineKind::Context),
            '+' => Some(LineKind::Add),
            '-' => Some(LineKind::Remove),
            _ => None,
        }
    }
}

/// One body line of a hunk, text stored without the prefix character or a
/// trailing newline. A `Context` line with empty text matches a run of zero
/// or more blank lines in the working copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkLine {
    pub kind: LineKind,
    pub text: String,
}

impl HunkLine {
    pub fn new(kind: LineKind, text: impl Into<String>) -> Self {
        HunkLine {
            kind,
            text: text.into(),
        }
    }

    /// Whether this line must already exist in the working copy (context
    /// and removal lines consume original lines, additions do not).
    pub fn is_consuming(&self) -> bool {
        matches!(self.kind, LineKind::Context | LineKind::Remove)
    }

    /// A blank-tolerant context line: matches zero or more blank lines.
    pub fn is_blank_context(&self) -> bool {
        self.kind == LineKind::Context && self.text.is_empty()
    }
}

/// A contiguous change region. `old_start`/`new_start` are 0-based (the
/// 1-based wire values are converted by the parser); the lengths are
/// recorded as read but the applier treats the body as ground truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// Body lines that must exist in the working copy (kinds `' '` and `'-'`).
    pub fn consuming_lines(&self) -> impl Iterator<Item = &HunkLine> {
        self.lines.iter().filter(|l| l.is_consuming())
    }
}

/// All hunks for one file section of a diff, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePatch {
    /// Cleaned old-side path (timestamp and `a/` prefix stripped).
    pub old_path: String,
    /// Cleaned new-side path (timestamp and `b/` prefix stripped).
    pub new_path: String,
    pub hunks: Vec<Hunk>,
    /// Set when a `\ No newline at end of file` marker referred to the old
    /// side: the original is expected to lack a trailing newline.
    pub old_missing_newline: bool,
    /// Set when the marker referred to the new side: the patched output
    /// must not end with a newline.
    pub new_missing_newline: bool,
}

impl FilePatch {
    pub fn new(old_path: impl Into<String>, new_path: impl Into<String>) -> Self {
        FilePatch {
            old_path: old_path.into(),
            new_path: new_path.into(),
            hunks: Vec::new(),
            old_missing_newline: false,
            new_missing_newline: false,
        }
    }
}

/// Provenance of one output line: either the 0-based index of the original
/// line that produced it, or inserted by the patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Original(usize),
    Inserted,
}

impl Origin {
    pub fn is_inserted(self) -> bool {
        matches!(self, Origin::Inserted)
    }
}

/// Outcome of applying one [`FilePatch`] to in-memory text.
///
/// `origin_map` has exactly one entry per line of `text` and answers
/// "which input line produced this output line?" for highlighting,
/// navigation, and folding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    /// Patched text, LF-joined; trailing newline preserved iff the original
    /// had one (overridden by missing-newline markers in the diff).
    pub text: String,
    /// Sorted, unique 0-based indices into `text` of inserted lines.
    pub added_lines: Vec<usize>,
    /// Sorted, unique 0-based indices into the original of removed lines.
    pub removed_original_indices: Vec<usize>,
    /// Per-output-line provenance; `origin_map.len()` equals the line count
    /// of `text`.
    pub origin_map: Vec<Origin>,
    /// Hunk indices skipped in non-strict mode because no anchor was found.
    pub skipped_hunks: Vec<usize>,
}
